// Copyright @yucwang 2023

use crate::core::bsdf::{BSDFContext, BSDFFlags, BSDFSample, BSDF};
use crate::core::interaction::SurfaceInteraction;
use crate::math::constants::{Float, Vector2f, Vector3f, INV_PI};
use crate::math::spectrum::{SampledSpectrum, SpectrumCurve};
use crate::math::warp::{sample_cosine_hemisphere, sample_cosine_hemisphere_pdf};

/// Two-sided Lambertian reflector.
pub struct DiffuseBSDF {
    reflectance: SpectrumCurve,
}

impl DiffuseBSDF {
    pub fn new(reflectance: SpectrumCurve) -> Self {
        Self { reflectance }
    }

    fn albedo(&self, si: &SurfaceInteraction) -> SampledSpectrum {
        self.reflectance.eval_spectrum(&si.wavelengths).map(|v| v.max(0.0).min(1.0))
    }
}

impl BSDF for DiffuseBSDF {
    fn flags(&self) -> BSDFFlags {
        BSDFFlags::DIFFUSE_REFLECTION
    }

    fn sample(&self, _ctx: &BSDFContext, si: &SurfaceInteraction,
              _sample1: Float, sample2: &Vector2f) -> (BSDFSample, SampledSpectrum) {
        if si.wi.z == 0.0 {
            return (BSDFSample::default(), SampledSpectrum::zero());
        }
        let mut wo = sample_cosine_hemisphere(sample2);
        if si.wi.z < 0.0 {
            wo.z = -wo.z;
        }
        let pdf = sample_cosine_hemisphere_pdf(wo.z.abs());
        if pdf <= 0.0 {
            return (BSDFSample::default(), SampledSpectrum::zero());
        }
        let sample = BSDFSample {
            wo,
            pdf,
            eta: 1.0,
            sampled_type: BSDFFlags::DIFFUSE_REFLECTION,
        };
        (sample, self.albedo(si))
    }

    fn eval(&self, _ctx: &BSDFContext, si: &SurfaceInteraction, wo: &Vector3f) -> SampledSpectrum {
        if si.wi.z * wo.z <= 0.0 {
            return SampledSpectrum::zero();
        }
        self.albedo(si) * (INV_PI * wo.z.abs())
    }

    fn pdf(&self, _ctx: &BSDFContext, si: &SurfaceInteraction, wo: &Vector3f) -> Float {
        if si.wi.z * wo.z <= 0.0 {
            return 0.0;
        }
        sample_cosine_hemisphere_pdf(wo.z.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::LcgRng;

    fn hit_from_above() -> SurfaceInteraction {
        let mut si = SurfaceInteraction::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), Vector2f::zeros(), 1.0);
        si.wi = Vector3f::new(0.3, 0.0, 0.9).normalize();
        si
    }

    #[test]
    fn test_sample_weight_matches_eval_over_pdf() {
        let bsdf = DiffuseBSDF::new(SpectrumCurve::uniform(0.6));
        let ctx = BSDFContext::default();
        let si = hit_from_above();
        let mut rng = LcgRng::new(1);
        for _ in 0..64 {
            let (sample, weight) = bsdf.sample(&ctx, &si, rng.next_1d(), &rng.next_2d());
            assert!(sample.wo.z > 0.0);
            let expected = bsdf.eval(&ctx, &si, &sample.wo) / bsdf.pdf(&ctx, &si, &sample.wo);
            assert!((weight[0] - expected[0]).abs() < 1e-4);
            assert!((weight[0] - 0.6).abs() < 1e-5);
        }
    }

    #[test]
    fn test_transmission_is_black() {
        let bsdf = DiffuseBSDF::new(SpectrumCurve::uniform(0.6));
        let si = hit_from_above();
        let below = Vector3f::new(0.0, 0.0, -1.0);
        assert!(bsdf.eval(&BSDFContext::default(), &si, &below).is_black());
        assert_eq!(bsdf.pdf(&BSDFContext::default(), &si, &below), 0.0);
    }
}
