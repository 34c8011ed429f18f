// Copyright @yucwang 2026

use crate::core::bsdf::{BSDFContext, BSDFFlags, BSDFSample, BSDF};
use crate::core::interaction::SurfaceInteraction;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::spectrum::{SampledSpectrum, SpectrumCurve};

/// Perfect mirror with a spectral reflectance.
pub struct SmoothConductor {
    reflectance: SpectrumCurve,
}

impl SmoothConductor {
    pub fn new(reflectance: SpectrumCurve) -> Self {
        Self { reflectance }
    }
}

impl BSDF for SmoothConductor {
    fn flags(&self) -> BSDFFlags {
        BSDFFlags::DELTA_REFLECTION
    }

    fn sample(&self, _ctx: &BSDFContext, si: &SurfaceInteraction,
              _sample1: Float, _sample2: &Vector2f) -> (BSDFSample, SampledSpectrum) {
        let sample = BSDFSample {
            wo: Vector3f::new(-si.wi.x, -si.wi.y, si.wi.z),
            pdf: 1.0,
            eta: 1.0,
            sampled_type: BSDFFlags::DELTA_REFLECTION,
        };
        (sample, self.reflectance.eval_spectrum(&si.wavelengths).clamp_zero())
    }

    fn eval(&self, _ctx: &BSDFContext, _si: &SurfaceInteraction, _wo: &Vector3f) -> SampledSpectrum {
        SampledSpectrum::zero()
    }

    fn pdf(&self, _ctx: &BSDFContext, _si: &SurfaceInteraction, _wo: &Vector3f) -> Float {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_direction() {
        let mut si = SurfaceInteraction::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), Vector2f::zeros(), 1.0);
        si.wi = Vector3f::new(0.6, 0.0, 0.8);
        let bsdf = SmoothConductor::new(SpectrumCurve::uniform(0.9));
        let (sample, weight) = bsdf.sample(&BSDFContext::default(), &si, 0.1, &Vector2f::zeros());
        assert!((sample.wo - Vector3f::new(-0.6, 0.0, 0.8)).norm() < 1e-6);
        assert!(sample.sampled_type.has(BSDFFlags::DELTA));
        assert!((weight[1] - 0.9).abs() < 1e-6);
    }
}
