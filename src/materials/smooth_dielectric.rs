// Copyright @yucwang 2026

use crate::core::bsdf::{BSDFContext, BSDFFlags, BSDFSample, TransportMode, BSDF};
use crate::core::interaction::SurfaceInteraction;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::spectrum::SampledSpectrum;

/// Unpolarized Fresnel reflectance. `cos_i > 0` means the ray arrives from
/// the `eta_i` side.
pub fn fresnel_dielectric(cos_i: Float, eta_i: Float, eta_t: Float) -> Float {
    let mut cos_i = cos_i.max(-1.0).min(1.0);
    let entering = cos_i > 0.0;
    let (eta_i, eta_t) = if entering { (eta_i, eta_t) } else { (eta_t, eta_i) };
    cos_i = cos_i.abs();

    let sin2_i = (1.0 - cos_i * cos_i).max(0.0);
    let eta = eta_i / eta_t;
    let sin2_t = eta * eta * sin2_i;
    if sin2_t >= 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    let r_parl = (eta_t * cos_i - eta_i * cos_t) / (eta_t * cos_i + eta_i * cos_t);
    let r_perp = (eta_i * cos_i - eta_t * cos_t) / (eta_i * cos_i + eta_t * cos_t);
    0.5 * (r_parl * r_parl + r_perp * r_perp)
}

/// Glass-like interface that picks reflection or refraction by its
/// Fresnel term.
pub struct SmoothDielectric {
    int_ior: Float,
    ext_ior: Float,
}

impl SmoothDielectric {
    pub fn new(int_ior: Float, ext_ior: Float) -> Self {
        Self { int_ior, ext_ior }
    }

    /// Relative index of refraction, interior over exterior.
    pub fn eta(&self) -> Float {
        self.int_ior / self.ext_ior
    }
}

impl BSDF for SmoothDielectric {
    fn flags(&self) -> BSDFFlags {
        BSDFFlags::DELTA_REFLECTION | BSDFFlags::DELTA_TRANSMISSION
    }

    fn sample(&self, ctx: &BSDFContext, si: &SurfaceInteraction,
              sample1: Float, _sample2: &Vector2f) -> (BSDFSample, SampledSpectrum) {
        let cos_i = si.wi.z;
        let reflectance = fresnel_dielectric(cos_i, self.ext_ior, self.int_ior);

        if sample1 < reflectance {
            let sample = BSDFSample {
                wo: Vector3f::new(-si.wi.x, -si.wi.y, si.wi.z),
                pdf: reflectance,
                eta: 1.0,
                sampled_type: BSDFFlags::DELTA_REFLECTION,
            };
            return (sample, SampledSpectrum::one());
        }

        let entering = cos_i > 0.0;
        let eta = if entering { self.eta() } else { 1.0 / self.eta() };
        let ratio = 1.0 / eta;
        let cos_i_abs = cos_i.abs();
        let sin2_t = ratio * ratio * (1.0 - cos_i_abs * cos_i_abs).max(0.0);
        if sin2_t >= 1.0 {
            return (BSDFSample::default(), SampledSpectrum::zero());
        }
        let cos_t = (1.0 - sin2_t).sqrt();
        let side = if entering { 1.0 } else { -1.0 };
        let wo = -si.wi * ratio + Vector3f::new(0.0, 0.0, side * (ratio * cos_i_abs - cos_t));

        let sample = BSDFSample {
            wo: wo.normalize(),
            pdf: 1.0 - reflectance,
            eta,
            sampled_type: BSDFFlags::DELTA_TRANSMISSION,
        };
        let weight = match ctx.mode {
            TransportMode::Radiance => 1.0 / (eta * eta),
            TransportMode::Importance => 1.0,
        };
        (sample, SampledSpectrum::splat(weight))
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

    fn hit(wi: Vector3f) -> SurfaceInteraction {
        let mut si = SurfaceInteraction::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), Vector2f::zeros(), 1.0);
        si.wi = wi.normalize();
        si
    }

    #[test]
    fn test_fresnel_normal_incidence() {
        let r = fresnel_dielectric(1.0, 1.0, 1.5);
        assert!((r - 0.04).abs() < 1e-4);
        assert_eq!(fresnel_dielectric(-0.1, 1.0, 1.5), 1.0);
    }

    #[test]
    fn test_refraction_obeys_snell() {
        let bsdf = SmoothDielectric::new(1.5, 1.0);
        let si = hit(Vector3f::new(0.5, 0.0, 0.8));
        let (sample, weight) = bsdf.sample(&BSDFContext::default(), &si, 0.99, &Vector2f::zeros());
        assert_eq!(sample.sampled_type, BSDFFlags::DELTA_TRANSMISSION);
        assert!(sample.wo.z < 0.0);
        let sin_i = (1.0 - si.wi.z * si.wi.z).sqrt();
        let sin_t = (1.0 - sample.wo.z * sample.wo.z).sqrt();
        assert!((sin_i - 1.5 * sin_t).abs() < 1e-4);
        assert!((sample.eta - 1.5).abs() < 1e-6);
        assert!((weight[0] - 1.0 / 2.25).abs() < 1e-5);
    }

    #[test]
    fn test_reflection_branch() {
        let bsdf = SmoothDielectric::new(1.5, 1.0);
        let si = hit(Vector3f::new(0.0, 0.0, 1.0));
        let (sample, weight) = bsdf.sample(&BSDFContext::default(), &si, 0.01, &Vector2f::zeros());
        assert_eq!(sample.sampled_type, BSDFFlags::DELTA_REFLECTION);
        assert!((sample.wo.z - 1.0).abs() < 1e-6);
        assert!((sample.pdf - 0.04).abs() < 1e-4);
        assert_eq!(weight[0], 1.0);
    }
}
