// Copyright @yucwang 2026

use crate::core::bsdf::{BSDFContext, BSDFFlags, BSDFSample, BSDF};
use crate::core::interaction::SurfaceInteraction;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::spectrum::SampledSpectrum;

/// Index-matched interface. Marks a medium boundary without scattering.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBSDF;

impl NullBSDF {
    pub fn new() -> Self {
        Self
    }
}

impl BSDF for NullBSDF {
    fn flags(&self) -> BSDFFlags {
        BSDFFlags::NULL
    }

    fn sample(&self, _ctx: &BSDFContext, si: &SurfaceInteraction,
              _sample1: Float, _sample2: &Vector2f) -> (BSDFSample, SampledSpectrum) {
        let sample = BSDFSample {
            wo: -si.wi,
            pdf: 1.0,
            eta: 1.0,
            sampled_type: BSDFFlags::NULL,
        };
        (sample, SampledSpectrum::one())
    }

    fn eval(&self, _ctx: &BSDFContext, _si: &SurfaceInteraction, _wo: &Vector3f) -> SampledSpectrum {
        SampledSpectrum::zero()
    }

    fn pdf(&self, _ctx: &BSDFContext, _si: &SurfaceInteraction, _wo: &Vector3f) -> Float {
        0.0
    }
}
