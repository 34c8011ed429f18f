// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::emitter::{DirectionSample, Emitter, EmitterFlag};
use crate::math::constants::{Float, Vector2f, Vector3f, INV_FOUR_PI};
use crate::math::spectrum::{SampledSpectrum, SampledWavelengths, SpectrumCurve};
use crate::math::warp::sample_uniform_sphere;

/// Uniform environment surrounding the scene.
pub struct ConstantEmitter {
    id: String,
    radiance: SpectrumCurve,
}

impl ConstantEmitter {
    pub fn new(radiance: SpectrumCurve) -> Self {
        Self { id: generate_node_id("ConstantEmitter"), radiance }
    }
}

impl ComputationNode for ConstantEmitter {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("ConstantEmitter [id={}]", self.id)
    }
}

impl Emitter for ConstantEmitter {
    fn get_flag(&self) -> EmitterFlag {
        EmitterFlag::INFINITE
    }

    fn sample_direction(&self, _ref_p: &Vector3f, u: &Vector2f,
                        wavelengths: &SampledWavelengths) -> (DirectionSample, SampledSpectrum) {
        let d = sample_uniform_sphere(u);
        let ds = DirectionSample {
            p: Vector3f::zeros(),
            n: -d,
            d,
            dist: Float::INFINITY,
            pdf: INV_FOUR_PI,
            delta: false,
            emitter: None,
        };
        (ds, self.radiance.eval_spectrum(wavelengths) / INV_FOUR_PI)
    }

    fn pdf_direction(&self, _ref_p: &Vector3f, _ds: &DirectionSample) -> Float {
        INV_FOUR_PI
    }

    fn eval_direction(&self, _dir: &Vector3f, wavelengths: &SampledWavelengths) -> SampledSpectrum {
        self.radiance.eval_spectrum(wavelengths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sphere_sampling() {
        let sky = ConstantEmitter::new(SpectrumCurve::uniform(0.5));
        let wl = SampledWavelengths::default();
        let (ds, weight) = sky.sample_direction(&Vector3f::zeros(), &Vector2f::new(0.2, 0.7), &wl);
        assert!((ds.d.norm() - 1.0).abs() < 1e-5);
        assert!((weight[0] * ds.pdf - 0.5).abs() < 1e-5);
        assert!(sky.is_environment());
        assert_eq!(sky.eval_direction(&ds.d, &wl)[2], 0.5);
    }
}
