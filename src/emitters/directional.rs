// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::emitter::{DirectionSample, Emitter, EmitterFlag};
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::spectrum::{SampledSpectrum, SampledWavelengths, SpectrumCurve};

/// Distant light with irradiance `E` arriving along `direction`.
pub struct DirectionalEmitter {
    id: String,
    direction: Vector3f,
    irradiance: SpectrumCurve,
}

impl DirectionalEmitter {
    pub fn new(direction: Vector3f, irradiance: SpectrumCurve) -> Self {
        let len = direction.norm();
        let direction = if len > 0.0 { direction / len } else { Vector3f::new(0.0, 0.0, -1.0) };
        Self { id: generate_node_id("DirectionalEmitter"), direction, irradiance }
    }

    pub fn direction(&self) -> Vector3f {
        self.direction
    }
}

impl ComputationNode for DirectionalEmitter {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("DirectionalEmitter [id={}, direction={:?}]", self.id, self.direction)
    }
}

impl Emitter for DirectionalEmitter {
    fn get_flag(&self) -> EmitterFlag {
        EmitterFlag::DIRECTION | EmitterFlag::DELTA
    }

    fn sample_direction(&self, _ref_p: &Vector3f, _u: &Vector2f,
                        wavelengths: &SampledWavelengths) -> (DirectionSample, SampledSpectrum) {
        let ds = DirectionSample {
            p: Vector3f::zeros(),
            n: self.direction,
            d: -self.direction,
            dist: Float::INFINITY,
            pdf: 1.0,
            delta: true,
            emitter: None,
        };
        (ds, self.irradiance.eval_spectrum(wavelengths))
    }

    fn pdf_direction(&self, _ref_p: &Vector3f, _ds: &DirectionSample) -> Float {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_against_travel_direction() {
        let sun = DirectionalEmitter::new(Vector3f::new(0.0, 0.0, -2.0), SpectrumCurve::uniform(4.0));
        let (ds, weight) = sun.sample_direction(&Vector3f::zeros(), &Vector2f::zeros(), &SampledWavelengths::default());
        assert!((ds.d - Vector3f::new(0.0, 0.0, 1.0)).norm() < 1e-6);
        assert!(ds.delta && sun.is_delta());
        assert_eq!(weight[0], 4.0);
        assert_eq!(sun.pdf_direction(&Vector3f::zeros(), &ds), 0.0);
    }
}
