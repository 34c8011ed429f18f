// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::error::ConfigError;
use crate::core::medium::{null_coefficient, Medium, MediumInteraction};
use crate::core::phase::PhaseFunction;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f, MIN_MAJORANT};
use crate::math::spectrum::{SampledSpectrum, SampledWavelengths, SpectrumCurve};
use crate::phases::isotropic::IsotropicPhase;

/// Constant coefficients, optionally confined to a box.
pub struct HomogeneousMedium {
    id: String,
    sigma_t: SpectrumCurve,
    albedo: SpectrumCurve,
    emission: Option<SpectrumCurve>,
    scale: Float,
    bbox: Option<AABB>,
    phase: Box<dyn PhaseFunction>,
}

impl HomogeneousMedium {
    pub fn new(sigma_t: SpectrumCurve, albedo: SpectrumCurve) -> Self {
        Self {
            id: generate_node_id("HomogeneousMedium"),
            sigma_t,
            albedo,
            emission: None,
            scale: 1.0,
            bbox: None,
            phase: Box::new(IsotropicPhase::new()),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_scale(mut self, scale: Float) -> Self {
        self.scale = scale.max(0.0);
        self
    }

    pub fn with_bbox(mut self, bbox: Option<AABB>) -> Result<Self, ConfigError> {
        if let Some(b) = &bbox {
            if !b.is_solid() {
                return Err(ConfigError::InvalidBoundingBox(self.id.clone()));
            }
        }
        self.bbox = bbox;
        Ok(self)
    }

    pub fn with_phase(mut self, phase: Box<dyn PhaseFunction>) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_emission(mut self, radiance: SpectrumCurve) -> Self {
        self.emission = Some(radiance);
        self
    }

    fn sigma_t(&self, wavelengths: &SampledWavelengths) -> SampledSpectrum {
        (self.sigma_t.eval_spectrum(wavelengths) * self.scale).clamp_zero()
    }
}

impl ComputationNode for HomogeneousMedium {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("HomogeneousMedium [id={}, scale={}, bounded={}]", self.id, self.scale, self.bbox.is_some())
    }
}

impl Medium for HomogeneousMedium {
    fn phase_function(&self) -> &dyn PhaseFunction {
        self.phase.as_ref()
    }

    fn get_majorant(&self, _p_world: &Vector3f, wavelengths: &SampledWavelengths) -> SampledSpectrum {
        self.sigma_t(wavelengths).map(|v| v.max(MIN_MAJORANT))
    }

    fn get_scattering_coefficients(&self, mi: &MediumInteraction)
        -> (SampledSpectrum, SampledSpectrum, SampledSpectrum) {
        let sigma_t = self.sigma_t(&mi.wavelengths);
        let albedo = self.albedo.eval_spectrum(&mi.wavelengths).map(|v| v.max(0.0).min(1.0));
        let sigma_n = null_coefficient(&mi.combined_extinction, &sigma_t);
        (sigma_t * albedo, sigma_n, sigma_t)
    }

    fn get_emission(&self, mi: &MediumInteraction) -> SampledSpectrum {
        match &self.emission {
            Some(curve) => curve.eval_spectrum(&mi.wavelengths),
            None => SampledSpectrum::zero(),
        }
    }

    fn has_emission(&self) -> bool {
        self.emission.is_some()
    }

    fn bbox(&self) -> Option<AABB> {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_medium_rejects_flat_box() {
        let flat = AABB::new(Vector3f::zeros(), Vector3f::new(1.0, 1.0, 0.0));
        let medium = HomogeneousMedium::new(SpectrumCurve::uniform(1.0), SpectrumCurve::uniform(1.0));
        assert!(medium.with_bbox(Some(flat)).is_err());
    }

    #[test]
    fn test_majorant_matches_extinction() {
        let medium = HomogeneousMedium::new(SpectrumCurve::uniform(0.5), SpectrumCurve::uniform(0.3))
            .with_scale(4.0);
        let wl = SampledWavelengths::default();
        let majorant = medium.get_majorant(&Vector3f::zeros(), &wl);
        assert!((majorant[0] - 2.0).abs() < 1e-6);

        let zero = HomogeneousMedium::new(SpectrumCurve::uniform(0.0), SpectrumCurve::uniform(0.3));
        assert!(zero.get_majorant(&Vector3f::zeros(), &wl)[0] >= MIN_MAJORANT);
    }
}
