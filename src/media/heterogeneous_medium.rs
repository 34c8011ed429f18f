// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::error::ConfigError;
use crate::core::medium::{null_coefficient, Majorant, Medium, MediumInteraction};
use crate::core::phase::PhaseFunction;
use crate::core::volume::Volume;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f, MIN_MAJORANT};
use crate::math::spectrum::{SampledSpectrum, SampledWavelengths, SpectrumCurve};
use crate::media::activation::DensityActivation;
use crate::phases::isotropic::IsotropicPhase;
use crate::volumes::majorant_grid::MajorantGrid;
use std::sync::Arc;

pub const DEFAULT_MAX_FACTOR: Float = 1.01;

/// Density grid medium: `sigma_t = activation(scale * density(p))`.
pub struct HeterogeneousMedium {
    id: String,
    density: Arc<dyn Volume>,
    albedo: Arc<dyn Volume>,
    emission: Option<(Arc<dyn Volume>, SpectrumCurve)>,
    scale: Float,
    activation: DensityActivation,
    max_factor: Float,
    supergrid_factor: Option<usize>,
    phase: Box<dyn PhaseFunction>,
    bbox: AABB,
    majorant: Majorant,
}

/// Widens `x` by `max_factor` away from zero's side so it never decreases.
pub fn slack(x: Float, max_factor: Float) -> Float {
    if x >= 0.0 {
        x * max_factor
    } else {
        x / max_factor
    }
}

fn medium_bbox(density: &dyn Volume, id: &str) -> Result<AABB, ConfigError> {
    match density.bbox() {
        Some(bbox) if bbox.is_solid() => Ok(bbox),
        _ => Err(ConfigError::InvalidBoundingBox(id.to_string())),
    }
}

impl HeterogeneousMedium {
    /// The medium is bounded by the density volume's box.
    pub fn new(density: Arc<dyn Volume>, albedo: Arc<dyn Volume>) -> Result<Self, ConfigError> {
        let id = generate_node_id("HeterogeneousMedium");
        let bbox = medium_bbox(density.as_ref(), &id)?;
        let mut medium = Self {
            id,
            density,
            albedo,
            emission: None,
            scale: 1.0,
            activation: DensityActivation::None,
            max_factor: DEFAULT_MAX_FACTOR,
            supergrid_factor: None,
            phase: Box::new(IsotropicPhase::new()),
            bbox,
            majorant: Majorant::Global(MIN_MAJORANT),
        };
        medium.parameters_changed();
        Ok(medium)
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_scale(mut self, scale: Float) -> Result<Self, ConfigError> {
        self.set_scale(scale)?;
        Ok(self)
    }

    pub fn with_activation(mut self, activation: DensityActivation) -> Self {
        self.set_activation(activation);
        self
    }

    pub fn with_supergrid(mut self, resolution_factor: Option<usize>) -> Self {
        self.set_supergrid_resolution(resolution_factor);
        self
    }

    pub fn with_phase(mut self, phase: Box<dyn PhaseFunction>) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_emission(mut self, emission: Arc<dyn Volume>, radiance: SpectrumCurve) -> Self {
        self.emission = Some((emission, radiance));
        self
    }

    pub fn set_scale(&mut self, scale: Float) -> Result<(), ConfigError> {
        if !(scale >= 0.0) || !scale.is_finite() {
            return Err(ConfigError::invalid_parameter("scale", format!("{} is not a finite non-negative number", scale)));
        }
        self.scale = scale;
        self.parameters_changed();
        Ok(())
    }

    pub fn set_activation(&mut self, activation: DensityActivation) {
        self.activation = activation;
        self.parameters_changed();
    }

    pub fn set_density(&mut self, density: Arc<dyn Volume>) -> Result<(), ConfigError> {
        self.bbox = medium_bbox(density.as_ref(), &self.id)?;
        self.density = density;
        self.parameters_changed();
        Ok(())
    }

    pub fn set_albedo(&mut self, albedo: Arc<dyn Volume>) {
        self.albedo = albedo;
        self.parameters_changed();
    }

    /// `None` switches back to a single global majorant.
    pub fn set_supergrid_resolution(&mut self, resolution_factor: Option<usize>) {
        self.supergrid_factor = resolution_factor.filter(|f| *f > 0);
        self.parameters_changed();
    }

    pub fn set_max_factor(&mut self, max_factor: Float) -> Result<(), ConfigError> {
        if !(max_factor >= 1.0) || !max_factor.is_finite() {
            return Err(ConfigError::invalid_parameter("max_factor", format!("{} is below 1", max_factor)));
        }
        self.max_factor = max_factor;
        self.parameters_changed();
        Ok(())
    }

    pub fn scale(&self) -> Float {
        self.scale
    }

    pub fn activation(&self) -> DensityActivation {
        self.activation
    }

    pub fn majorant(&self) -> &Majorant {
        &self.majorant
    }

    /// Rebuilds the cached majorant from the current parameters.
    pub fn parameters_changed(&mut self) {
        let activation = self.activation;
        let max_factor = self.max_factor;
        let bound = move |x: Float| activation.apply(slack(x, max_factor)).max(MIN_MAJORANT);

        let grid = self.supergrid_factor
            .and_then(|f| self.density.local_majorants(f, self.scale));
        self.majorant = match grid {
            Some(grid) => {
                let grid = grid.map(bound);
                log::debug!("{}: supergrid majorant {:?}, max {}", self.id, grid.resolution(), grid.max_value());
                Majorant::Supergrid(grid)
            }
            None => {
                if self.supergrid_factor.is_some() {
                    log::warn!("{}: density volume has no local majorants, using a global one", self.id);
                }
                let value = bound(self.scale * self.density.max());
                log::debug!("{}: global majorant {}", self.id, value);
                Majorant::Global(value)
            }
        };
    }

    fn sigma_t_at(&self, p: Vector3f) -> Float {
        self.activation.apply(self.scale * self.density.eval_1(p)).max(0.0)
    }
}

impl ComputationNode for HeterogeneousMedium {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("HeterogeneousMedium [id={}, scale={}, activation={}, supergrid={:?}]",
                self.id, self.scale, self.activation.name(), self.supergrid_factor)
    }
}

impl Medium for HeterogeneousMedium {
    fn phase_function(&self) -> &dyn PhaseFunction {
        self.phase.as_ref()
    }

    fn get_majorant(&self, p_world: &Vector3f, _wavelengths: &SampledWavelengths) -> SampledSpectrum {
        SampledSpectrum::splat(self.majorant.eval(p_world))
    }

    fn majorant_grid(&self) -> Option<&MajorantGrid> {
        self.majorant.grid()
    }

    fn get_scattering_coefficients(&self, mi: &MediumInteraction)
        -> (SampledSpectrum, SampledSpectrum, SampledSpectrum) {
        let sigma_t = SampledSpectrum::splat(self.sigma_t_at(mi.p));
        let albedo = self.albedo.eval_1(mi.p).max(0.0).min(1.0);
        let sigma_n = null_coefficient(&mi.combined_extinction, &sigma_t);
        (sigma_t * albedo, sigma_n, sigma_t)
    }

    fn get_emission(&self, mi: &MediumInteraction) -> SampledSpectrum {
        match &self.emission {
            Some((volume, radiance)) => radiance.eval_spectrum(&mi.wavelengths) * volume.eval_1(mi.p).max(0.0),
            None => SampledSpectrum::zero(),
        }
    }

    fn has_emission(&self) -> bool {
        self.emission.is_some()
    }

    fn bbox(&self) -> Option<AABB> {
        Some(self.bbox)
    }
}
