// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::phase::PhaseFunction;
use crate::math::aabb::AABB;
use crate::math::constants::{ Float, Vector3f };
use crate::math::ray::Ray3f;
use crate::math::spectrum::{ SampledSpectrum, SampledWavelengths };
use crate::volumes::majorant_grid::MajorantGrid;
use std::sync::Arc;

/// Cached extinction bound of a medium.
#[derive(Debug, Clone)]
pub enum Majorant {
    Global(Float),
    Supergrid(MajorantGrid),
}

impl Majorant {
    pub fn grid(&self) -> Option<&MajorantGrid> {
        match self {
            Majorant::Global(_) => None,
            Majorant::Supergrid(grid) => Some(grid),
        }
    }

    pub fn eval(&self, p_world: &Vector3f) -> Float {
        match self {
            Majorant::Global(value) => *value,
            Majorant::Supergrid(grid) => grid.lookup(p_world),
        }
    }
}

/// Point sampled inside a medium by the free-flight sampler.
#[derive(Clone)]
pub struct MediumInteraction {
    pub p: Vector3f,
    pub t: Float,
    /// Points back along the incoming ray.
    pub wi: Vector3f,
    pub wavelengths: SampledWavelengths,
    pub sigma_s: SampledSpectrum,
    pub sigma_n: SampledSpectrum,
    pub sigma_t: SampledSpectrum,
    /// Majorant the candidate distance was drawn with.
    pub combined_extinction: SampledSpectrum,
    /// Emitted radiance at `p`.
    pub radiance: SampledSpectrum,
    pub medium: Arc<dyn Medium>,
}

impl MediumInteraction {
    pub fn new(medium: Arc<dyn Medium>, ray: &Ray3f) -> Self {
        Self {
            p: ray.origin(),
            t: ray.min_t,
            wi: -ray.dir(),
            wavelengths: *ray.wavelengths(),
            sigma_s: SampledSpectrum::zero(),
            sigma_n: SampledSpectrum::zero(),
            sigma_t: SampledSpectrum::zero(),
            combined_extinction: SampledSpectrum::zero(),
            radiance: SampledSpectrum::zero(),
            medium,
        }
    }

    pub fn move_to(&mut self, ray: &Ray3f, t: Float) {
        self.t = t;
        self.p = ray.at(t);
    }

    pub fn sigma_a(&self) -> SampledSpectrum {
        (self.sigma_t - self.sigma_s).clamp_zero()
    }

    /// Throughput factor of a real collision that continues as scattering:
    /// `sigma_s / sigma_t`, with the lane average in the denominator so
    /// chromatic media stay unbiased.
    pub fn scatter_weight(&self) -> SampledSpectrum {
        let mean = self.sigma_t.average();
        if mean > 0.0 {
            self.sigma_s / mean
        } else {
            SampledSpectrum::zero()
        }
    }

    /// Collision estimate of medium emission, `sigma_a * Le / sigma_t`.
    pub fn emission_weight(&self) -> SampledSpectrum {
        let mean = self.sigma_t.average();
        if mean > 0.0 {
            self.sigma_a() * self.radiance / mean
        } else {
            SampledSpectrum::zero()
        }
    }
}

/// Participating medium: an extinction field, its majorant and a phase
/// function. Implementations are immutable while rendering; every setter
/// refreshes the cached majorant before it returns.
pub trait Medium: ComputationNode + Send + Sync {
    fn phase_function(&self) -> &dyn PhaseFunction;

    /// Upper bound of `sigma_t` around `p_world`, per wavelength lane.
    fn get_majorant(&self, p_world: &Vector3f, wavelengths: &SampledWavelengths) -> SampledSpectrum;

    /// Piecewise-constant majorant to traverse instead of the global one.
    fn majorant_grid(&self) -> Option<&MajorantGrid> {
        None
    }

    /// Returns `(sigma_s, sigma_n, sigma_t)` at `mi.p`, where `sigma_n` is
    /// the null-collision density left by `mi.combined_extinction`.
    fn get_scattering_coefficients(&self, mi: &MediumInteraction)
        -> (SampledSpectrum, SampledSpectrum, SampledSpectrum);

    fn get_albedo(&self, mi: &MediumInteraction) -> SampledSpectrum {
        let (sigma_s, _, sigma_t) = self.get_scattering_coefficients(mi);
        sigma_s.safe_div(&sigma_t)
    }

    fn get_emission(&self, _mi: &MediumInteraction) -> SampledSpectrum {
        SampledSpectrum::zero()
    }

    fn has_emission(&self) -> bool {
        false
    }

    /// `None` for media without spatial bounds.
    fn bbox(&self) -> Option<AABB> {
        None
    }

    /// Parametric range of `ray` inside the medium's bounds.
    fn intersect_aabb(&self, ray: &Ray3f) -> Option<(Float, Float)> {
        match self.bbox() {
            Some(bbox) => bbox.ray_intersect_range(ray),
            None => if ray.min_t <= ray.max_t { Some((ray.min_t, ray.max_t)) } else { None },
        }
    }
}

/// `sigma_n = max(0, majorant - sigma_t)`.
pub fn null_coefficient(combined_extinction: &SampledSpectrum, sigma_t: &SampledSpectrum) -> SampledSpectrum {
    (*combined_extinction - *sigma_t).clamp_zero()
}
