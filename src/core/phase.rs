// Copyright @yucwang 2026

use crate::core::bsdf::TransportMode;
use crate::core::medium::MediumInteraction;
use crate::math::constants::{ Float, Vector2f, Vector3f };

#[derive(Debug, Clone, Copy)]
pub struct PhaseFunctionContext {
    pub mode: TransportMode,
}

impl Default for PhaseFunctionContext {
    fn default() -> Self {
        Self { mode: TransportMode::Radiance }
    }
}

/// Medium counterpart of a BSDF. Directions are in world space; `mi.wi`
/// points back along the incoming ray.
pub trait PhaseFunction: Send + Sync {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns `(wo, weight, pdf)` with `weight = value / pdf`.
    fn sample(&self, ctx: &PhaseFunctionContext, mi: &MediumInteraction,
              sample1: Float, sample2: &Vector2f) -> Option<(Vector3f, Float, Float)>;

    /// Returns `(value, pdf)`.
    fn eval(&self, ctx: &PhaseFunctionContext, mi: &MediumInteraction, wo: &Vector3f) -> (Float, Float);
}
