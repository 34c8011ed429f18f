// Copyright @yucwang 2026

use crate::core::medium::MediumInteraction;
use crate::core::phase::{PhaseFunction, PhaseFunctionContext};
use crate::math::constants::{Float, Vector2f, Vector3f, INV_FOUR_PI};
use crate::math::warp::sample_uniform_sphere;

#[derive(Debug, Default, Clone, Copy)]
pub struct IsotropicPhase;

impl IsotropicPhase {
    pub fn new() -> Self {
        Self
    }
}

impl PhaseFunction for IsotropicPhase {
    fn sample(&self, _ctx: &PhaseFunctionContext, _mi: &MediumInteraction,
              _sample1: Float, sample2: &Vector2f) -> Option<(Vector3f, Float, Float)> {
        Some((sample_uniform_sphere(sample2), 1.0, INV_FOUR_PI))
    }

    fn eval(&self, _ctx: &PhaseFunctionContext, _mi: &MediumInteraction, _wo: &Vector3f) -> (Float, Float) {
        (INV_FOUR_PI, INV_FOUR_PI)
    }
}
