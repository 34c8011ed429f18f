// Copyright @yucwang 2026

use crate::core::medium::Medium;
use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::math::ray::Ray3f;
use crate::math::spectrum::SampledSpectrum;
use std::sync::Arc;

pub trait Integrator: Sync {
    /// Radiance arriving along `ray`, which starts inside `medium`. The flag
    /// tells whether the sample saw anything at all.
    fn sample(&self, scene: &Scene, ray: &Ray3f, medium: Option<Arc<dyn Medium>>,
              rng: &mut LcgRng) -> (SampledSpectrum, bool);
    fn samples_per_pixel(&self) -> u32;
}
