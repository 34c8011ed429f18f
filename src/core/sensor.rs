// Copyright @yucwang 2026

use crate::core::medium::Medium;
use crate::math::bitmap::Bitmap;
use crate::math::constants::Vector2f;
use crate::math::ray::Ray3f;
use std::sync::Arc;

pub trait Sensor: Sync {
    /// Primary ray through film position `u` in `[0, 1]^2`.
    fn sample_ray(&self, u: &Vector2f) -> Ray3f;
    fn bitmap(&self) -> &Bitmap;
    fn bitmap_mut(&mut self) -> &mut Bitmap;
    /// Medium the sensor sits in.
    fn medium(&self) -> Option<Arc<dyn Medium>> {
        None
    }
    fn describe(&self) -> String {
        String::from("Sensor")
    }
}
