// Copyright @yucwang 2021

use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::math::bitmap::Bitmap;

pub trait Renderer {
    /// Renders `scene` through `sensor`, fills the sensor's film and
    /// returns a copy of it.
    fn render(&self, scene: &Scene, sensor: &mut dyn Sensor) -> Bitmap;
}
