// Copyright @yucwang 2026

use crate::core::medium::Medium;
use crate::core::sensor::Sensor;
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, Vector2f, Vector3f, FLOAT_MAX};
use crate::math::ray::Ray3f;
use std::sync::Arc;

/// Pinhole camera looking from `origin` towards `target`.
pub struct PerspectiveCamera {
    origin: Vector3f,
    forward: Vector3f,
    right: Vector3f,
    up: Vector3f,
    tan_half_fov_y: Float,
    aspect: Float,
    near_clip: Float,
    far_clip: Float,
    medium: Option<Arc<dyn Medium>>,
    bitmap: Bitmap,
}

impl PerspectiveCamera {
    pub fn new(origin: Vector3f,
               target: Vector3f,
               up: Vector3f,
               fov_y_degrees: Float,
               width: usize,
               height: usize) -> Self {
        let forward = (target - origin).normalize();
        let right = forward.cross(&up).normalize();
        let up = right.cross(&forward).normalize();

        Self {
            origin,
            forward,
            right,
            up,
            tan_half_fov_y: (0.5 * fov_y_degrees.to_radians()).tan(),
            aspect: width.max(1) as Float / height.max(1) as Float,
            near_clip: 0.0,
            far_clip: FLOAT_MAX,
            medium: None,
            bitmap: Bitmap::new(width, height),
        }
    }

    pub fn with_clip(mut self, near_clip: Float, far_clip: Float) -> Self {
        self.near_clip = near_clip.max(0.0);
        self.far_clip = far_clip.max(self.near_clip);
        self
    }

    /// Medium surrounding the camera; primary rays start inside it.
    pub fn with_medium(mut self, medium: Option<Arc<dyn Medium>>) -> Self {
        self.medium = medium;
        self
    }

    pub fn width(&self) -> usize {
        self.bitmap.width()
    }

    pub fn height(&self) -> usize {
        self.bitmap.height()
    }
}

impl Sensor for PerspectiveCamera {
    fn sample_ray(&self, u: &Vector2f) -> Ray3f {
        let px = (2.0 * u.x - 1.0) * self.aspect * self.tan_half_fov_y;
        let py = (1.0 - 2.0 * u.y) * self.tan_half_fov_y;

        let d_camera = Vector3f::new(px, py, 1.0).normalize();
        let dir = (self.right * d_camera.x + self.up * d_camera.y + self.forward * d_camera.z).normalize();

        let inv_z = 1.0 / d_camera.z;
        let near_t = self.near_clip * inv_z;
        let far_t = if self.far_clip >= FLOAT_MAX { FLOAT_MAX } else { self.far_clip * inv_z };
        Ray3f::new(self.origin + dir * near_t, dir, Some(0.0), Some(far_t - near_t))
    }

    fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    fn bitmap_mut(&mut self) -> &mut Bitmap {
        &mut self.bitmap
    }

    fn medium(&self) -> Option<Arc<dyn Medium>> {
        self.medium.clone()
    }

    fn describe(&self) -> String {
        format!("PerspectiveCamera [origin={:?}, forward={:?}, film={}x{}, medium={}]",
                self.origin, self.forward, self.width(), self.height(),
                self.medium.as_ref().map_or("none", |m| m.id()))
    }
}
