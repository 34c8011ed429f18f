// Copyright @yucwang 2023

use crate::core::interaction::{ PositionSample, SurfaceInteraction };
use crate::math::aabb::AABB;
use crate::math::constants::{ Float, Vector2f };
use crate::math::ray::Ray3f;

pub trait Shape: crate::core::computation_node::ComputationNode + Send + Sync {
    fn bounding_box(&self) -> AABB;
    /// Closest hit inside `[ray.min_t, ray.max_t]`, geometry only.
    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceInteraction>;
    fn ray_intersection_t(&self, ray: &Ray3f) -> bool {
        self.ray_intersection(ray).is_some()
    }
    /// Uniform point on the surface; the pdf is per unit area.
    fn sample(&self, u: &Vector2f) -> PositionSample;
    fn surface_area(&self) -> Float;
}
