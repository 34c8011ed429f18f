// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::interaction::{PositionSample, SurfaceInteraction};
use crate::core::shape::Shape;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f, EPSILON};
use crate::math::ray::Ray3f;
use crate::math::transform::Transform;

/// `[-1, 1]^2` in the local `z = 0` plane, facing `+z`.
pub struct Rectangle {
    id: String,
    to_world: Transform,
    normal: Vector3f,
    area: Float,
    inv_area: Float,
}

impl Rectangle {
    pub fn new(to_world: Transform, id: Option<String>) -> Self {
        let dp_du = to_world.apply_vector(Vector3f::new(2.0, 0.0, 0.0));
        let dp_dv = to_world.apply_vector(Vector3f::new(0.0, 2.0, 0.0));
        let area = dp_du.cross(&dp_dv).norm();
        let inv_area = if area > 0.0 { 1.0 / area } else { 0.0 };
        let mut normal = to_world.apply_normal(Vector3f::new(0.0, 0.0, 1.0));
        if normal.norm() > 0.0 {
            normal = normal.normalize();
        }

        Self {
            id: id.unwrap_or_else(|| generate_node_id("Rectangle")),
            to_world,
            normal,
            area,
            inv_area,
        }
    }

    pub fn normal(&self) -> Vector3f {
        self.normal
    }

    /// Parametric distance and local hit point. The local direction keeps
    /// the world ray's scale, so `t` is shared by both spaces.
    fn intersect_local(&self, ray: &Ray3f) -> Option<(Float, Vector3f)> {
        let o = self.to_world.inv_apply_point(ray.origin());
        let d = self.to_world.inv_apply_vector(ray.dir());
        if d.z.abs() < EPSILON {
            return None;
        }

        let t = -o.z / d.z;
        if !ray.test_segment(t) {
            return None;
        }
        let p_local = o + d * t;
        if p_local.x.abs() > 1.0 || p_local.y.abs() > 1.0 {
            return None;
        }
        Some((t, p_local))
    }
}

impl ComputationNode for Rectangle {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("Rectangle [id={}, area={}]", self.id, self.area)
    }
}

impl Shape for Rectangle {
    fn bounding_box(&self) -> AABB {
        let mut bbox = AABB::default();
        let corners = [
            Vector3f::new(-1.0, -1.0, 0.0),
            Vector3f::new(-1.0,  1.0, 0.0),
            Vector3f::new( 1.0, -1.0, 0.0),
            Vector3f::new( 1.0,  1.0, 0.0),
        ];
        for corner in &corners {
            let p = self.to_world.apply_point(*corner);
            bbox.expand_by_point(&p);
        }
        bbox
    }

    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceInteraction> {
        let (t, p_local) = self.intersect_local(ray)?;
        let uv = Vector2f::new(0.5 * (p_local.x + 1.0), 0.5 * (p_local.y + 1.0));
        Some(SurfaceInteraction::new(ray.at(t), self.normal, uv, t))
    }

    fn ray_intersection_t(&self, ray: &Ray3f) -> bool {
        self.intersect_local(ray).is_some()
    }

    fn sample(&self, u: &Vector2f) -> PositionSample {
        let p_local = Vector3f::new(2.0 * u.x - 1.0, 2.0 * u.y - 1.0, 0.0);
        PositionSample {
            p: self.to_world.apply_point(p_local),
            n: self.normal,
            uv: *u,
            pdf: self.inv_area,
        }
    }

    fn surface_area(&self) -> Float {
        self.area
    }
}
