// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::interaction::{PositionSample, SurfaceInteraction};
use crate::core::shape::Shape;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f, EPSILON};
use crate::math::ray::Ray3f;
use crate::math::transform::Transform;

/// `[-1, 1]^3` under an affine transform, normals facing outwards.
pub struct Cube {
    id: String,
    to_world: Transform,
    face_areas: [Float; 6],
    area: Float,
    inv_area: Float,
}

fn cube_normal(p_local: Vector3f) -> Vector3f {
    let abs = p_local.abs();
    if abs.x >= abs.y && abs.x >= abs.z {
        Vector3f::new(p_local.x.signum(), 0.0, 0.0)
    } else if abs.y >= abs.z {
        Vector3f::new(0.0, p_local.y.signum(), 0.0)
    } else {
        Vector3f::new(0.0, 0.0, p_local.z.signum())
    }
}

impl Cube {
    pub fn new(to_world: Transform, id: Option<String>) -> Self {
        let dx = to_world.apply_vector(Vector3f::new(2.0, 0.0, 0.0));
        let dy = to_world.apply_vector(Vector3f::new(0.0, 2.0, 0.0));
        let dz = to_world.apply_vector(Vector3f::new(0.0, 0.0, 2.0));
        let area_xy = dx.cross(&dy).norm();
        let area_xz = dx.cross(&dz).norm();
        let area_yz = dy.cross(&dz).norm();
        let face_areas = [area_xy, area_xy, area_xz, area_xz, area_yz, area_yz];
        let area = 2.0 * (area_xy + area_xz + area_yz);
        let inv_area = if area > 0.0 { 1.0 / area } else { 0.0 };
        Self { id: id.unwrap_or_else(|| generate_node_id("Cube")), to_world, face_areas, area, inv_area }
    }

    /// Axis-aligned cube filling `bbox`, handy for medium boundaries.
    pub fn from_box(bbox: &AABB, id: Option<String>) -> Self {
        let to_world = Transform::translate(bbox.center())
            .compose(&Transform::scale(bbox.diagnal() * 0.5));
        Self::new(to_world, id)
    }

    /// Nearest boundary crossing within the ray's range, in shared `t`.
    fn intersect_local(&self, ray: &Ray3f) -> Option<(Float, Vector3f)> {
        let o = self.to_world.inv_apply_point(ray.origin());
        let d = self.to_world.inv_apply_vector(ray.dir());

        let mut t_near = Float::NEG_INFINITY;
        let mut t_far = Float::INFINITY;
        for axis in 0..3 {
            if d[axis].abs() < EPSILON {
                if o[axis] < -1.0 || o[axis] > 1.0 {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d[axis];
            let mut t0 = (-1.0 - o[axis]) * inv;
            let mut t1 = (1.0 - o[axis]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_far < t_near {
                return None;
            }
        }

        let t = if ray.test_segment(t_near) {
            t_near
        } else if ray.test_segment(t_far) {
            t_far
        } else {
            return None;
        };
        Some((t, o + d * t))
    }

    fn face_uv(p_local: Vector3f, n_local: Vector3f) -> Vector2f {
        let (u, v) = if n_local.z.abs() > 0.5 {
            (p_local.x, p_local.y)
        } else if n_local.y.abs() > 0.5 {
            (p_local.x, p_local.z)
        } else {
            (p_local.y, p_local.z)
        };
        Vector2f::new(0.5 * (u + 1.0), 0.5 * (v + 1.0))
    }

    fn face_point(face: usize, a: Float, b: Float) -> (Vector3f, Vector3f) {
        match face {
            0 => (Vector3f::new(a, b, 1.0), Vector3f::new(0.0, 0.0, 1.0)),
            1 => (Vector3f::new(a, b, -1.0), Vector3f::new(0.0, 0.0, -1.0)),
            2 => (Vector3f::new(a, 1.0, b), Vector3f::new(0.0, 1.0, 0.0)),
            3 => (Vector3f::new(a, -1.0, b), Vector3f::new(0.0, -1.0, 0.0)),
            4 => (Vector3f::new(1.0, a, b), Vector3f::new(1.0, 0.0, 0.0)),
            _ => (Vector3f::new(-1.0, a, b), Vector3f::new(-1.0, 0.0, 0.0)),
        }
    }
}

impl ComputationNode for Cube {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("Cube [id={}, area={}]", self.id, self.area)
    }
}

impl Shape for Cube {
    fn bounding_box(&self) -> AABB {
        let mut bbox = AABB::default();
        for corner in 0..8 {
            let sign = |bit: usize| if corner & bit != 0 { 1.0 } else { -1.0 };
            let p = self.to_world.apply_point(Vector3f::new(sign(1), sign(2), sign(4)));
            bbox.expand_by_point(&p);
        }
        bbox
    }

    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceInteraction> {
        let (t, p_local) = self.intersect_local(ray)?;
        let n_local = cube_normal(p_local);
        let n_world = self.to_world.apply_normal(n_local).normalize();
        let uv = Self::face_uv(p_local, n_local);
        Some(SurfaceInteraction::new(ray.at(t), n_world, uv, t))
    }

    fn ray_intersection_t(&self, ray: &Ray3f) -> bool {
        self.intersect_local(ray).is_some()
    }

    fn sample(&self, u: &Vector2f) -> PositionSample {
        let target = u.x * self.area;
        let mut accum = 0.0;
        let mut face = 5usize;
        for (idx, face_area) in self.face_areas.iter().enumerate() {
            if target <= accum + face_area {
                face = idx;
                break;
            }
            accum += face_area;
        }
        let face_area = self.face_areas[face];
        let local_u = if face_area > 0.0 { ((target - accum) / face_area).max(0.0).min(1.0) } else { 0.5 };

        let (p_local, n_local) = Self::face_point(face, 2.0 * local_u - 1.0, 2.0 * u.y - 1.0);
        PositionSample {
            p: self.to_world.apply_point(p_local),
            n: self.to_world.apply_normal(n_local).normalize(),
            uv: Self::face_uv(p_local, n_local),
            pdf: self.inv_area,
        }
    }

    fn surface_area(&self) -> Float {
        self.area
    }
}
