// Copyright @yucwang 2023

use crate::core::bsdf::BSDF;
use crate::core::emitter::Emitter;
use crate::core::medium::Medium;
use crate::math::constants::{ Float, Vector2f, Vector3f, RAY_EPSILON, SHADOW_EPSILON };
use crate::math::frame::Frame;
use crate::math::ray::Ray3f;
use crate::math::spectrum::SampledWavelengths;
use std::sync::Arc;

/// Surface hit record. Shapes fill in the geometry, the scene attaches the
/// BSDF, emitter and the media on both sides.
#[derive(Clone)]
pub struct SurfaceInteraction {
    pub p: Vector3f,
    pub t: Float,
    /// Geometric normal; the exterior side is the one it points to.
    pub n: Vector3f,
    pub frame: Frame,
    /// Incident direction in the shading frame, pointing away from the surface.
    pub wi: Vector3f,
    pub uv: Vector2f,
    pub wavelengths: SampledWavelengths,
    pub bsdf: Option<Arc<dyn BSDF>>,
    pub emitter: Option<Arc<dyn Emitter>>,
    pub interior: Option<Arc<dyn Medium>>,
    pub exterior: Option<Arc<dyn Medium>>,
}

/// Point sampled on a shape, with its area density.
#[derive(Debug, Clone, Copy)]
pub struct PositionSample {
    pub p: Vector3f,
    pub n: Vector3f,
    pub uv: Vector2f,
    pub pdf: Float,
}

impl SurfaceInteraction {
    pub fn new(p: Vector3f, n: Vector3f, uv: Vector2f, t: Float) -> Self {
        let n = n.normalize();
        Self {
            p,
            t,
            n,
            frame: Frame::from_normal(&n),
            wi: Vector3f::new(0.0, 0.0, 1.0),
            uv,
            wavelengths: SampledWavelengths::default(),
            bsdf: None,
            emitter: None,
            interior: None,
            exterior: None,
        }
    }

    /// Records the direction the ray arrived from and the wavelengths it carries.
    pub fn with_ray(mut self, ray: &Ray3f) -> Self {
        self.wi = self.frame.to_local(&(-ray.dir()));
        self.wavelengths = *ray.wavelengths();
        self
    }

    pub fn to_world(&self, v: &Vector3f) -> Vector3f {
        self.frame.to_world(v)
    }

    pub fn to_local(&self, v: &Vector3f) -> Vector3f {
        self.frame.to_local(v)
    }

    /// Incident direction in world space.
    pub fn wi_world(&self) -> Vector3f {
        self.frame.to_world(&self.wi)
    }

    fn offset_origin(&self, d: &Vector3f) -> Vector3f {
        let side = if d.dot(&self.n) >= 0.0 { 1.0 } else { -1.0 };
        self.p + self.n * (side * RAY_EPSILON)
    }

    pub fn spawn_ray(&self, parent: &Ray3f, d: &Vector3f) -> Ray3f {
        parent.spawn(self.offset_origin(d), *d, Some(RAY_EPSILON), None)
    }

    /// Segment towards `target`, stopping just short of it.
    pub fn spawn_ray_to(&self, parent: &Ray3f, target: &Vector3f) -> Ray3f {
        let origin = self.offset_origin(&(target - self.p));
        let to_target = target - origin;
        let dist = to_target.norm();
        parent.spawn(origin, to_target, Some(0.0), Some(dist * (1.0 - SHADOW_EPSILON)))
    }

    /// Medium on the side of the surface that `d` points into.
    pub fn target_medium(&self, d: &Vector3f) -> Option<Arc<dyn Medium>> {
        if d.dot(&self.n) > 0.0 {
            self.exterior.clone()
        } else {
            self.interior.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::homogeneous_medium::HomogeneousMedium;
    use crate::math::spectrum::SpectrumCurve;

    #[test]
    fn test_wi_is_local_and_points_back() {
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 2.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
        let si = SurfaceInteraction::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0),
                                         Vector2f::zeros(), 2.0).with_ray(&ray);
        assert!((si.wi.z - 1.0).abs() < 1e-5);
        assert!((si.wi_world() - Vector3f::new(0.0, 0.0, 1.0)).norm() < 1e-5);
    }

    #[test]
    fn test_target_medium_follows_normal() {
        let mut si = SurfaceInteraction::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0),
                                             Vector2f::zeros(), 1.0);
        let medium: Arc<dyn Medium> = Arc::new(HomogeneousMedium::new(SpectrumCurve::uniform(1.0),
                                                                      SpectrumCurve::uniform(0.5)));
        si.interior = Some(medium);
        assert!(si.target_medium(&Vector3f::new(0.0, 0.0, -1.0)).is_some());
        assert!(si.target_medium(&Vector3f::new(0.0, 0.0, 1.0)).is_none());
    }

    #[test]
    fn test_spawn_ray_to_stops_short() {
        let si = SurfaceInteraction::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0),
                                         Vector2f::zeros(), 1.0);
        let parent = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let target = Vector3f::new(0.0, 0.0, 3.0);
        let ray = si.spawn_ray_to(&parent, &target);
        assert!(ray.at(ray.max_t).z < 3.0);
        assert!(ray.at(ray.max_t).z > 2.9);
    }
}
