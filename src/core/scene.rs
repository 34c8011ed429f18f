// Copyright @yucwang 2026

use crate::core::bsdf::BSDF;
use crate::core::emitter::{DirectionSample, Emitter};
use crate::core::interaction::SurfaceInteraction;
use crate::core::medium::Medium;
use crate::core::shape::Shape;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::spectrum::{SampledSpectrum, SampledWavelengths};
use std::sync::Arc;

pub struct SceneObject {
    pub shape: Arc<dyn Shape>,
    pub bsdf: Arc<dyn BSDF>,
    pub emitter: Option<Arc<dyn Emitter>>,
    pub name: Option<String>,
    pub interior_medium: Option<Arc<dyn Medium>>,
    pub exterior_medium: Option<Arc<dyn Medium>>,
}

impl SceneObject {
    pub fn new(shape: Arc<dyn Shape>, bsdf: Arc<dyn BSDF>) -> Self {
        Self { shape, bsdf, emitter: None, name: None, interior_medium: None, exterior_medium: None }
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn Emitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_interior_medium(mut self, medium: Option<Arc<dyn Medium>>) -> Self {
        self.interior_medium = medium;
        self
    }

    pub fn with_exterior_medium(mut self, medium: Option<Arc<dyn Medium>>) -> Self {
        self.exterior_medium = medium;
        self
    }

    pub fn shape(&self) -> &Arc<dyn Shape> {
        &self.shape
    }
}

/// Flat list of objects and emitters; intersection is a linear scan.
pub struct Scene {
    objects: Vec<SceneObject>,
    emitters: Vec<Arc<dyn Emitter>>,
    environment: Option<Arc<dyn Emitter>>,
    scene_bounds: AABB,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            emitters: Vec::new(),
            environment: None,
            scene_bounds: AABB::default(),
        }
    }

    pub fn add_object(&mut self, object: SceneObject) {
        self.scene_bounds.expand_by_aabb(&object.shape.bounding_box());
        if let Some(emitter) = &object.emitter {
            self.emitters.push(emitter.clone());
        }
        self.objects.push(object);
    }

    /// Registers an emitter that is not attached to a shape.
    pub fn add_emitter(&mut self, emitter: Arc<dyn Emitter>) {
        if emitter.is_environment() {
            if let Some(previous) = &self.environment {
                log::warn!("Replacing environment emitter {} with {}", previous.id(), emitter.id());
                let previous_id = previous.id().to_string();
                self.emitters.retain(|e| e.id() != previous_id);
            }
            self.environment = Some(emitter.clone());
        }
        self.emitters.push(emitter);
    }

    pub fn objects(&self) -> &Vec<SceneObject> {
        &self.objects
    }

    pub fn emitters(&self) -> &Vec<Arc<dyn Emitter>> {
        &self.emitters
    }

    pub fn environment(&self) -> Option<&Arc<dyn Emitter>> {
        self.environment.as_ref()
    }

    pub fn scene_bounds(&self) -> &AABB {
        &self.scene_bounds
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn ray_intersect(&self, ray: &Ray3f) -> Option<SurfaceInteraction> {
        let mut closest = *ray;
        let mut found: Option<(usize, SurfaceInteraction)> = None;
        for (idx, object) in self.objects.iter().enumerate() {
            if let Some(hit) = object.shape.ray_intersection(&closest) {
                if closest.update(hit.t) {
                    found = Some((idx, hit));
                }
            }
        }

        let (idx, mut si) = found?;
        let object = &self.objects[idx];
        si = si.with_ray(ray);
        si.bsdf = Some(object.bsdf.clone());
        si.emitter = object.emitter.clone();
        si.interior = object.interior_medium.clone();
        si.exterior = object.exterior_medium.clone();
        Some(si)
    }

    pub fn ray_test(&self, ray: &Ray3f) -> bool {
        self.objects.iter().any(|object| object.shape.ray_intersection_t(ray))
    }

    fn selection_pdf(&self) -> Float {
        if self.emitters.is_empty() {
            0.0
        } else {
            1.0 / (self.emitters.len() as Float)
        }
    }

    /// Picks an emitter uniformly and samples a direction towards it. The
    /// returned weight and pdf include the selection probability.
    pub fn sample_emitter_direction(&self, ref_p: &Vector3f, u: &Vector2f,
                                    wavelengths: &SampledWavelengths) -> (DirectionSample, SampledSpectrum) {
        if self.emitters.is_empty() {
            return (DirectionSample::invalid(), SampledSpectrum::zero());
        }

        let count = self.emitters.len();
        let scaled = u.x * (count as Float);
        let index = (scaled as usize).min(count - 1);
        let u_remapped = Vector2f::new((scaled - index as Float).min(1.0).max(0.0), u.y);

        let emitter = &self.emitters[index];
        let (mut ds, weight) = emitter.sample_direction(ref_p, &u_remapped, wavelengths);
        if ds.pdf <= 0.0 {
            return (DirectionSample::invalid(), SampledSpectrum::zero());
        }
        let select_pdf = self.selection_pdf();
        ds.pdf *= select_pdf;
        ds.emitter = Some(emitter.clone());
        (ds, weight / select_pdf)
    }

    /// Density with which `sample_emitter_direction` would produce `ds`.
    pub fn pdf_emitter_direction(&self, ref_p: &Vector3f, ds: &DirectionSample) -> Float {
        match &ds.emitter {
            Some(emitter) if !emitter.is_delta() => {
                emitter.pdf_direction(ref_p, ds) * self.selection_pdf()
            }
            _ => 0.0,
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitters::area::AreaEmitter;
    use crate::emitters::constant::ConstantEmitter;
    use crate::materials::diffuse::DiffuseBSDF;
    use crate::math::spectrum::SpectrumCurve;
    use crate::math::transform::Transform;
    use crate::shapes::rectangle::Rectangle;

    fn plane_at(z: Float) -> Arc<dyn Shape> {
        Arc::new(Rectangle::new(Transform::translate(Vector3f::new(0.0, 0.0, z)), None))
    }

    fn gray() -> Arc<dyn BSDF> {
        Arc::new(DiffuseBSDF::new(SpectrumCurve::uniform(0.5)))
    }

    #[test]
    fn test_scene_ray_intersect_closest_hit() {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new(plane_at(5.0), gray()));
        scene.add_object(SceneObject::new(plane_at(2.0), gray()));
        scene.add_object(SceneObject::new(plane_at(10.0), gray()));

        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let hit = scene.ray_intersect(&ray).unwrap();

        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!(hit.bsdf.is_some());
        assert!(scene.ray_test(&ray));

        let short = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, Some(1.0));
        assert!(scene.ray_intersect(&short).is_none());
        assert!(!scene.ray_test(&short));
    }

    #[test]
    fn test_emitter_selection_pdf() {
        let mut scene = Scene::new();
        let shape = plane_at(3.0);
        let light: Arc<dyn Emitter> = Arc::new(AreaEmitter::new(shape.clone(), SpectrumCurve::uniform(1.0)));
        scene.add_object(SceneObject::new(shape, gray()).with_emitter(light));
        scene.add_emitter(Arc::new(ConstantEmitter::new(SpectrumCurve::uniform(0.5))));
        assert_eq!(scene.emitters().len(), 2);
        assert!(scene.environment().is_some());

        let wl = SampledWavelengths::default();
        let origin = Vector3f::new(0.0, 0.0, 5.0);
        let (ds, weight) = scene.sample_emitter_direction(&origin, &Vector2f::new(0.25, 0.5), &wl);
        assert!(ds.pdf > 0.0);
        assert!(!weight.is_black());
        let pdf = scene.pdf_emitter_direction(&origin, &ds);
        assert!((pdf - ds.pdf).abs() / ds.pdf < 1e-3);
    }
}
