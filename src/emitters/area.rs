// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::emitter::{DirectionSample, Emitter, EmitterFlag};
use crate::core::interaction::SurfaceInteraction;
use crate::core::shape::Shape;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::spectrum::{SampledSpectrum, SampledWavelengths, SpectrumCurve};
use std::sync::Arc;

/// One-sided diffuse emitter attached to a shape; it radiates into the
/// hemisphere its normal points to.
pub struct AreaEmitter {
    id: String,
    shape: Arc<dyn Shape>,
    radiance: SpectrumCurve,
}

impl AreaEmitter {
    pub fn new(shape: Arc<dyn Shape>, radiance: SpectrumCurve) -> Self {
        Self { id: generate_node_id("AreaEmitter"), shape, radiance }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }
}

impl ComputationNode for AreaEmitter {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("AreaEmitter [id={}, shape={}]", self.id, self.shape.id())
    }
}

impl Emitter for AreaEmitter {
    fn get_flag(&self) -> EmitterFlag {
        EmitterFlag::SURFACE
    }

    fn sample_direction(&self, ref_p: &Vector3f, u: &Vector2f,
                        wavelengths: &SampledWavelengths) -> (DirectionSample, SampledSpectrum) {
        let ps = self.shape.sample(u);
        let to_light = ps.p - ref_p;
        let dist = to_light.norm();
        if dist <= 0.0 || ps.pdf <= 0.0 {
            return (DirectionSample::invalid(), SampledSpectrum::zero());
        }
        let d = to_light / dist;
        let cos_light = ps.n.dot(&(-d));
        if cos_light <= 0.0 {
            return (DirectionSample::invalid(), SampledSpectrum::zero());
        }

        let pdf = ps.pdf * dist * dist / cos_light;
        let ds = DirectionSample {
            p: ps.p,
            n: ps.n,
            d,
            dist,
            pdf,
            delta: false,
            emitter: None,
        };
        (ds, self.radiance.eval_spectrum(wavelengths) / pdf)
    }

    fn pdf_direction(&self, _ref_p: &Vector3f, ds: &DirectionSample) -> Float {
        let cos_light = ds.n.dot(&(-ds.d));
        let area = self.shape.surface_area();
        if cos_light <= 0.0 || area <= 0.0 {
            return 0.0;
        }
        ds.dist * ds.dist / (cos_light * area)
    }

    fn eval(&self, si: &SurfaceInteraction) -> SampledSpectrum {
        if si.wi.z > 0.0 {
            self.radiance.eval_spectrum(&si.wavelengths)
        } else {
            SampledSpectrum::zero()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ray::Ray3f;
    use crate::math::transform::Transform;
    use crate::shapes::rectangle::Rectangle;

    #[test]
    fn test_sampled_pdf_matches_hit_pdf() {
        let shape: Arc<dyn Shape> = Arc::new(Rectangle::new(Transform::translate(Vector3f::new(0.0, 0.0, 2.0)), None));
        let light = AreaEmitter::new(shape.clone(), SpectrumCurve::uniform(3.0));
        let ref_p = Vector3f::new(0.2, -0.1, 4.0);
        let wl = SampledWavelengths::default();
        let (ds, weight) = light.sample_direction(&ref_p, &Vector2f::new(0.3, 0.6), &wl);
        assert!(ds.pdf > 0.0);
        assert!((weight[0] * ds.pdf - 3.0).abs() < 1e-4);

        let ray = Ray3f::new(ref_p, ds.d, None, None);
        let si = shape.ray_intersection(&ray).unwrap().with_ray(&ray);
        let hit = DirectionSample::from_hit(&ref_p, &si);
        assert!((light.pdf_direction(&ref_p, &hit) - ds.pdf).abs() / ds.pdf < 1e-3);
        assert!((light.eval(&si)[0] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_back_side_is_dark() {
        let shape: Arc<dyn Shape> = Arc::new(Rectangle::new(Transform::default(), None));
        let light = AreaEmitter::new(shape, SpectrumCurve::uniform(1.0));
        let (ds, weight) = light.sample_direction(&Vector3f::new(0.0, 0.0, -1.0), &Vector2f::new(0.5, 0.5),
                                                  &SampledWavelengths::default());
        assert_eq!(ds.pdf, 0.0);
        assert!(weight.is_black());
    }
}
