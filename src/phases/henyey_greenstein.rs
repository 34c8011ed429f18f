// Copyright @yucwang 2026

use crate::core::medium::MediumInteraction;
use crate::core::phase::{PhaseFunction, PhaseFunctionContext};
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::frame::Frame;
use crate::math::warp::{henyey_greenstein, sample_henyey_greenstein};

/// Henyey-Greenstein phase function with asymmetry `g` in `(-1, 1)`.
#[derive(Debug, Clone, Copy)]
pub struct HenyeyGreensteinPhase {
    g: Float,
}

impl HenyeyGreensteinPhase {
    pub fn new(g: Float) -> Self {
        Self { g: g.max(-0.999).min(0.999) }
    }

    pub fn g(&self) -> Float {
        self.g
    }
}

impl PhaseFunction for HenyeyGreensteinPhase {
    fn sample(&self, _ctx: &PhaseFunctionContext, mi: &MediumInteraction,
              _sample1: Float, sample2: &Vector2f) -> Option<(Vector3f, Float, Float)> {
        let frame = Frame::from_normal(&(-mi.wi));
        let wo = frame.to_world(&sample_henyey_greenstein(sample2, self.g));
        let pdf = henyey_greenstein(wo.dot(&(-mi.wi)), self.g);
        if pdf <= 0.0 {
            return None;
        }
        // Sampling is exact, so value and pdf cancel.
        Some((wo, 1.0, pdf))
    }

    fn eval(&self, _ctx: &PhaseFunctionContext, mi: &MediumInteraction, wo: &Vector3f) -> (Float, Float) {
        let value = henyey_greenstein(wo.dot(&(-mi.wi)), self.g);
        (value, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::medium::Medium;
    use crate::media::homogeneous_medium::HomogeneousMedium;
    use crate::math::ray::Ray3f;
    use crate::math::spectrum::SpectrumCurve;
    use std::sync::Arc;

    fn interaction(dir: Vector3f) -> MediumInteraction {
        let medium: Arc<dyn Medium> = Arc::new(HomogeneousMedium::new(SpectrumCurve::uniform(1.0),
                                                                      SpectrumCurve::uniform(1.0)));
        MediumInteraction::new(medium, &Ray3f::new(Vector3f::zeros(), dir, None, None))
    }

    #[test]
    fn test_forward_scattering_prefers_ray_direction() {
        let phase = HenyeyGreensteinPhase::new(0.8);
        let ctx = PhaseFunctionContext::default();
        let mi = interaction(Vector3f::new(0.0, 1.0, 0.0));
        let (forward, _) = phase.eval(&ctx, &mi, &Vector3f::new(0.0, 1.0, 0.0));
        let (backward, _) = phase.eval(&ctx, &mi, &Vector3f::new(0.0, -1.0, 0.0));
        assert!(forward > 10.0 * backward);

        let mut mean_cos = 0.0;
        let n = 64;
        for i in 0..n {
            for j in 0..n {
                let u = Vector2f::new((i as Float + 0.5) / n as Float, (j as Float + 0.5) / n as Float);
                let (wo, weight, pdf) = phase.sample(&ctx, &mi, 0.5, &u).unwrap();
                assert!((weight - 1.0).abs() < 1e-6);
                assert!((phase.eval(&ctx, &mi, &wo).1 - pdf).abs() < 1e-3 * pdf.max(1.0));
                mean_cos += wo.y;
            }
        }
        mean_cos /= (n * n) as Float;
        assert!((mean_cos - 0.8).abs() < 0.02);
    }
}
