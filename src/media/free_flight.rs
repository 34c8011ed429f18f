// Copyright @yucwang 2026

use crate::core::medium::{Medium, MediumInteraction};
use crate::core::rng::LcgRng;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;
use crate::math::spectrum::SampledSpectrum;
use crate::volumes::majorant_grid::MajorantSegment;
use std::sync::Arc;

pub const MAX_NULL_COLLISIONS: usize = 1 << 16;

/// Outcome of one free-flight draw.
pub enum FreeFlightEvent {
    /// A real collision at `mi.p`, coefficients already filled in.
    Real(MediumInteraction),
    /// The flight left the medium or reached the surface at `t_max`.
    Escaped,
    /// NaN or runaway tracking; the path ends here.
    Terminated,
}

impl FreeFlightEvent {
    pub fn is_real(&self) -> bool {
        matches!(self, FreeFlightEvent::Real(_))
    }
}

enum Step {
    Continue,
    Stop,
    Abort,
}

enum WalkEnd {
    Stopped,
    Escaped,
    Terminated,
}

/// Null-collision tracking against a global or supergrid majorant.
#[derive(Debug, Clone, Copy)]
pub struct FreeFlightSampler {
    max_null_collisions: usize,
}

impl Default for FreeFlightSampler {
    fn default() -> Self {
        Self { max_null_collisions: MAX_NULL_COLLISIONS }
    }
}

fn sample_optical_depth(rng: &mut LcgRng) -> Float {
    -(1.0 - rng.next_1d()).ln()
}

impl FreeFlightSampler {
    pub fn new(max_null_collisions: usize) -> Self {
        Self { max_null_collisions: max_null_collisions.max(1) }
    }

    /// Parametric interval of `ray` inside `medium`, cut at `t_max`.
    fn clip(ray: &Ray3f, medium: &dyn Medium, t_max: Float) -> Option<(Float, Float)> {
        let (t0, t1) = medium.intersect_aabb(ray)?;
        let t0 = t0.max(ray.min_t);
        let t1 = t1.min(t_max);
        if t0 < t1 {
            Some((t0, t1))
        } else {
            None
        }
    }

    /// Spends the optical depth `tau` over `[t_start, t_end)` at constant
    /// majorant `mu`. Returns `None` once the stretch is used up.
    fn track<F>(&self, t_start: Float, t_end: Float, mu: Float, tau: &mut Float, collisions: &mut usize,
                rng: &mut LcgRng, visit: &mut F) -> Option<WalkEnd>
        where F: FnMut(Float, Float, &mut LcgRng) -> Step {
        let mut t = t_start;
        loop {
            let remaining = mu * (t_end - t).max(0.0);
            if !(remaining > *tau) {
                *tau -= remaining;
                return None;
            }
            t += *tau / mu;
            *collisions += 1;
            if t.is_nan() || *collisions > self.max_null_collisions {
                return Some(WalkEnd::Terminated);
            }
            match visit(t, mu, rng) {
                Step::Continue => {}
                Step::Stop => return Some(WalkEnd::Stopped),
                Step::Abort => return Some(WalkEnd::Terminated),
            }
            *tau = sample_optical_depth(rng);
        }
    }

    /// Feeds tentative collisions in `[t0, t1)` to `visit` as `(t, majorant)`.
    fn walk<F>(&self, ray: &Ray3f, medium: &dyn Medium, t0: Float, t1: Float,
               rng: &mut LcgRng, mut visit: F) -> WalkEnd
        where F: FnMut(Float, Float, &mut LcgRng) -> Step {
        let mut collisions = 0usize;

        if let Some(grid) = medium.majorant_grid() {
            // The medium box can reach past a transformed grid; stretches the
            // DDA does not cover are bounded by the largest cell.
            let end_marker = MajorantSegment { t_min: t1, t_max: t1, majorant: 0.0 };
            let mut gap_majorant = None;
            let mut tau = sample_optical_depth(rng);
            let mut cursor = t0;
            for segment in grid.traverse(ray, t0, t1).chain(std::iter::once(end_marker)) {
                if segment.t_min > cursor {
                    let mu = *gap_majorant.get_or_insert_with(|| grid.max_value());
                    if let Some(end) = self.track(cursor, segment.t_min, mu, &mut tau, &mut collisions,
                                                  rng, &mut visit) {
                        return end;
                    }
                }
                if let Some(end) = self.track(segment.t_min, segment.t_max, segment.majorant, &mut tau,
                                              &mut collisions, rng, &mut visit) {
                    return end;
                }
                cursor = cursor.max(segment.t_max);
            }
            return WalkEnd::Escaped;
        }

        let mu = medium.get_majorant(&ray.at(t0), ray.wavelengths()).max_value();
        if mu.is_nan() {
            return WalkEnd::Terminated;
        }
        if !(mu > 0.0) {
            return WalkEnd::Escaped;
        }
        let mut t = t0;
        loop {
            t += sample_optical_depth(rng) / mu;
            if t.is_nan() {
                return WalkEnd::Terminated;
            }
            if t >= t1 {
                return WalkEnd::Escaped;
            }
            collisions += 1;
            if collisions > self.max_null_collisions {
                log::debug!("free flight exceeded {} null collisions", self.max_null_collisions);
                return WalkEnd::Terminated;
            }
            match visit(t, mu, rng) {
                Step::Continue => {}
                Step::Stop => return WalkEnd::Stopped,
                Step::Abort => return WalkEnd::Terminated,
            }
        }
    }

    /// Samples the next real collision along `ray` before `t_max`. The
    /// returned spectrum is the product of the null-collision weights and
    /// multiplies the path throughput whatever the event.
    pub fn sample_interaction(&self, ray: &Ray3f, medium: &Arc<dyn Medium>, t_max: Float,
                              rng: &mut LcgRng) -> (FreeFlightEvent, SampledSpectrum) {
        let mut weight = SampledSpectrum::one();
        let (t0, t1) = match Self::clip(ray, medium.as_ref(), t_max) {
            Some(range) => range,
            None => return (FreeFlightEvent::Escaped, weight),
        };

        let mut mi = MediumInteraction::new(medium.clone(), ray);
        let end = self.walk(ray, medium.as_ref(), t0, t1, rng, |t, mu, rng| {
            mi.move_to(ray, t);
            mi.combined_extinction = SampledSpectrum::splat(mu);
            let (sigma_s, sigma_n, sigma_t) = medium.get_scattering_coefficients(&mi);
            if sigma_t.has_nan() || sigma_s.has_nan() {
                log::trace!("NaN medium coefficients at {:?}", mi.p);
                return Step::Abort;
            }
            mi.sigma_s = sigma_s;
            mi.sigma_n = sigma_n;
            mi.sigma_t = sigma_t;

            if rng.next_1d() < sigma_t.average() / mu {
                return Step::Stop;
            }
            let mean_null = sigma_n.average();
            if !(mean_null > 0.0) {
                return Step::Abort;
            }
            weight *= sigma_n / mean_null;
            Step::Continue
        });

        match end {
            WalkEnd::Stopped => {
                if medium.has_emission() {
                    mi.radiance = medium.get_emission(&mi);
                }
                (FreeFlightEvent::Real(mi), weight)
            }
            WalkEnd::Escaped => (FreeFlightEvent::Escaped, weight),
            WalkEnd::Terminated => (FreeFlightEvent::Terminated, SampledSpectrum::zero()),
        }
    }

    /// Ratio-tracking estimate of the transmittance along `ray` up to `t_max`.
    pub fn eval_transmittance(&self, ray: &Ray3f, medium: &Arc<dyn Medium>, t_max: Float,
                              rng: &mut LcgRng) -> SampledSpectrum {
        let (t0, t1) = match Self::clip(ray, medium.as_ref(), t_max) {
            Some(range) => range,
            None => return SampledSpectrum::one(),
        };

        let mut transmittance = SampledSpectrum::one();
        let mut mi = MediumInteraction::new(medium.clone(), ray);
        let end = self.walk(ray, medium.as_ref(), t0, t1, rng, |t, mu, _rng| {
            mi.move_to(ray, t);
            mi.combined_extinction = SampledSpectrum::splat(mu);
            let (_, sigma_n, sigma_t) = medium.get_scattering_coefficients(&mi);
            if sigma_t.has_nan() {
                return Step::Abort;
            }
            transmittance *= sigma_n / mu;
            if transmittance.is_black() {
                Step::Stop
            } else {
                Step::Continue
            }
        });

        match end {
            WalkEnd::Terminated => SampledSpectrum::zero(),
            _ => transmittance,
        }
    }
}
