// Copyright @yucwang 2026

use crate::core::bsdf::{BSDFContext, BSDFFlags, BSDF};
use crate::core::emitter::DirectionSample;
use crate::core::error::ConfigError;
use crate::core::integrator::Integrator;
use crate::core::interaction::SurfaceInteraction;
use crate::core::medium::{Medium, MediumInteraction};
use crate::core::phase::PhaseFunctionContext;
use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::math::constants::{Float, Vector3f, SHADOW_EPSILON};
use crate::math::ray::Ray3f;
use crate::math::spectrum::SampledSpectrum;
use crate::media::free_flight::{FreeFlightEvent, FreeFlightSampler};
use std::sync::Arc;

const MAX_SHADOW_STEPS: usize = 64;
const MAX_PATH_ITERATIONS: usize = 4096;
const MAX_RR_PROBABILITY: Float = 0.95;

/// Depth limits of the random walk. `max_depth = None` never stops on
/// depth; Russian roulette starts at `rr_depth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegratorConfig {
    pub max_depth: Option<u32>,
    pub rr_depth: u32,
    pub hide_emitters: bool,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self { max_depth: None, rr_depth: 5, hide_emitters: false }
    }
}

impl IntegratorConfig {
    pub fn new(max_depth: Option<u32>, rr_depth: u32, hide_emitters: bool) -> Result<Self, ConfigError> {
        if max_depth == Some(0) {
            return Err(ConfigError::invalid_parameter("max_depth", "must be positive, or unbounded"));
        }
        if rr_depth == 0 {
            return Err(ConfigError::invalid_parameter("rr_depth", "must be positive"));
        }
        Ok(Self { max_depth, rr_depth, hide_emitters })
    }

    fn below_max(&self, depth: u32) -> bool {
        self.max_depth.map_or(true, |max_depth| depth < max_depth)
    }
}

/// Balance heuristic for the strategy with density `pdf_a`.
pub fn mis_weight(pdf_a: Float, pdf_b: Float) -> Float {
    let sum = pdf_a + pdf_b;
    if sum > 0.0 {
        pdf_a / sum
    } else {
        0.0
    }
}

/// Everything a path carries from one vertex to the next.
pub struct PathState {
    pub throughput: SampledSpectrum,
    pub eta: Float,
    /// Real scattering events so far; null crossings do not count.
    pub depth: u32,
    pub medium: Option<Arc<dyn Medium>>,
    /// The last real vertex sampled a delta lobe (or there is none yet), so
    /// emitter hits are added unweighted.
    pub specular_chain: bool,
    pub valid_ray: bool,
    /// Last scattering vertex and the density of the direction sampled there.
    pub prev_p: Vector3f,
    pub prev_pdf: Float,
}

impl PathState {
    pub fn new(origin: Vector3f, medium: Option<Arc<dyn Medium>>, valid_ray: bool) -> Self {
        Self {
            throughput: SampledSpectrum::one(),
            eta: 1.0,
            depth: 0,
            medium,
            specular_chain: true,
            valid_ray,
            prev_p: origin,
            prev_pdf: 1.0,
        }
    }
}

/// Unidirectional volumetric path tracer over null-collision media.
pub struct VolumetricPathIntegrator {
    config: IntegratorConfig,
    samples_per_pixel: u32,
    sampler: FreeFlightSampler,
}

impl VolumetricPathIntegrator {
    pub fn new(config: IntegratorConfig, samples_per_pixel: u32) -> Self {
        Self {
            config,
            samples_per_pixel: samples_per_pixel.max(1),
            sampler: FreeFlightSampler::default(),
        }
    }

    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    /// Weight of emission found by following the sampled direction.
    fn emitter_hit_weight(&self, scene: &Scene, state: &PathState, ds: &DirectionSample) -> Float {
        if state.specular_chain {
            return 1.0;
        }
        mis_weight(state.prev_pdf, scene.pdf_emitter_direction(&state.prev_p, ds))
    }

    fn emitters_visible(&self, state: &PathState) -> bool {
        !(state.depth == 0 && self.config.hide_emitters) && self.config.below_max(state.depth)
    }

    /// Transmittance along a shadow segment. Null interfaces are crossed and
    /// switch the medium; any other surface blocks.
    fn shadow_transmittance(&self, scene: &Scene, mut ray: Ray3f, mut medium: Option<Arc<dyn Medium>>,
                            rng: &mut LcgRng) -> SampledSpectrum {
        let mut transmittance = SampledSpectrum::one();
        for _ in 0..MAX_SHADOW_STEPS {
            if medium.is_none() && !scene.ray_test(&ray) {
                return transmittance;
            }

            let si = scene.ray_intersect(&ray);
            let segment_end = si.as_ref().map_or(ray.max_t, |si| si.t);
            if let Some(m) = &medium {
                transmittance *= self.sampler.eval_transmittance(&ray, m, segment_end, rng);
                if transmittance.is_black() {
                    return SampledSpectrum::zero();
                }
            }

            let si = match si {
                Some(si) => si,
                None => return transmittance,
            };
            if !si.bsdf.as_ref().map_or(false, |bsdf| bsdf.is_null()) {
                return SampledSpectrum::zero();
            }
            medium = si.target_medium(&ray.dir());
            let remaining = ray.max_t - si.t;
            let mut next = si.spawn_ray(&ray, &ray.dir());
            next.max_t = remaining;
            ray = next;
        }
        log::trace!("shadow ray crossed more than {} interfaces", MAX_SHADOW_STEPS);
        SampledSpectrum::zero()
    }

    fn shadow_ray(parent: &Ray3f, origin: Vector3f, ds: &DirectionSample) -> Ray3f {
        if ds.dist.is_finite() {
            parent.spawn(origin, ds.d, Some(0.0), Some(ds.dist * (1.0 - SHADOW_EPSILON)))
        } else {
            parent.spawn(origin, ds.d, Some(0.0), None)
        }
    }

    /// Next-event estimate at a real medium collision.
    fn sample_emitter_medium(&self, scene: &Scene, ray: &Ray3f, mi: &MediumInteraction,
                             rng: &mut LcgRng) -> SampledSpectrum {
        let (ds, emitter_weight) = scene.sample_emitter_direction(&mi.p, &rng.next_2d(), &mi.wavelengths);
        if ds.pdf <= 0.0 || emitter_weight.is_black() {
            return SampledSpectrum::zero();
        }

        let phase = mi.medium.phase_function();
        let (value, phase_pdf) = phase.eval(&PhaseFunctionContext::default(), mi, &ds.d);
        if value <= 0.0 {
            return SampledSpectrum::zero();
        }

        let shadow = Self::shadow_ray(ray, mi.p, &ds);
        let transmittance = self.shadow_transmittance(scene, shadow, Some(mi.medium.clone()), rng);
        let weight = if ds.delta { 1.0 } else { mis_weight(ds.pdf, phase_pdf) };
        emitter_weight * transmittance * (value * weight)
    }

    /// Next-event estimate at a surface with a smooth lobe.
    fn sample_emitter_surface(&self, scene: &Scene, ray: &Ray3f, si: &SurfaceInteraction, bsdf: &dyn BSDF,
                              medium: &Option<Arc<dyn Medium>>, rng: &mut LcgRng) -> SampledSpectrum {
        let (ds, emitter_weight) = scene.sample_emitter_direction(&si.p, &rng.next_2d(), &si.wavelengths);
        if ds.pdf <= 0.0 || emitter_weight.is_black() {
            return SampledSpectrum::zero();
        }

        let ctx = BSDFContext::default();
        let wo = si.to_local(&ds.d);
        let value = bsdf.eval(&ctx, si, &wo);
        if value.is_black() {
            return SampledSpectrum::zero();
        }

        let shadow = if ds.dist.is_finite() {
            si.spawn_ray_to(ray, &ds.p)
        } else {
            si.spawn_ray(ray, &ds.d)
        };
        let same_side = ds.d.dot(&si.n) * si.wi_world().dot(&si.n) > 0.0;
        let shadow_medium = if same_side { medium.clone() } else { si.target_medium(&ds.d) };
        let transmittance = self.shadow_transmittance(scene, shadow, shadow_medium, rng);
        let weight = if ds.delta { 1.0 } else { mis_weight(ds.pdf, bsdf.pdf(&ctx, si, &wo)) };
        emitter_weight * transmittance * value * weight
    }

    fn russian_roulette(&self, state: &mut PathState, rng: &mut LcgRng) -> bool {
        if state.depth < self.config.rr_depth {
            return true;
        }
        let q = (state.throughput.max_value() * state.eta * state.eta).min(MAX_RR_PROBABILITY);
        if !(q > 0.0) || rng.next_1d() >= q {
            return false;
        }
        state.throughput /= q;
        true
    }
}

impl Integrator for VolumetricPathIntegrator {
    fn sample(&self, scene: &Scene, ray: &Ray3f, medium: Option<Arc<dyn Medium>>,
              rng: &mut LcgRng) -> (SampledSpectrum, bool) {
        let wavelengths = *ray.wavelengths();
        let mut ray = *ray;
        let mut radiance = SampledSpectrum::zero();
        let valid_ray = !self.config.hide_emitters && scene.environment().is_some();
        let mut state = PathState::new(ray.origin(), medium, valid_ray);

        for _ in 0..MAX_PATH_ITERATIONS {
            if state.throughput.is_black() || state.throughput.has_nan() {
                break;
            }
            if !self.russian_roulette(&mut state, rng) {
                break;
            }

            let si = scene.ray_intersect(&ray);

            if let Some(medium) = state.medium.clone() {
                let t_max = si.as_ref().map_or(ray.max_t, |si| si.t);
                let (event, weight) = self.sampler.sample_interaction(&ray, &medium, t_max, rng);
                state.throughput *= weight;
                match event {
                    FreeFlightEvent::Terminated => break,
                    FreeFlightEvent::Escaped => {}
                    FreeFlightEvent::Real(mi) => {
                        if self.config.below_max(state.depth) && !mi.radiance.is_black() {
                            radiance += state.throughput * mi.emission_weight();
                        }
                        if !self.config.below_max(state.depth + 1) {
                            break;
                        }

                        state.throughput *= mi.scatter_weight();
                        state.depth += 1;
                        state.valid_ray = true;
                        state.specular_chain = false;
                        if state.throughput.is_black() {
                            break;
                        }

                        radiance += state.throughput * self.sample_emitter_medium(scene, &ray, &mi, rng);

                        let phase = medium.phase_function();
                        let sample1 = rng.next_1d();
                        let sample2 = rng.next_2d();
                        let (wo, phase_weight, pdf) =
                            match phase.sample(&PhaseFunctionContext::default(), &mi, sample1, &sample2) {
                                Some(sample) => sample,
                                None => break,
                            };
                        if pdf <= 0.0 {
                            break;
                        }
                        state.throughput *= phase_weight;
                        state.prev_p = mi.p;
                        state.prev_pdf = pdf;
                        ray = ray.spawn(mi.p, wo, None, None);
                        continue;
                    }
                }
            }

            let si = match si {
                Some(si) => si,
                None => {
                    if let Some(environment) = scene.environment() {
                        if self.emitters_visible(&state) {
                            let ds = DirectionSample::from_direction(&ray.dir(), environment.clone());
                            let weight = self.emitter_hit_weight(scene, &state, &ds);
                            radiance += state.throughput * environment.eval_direction(&ray.dir(), &wavelengths) * weight;
                        }
                    }
                    break;
                }
            };

            if let Some(emitter) = &si.emitter {
                if self.emitters_visible(&state) {
                    let ds = DirectionSample::from_hit(&state.prev_p, &si);
                    let weight = self.emitter_hit_weight(scene, &state, &ds);
                    radiance += state.throughput * emitter.eval(&si) * weight;
                }
            }

            let bsdf = match &si.bsdf {
                Some(bsdf) => bsdf.clone(),
                None => break,
            };
            if bsdf.is_null() {
                state.medium = si.target_medium(&ray.dir());
                ray = si.spawn_ray(&ray, &ray.dir());
                continue;
            }

            state.valid_ray = true;
            if !self.config.below_max(state.depth + 1) {
                break;
            }

            if bsdf.flags().has(BSDFFlags::SMOOTH) {
                radiance += state.throughput
                    * self.sample_emitter_surface(scene, &ray, &si, bsdf.as_ref(), &state.medium, rng);
            }

            let sample1 = rng.next_1d();
            let sample2 = rng.next_2d();
            let (bs, bsdf_weight) = bsdf.sample(&BSDFContext::default(), &si, sample1, &sample2);
            if bs.pdf <= 0.0 || bsdf_weight.is_black() {
                break;
            }
            let wo = si.to_world(&bs.wo);
            state.throughput *= bsdf_weight;

            if bs.sampled_type.has(BSDFFlags::NULL) {
                state.medium = si.target_medium(&wo);
                ray = si.spawn_ray(&ray, &wo);
                continue;
            }
            if bs.sampled_type.has(BSDFFlags::DELTA) {
                state.specular_chain = true;
            } else if bs.sampled_type.has(BSDFFlags::SMOOTH) {
                state.specular_chain = false;
            }
            state.depth += 1;
            state.eta *= bs.eta;
            state.prev_p = si.p;
            state.prev_pdf = bs.pdf;

            if wo.dot(&si.n) * si.wi_world().dot(&si.n) < 0.0 {
                state.medium = si.target_medium(&wo);
            }
            ray = si.spawn_ray(&ray, &wo);
        }

        if radiance.has_nan() {
            log::debug!("discarding NaN radiance sample");
            return (SampledSpectrum::zero(), state.valid_ray);
        }
        (radiance, state.valid_ray)
    }

    fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::SceneObject;
    use crate::core::shape::Shape;
    use crate::emitters::constant::ConstantEmitter;
    use crate::emitters::directional::DirectionalEmitter;
    use crate::materials::diffuse::DiffuseBSDF;
    use crate::materials::smooth_conductor::SmoothConductor;
    use crate::math::spectrum::SpectrumCurve;
    use crate::math::transform::Transform;
    use crate::shapes::rectangle::Rectangle;

    fn down_ray() -> Ray3f {
        Ray3f::new(Vector3f::new(0.0, 0.0, 5.0), Vector3f::new(0.0, 0.0, -1.0), None, None)
    }

    #[test]
    fn test_mis_weights_sum_to_one() {
        let pairs = [(0.3, 0.7), (5.0, 0.01), (1.0, 1.0), (0.0, 2.0)];
        for (a, b) in pairs.iter() {
            assert!((mis_weight(*a, *b) + mis_weight(*b, *a) - 1.0).abs() < 1e-6);
        }
        assert_eq!(mis_weight(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(IntegratorConfig::new(Some(0), 5, false).is_err());
        assert!(IntegratorConfig::new(Some(8), 0, false).is_err());
        let config = IntegratorConfig::new(None, 3, true).unwrap();
        assert!(config.below_max(1_000_000));
    }

    #[test]
    fn test_environment_only() {
        let mut scene = Scene::new();
        scene.add_emitter(Arc::new(ConstantEmitter::new(SpectrumCurve::uniform(0.7))));
        let integrator = VolumetricPathIntegrator::new(IntegratorConfig::default(), 1);
        let mut rng = LcgRng::new(1);
        let (radiance, valid) = integrator.sample(&scene, &down_ray(), None, &mut rng);
        assert!(valid);
        assert!((radiance[0] - 0.7).abs() < 1e-6);

        let hidden = VolumetricPathIntegrator::new(IntegratorConfig::new(None, 5, true).unwrap(), 1);
        let (radiance, valid) = hidden.sample(&scene, &down_ray(), None, &mut rng);
        assert!(!valid);
        assert!(radiance.is_black());
    }

    #[test]
    fn test_diffuse_plane_under_sun() {
        // Lambertian albedo 0.5 lit head-on by E = 2: radiance 0.5 * 2 / pi.
        let mut scene = Scene::new();
        let plane: Arc<dyn Shape> = Arc::new(Rectangle::new(Transform::scale(Vector3f::new(10.0, 10.0, 1.0)), None));
        scene.add_object(SceneObject::new(plane, Arc::new(DiffuseBSDF::new(SpectrumCurve::uniform(0.5)))));
        scene.add_emitter(Arc::new(DirectionalEmitter::new(Vector3f::new(0.0, 0.0, -1.0), SpectrumCurve::uniform(2.0))));

        let integrator = VolumetricPathIntegrator::new(IntegratorConfig::new(Some(2), 5, false).unwrap(), 1);
        let mut rng = LcgRng::new(4);
        let (radiance, valid) = integrator.sample(&scene, &down_ray(), None, &mut rng);
        assert!(valid);
        let expected = 0.5 * 2.0 * crate::math::constants::INV_PI;
        assert!((radiance[0] - expected).abs() < 1e-4, "radiance {}", radiance[0]);
    }

    #[test]
    fn test_mirror_keeps_specular_chain() {
        let mut scene = Scene::new();
        let mirror: Arc<dyn Shape> = Arc::new(Rectangle::new(Transform::scale(Vector3f::new(10.0, 10.0, 1.0)), None));
        scene.add_object(SceneObject::new(mirror, Arc::new(SmoothConductor::new(SpectrumCurve::uniform(0.8)))));
        scene.add_emitter(Arc::new(ConstantEmitter::new(SpectrumCurve::uniform(1.0))));

        let integrator = VolumetricPathIntegrator::new(IntegratorConfig::default(), 1);
        let mut rng = LcgRng::new(2);
        let (radiance, _) = integrator.sample(&scene, &down_ray(), None, &mut rng);
        assert!((radiance[0] - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_max_depth_one_sees_only_direct_emission() {
        let mut scene = Scene::new();
        let plane: Arc<dyn Shape> = Arc::new(Rectangle::new(Transform::scale(Vector3f::new(10.0, 10.0, 1.0)), None));
        scene.add_object(SceneObject::new(plane, Arc::new(DiffuseBSDF::new(SpectrumCurve::uniform(0.5)))));
        scene.add_emitter(Arc::new(ConstantEmitter::new(SpectrumCurve::uniform(1.0))));

        let integrator = VolumetricPathIntegrator::new(IntegratorConfig::new(Some(1), 5, false).unwrap(), 1);
        let mut rng = LcgRng::new(8);
        let (radiance, valid) = integrator.sample(&scene, &down_ray(), None, &mut rng);
        assert!(valid);
        assert!(radiance.is_black());
    }
}
