// Copyright @yucwang 2026

use std::collections::BTreeMap;
use std::sync::Arc;

use volpath::core::integrator::Integrator;
use volpath::core::medium::Medium;
use volpath::core::rng::LcgRng;
use volpath::core::scene::{Scene, SceneObject};
use volpath::core::volume::Volume;
use volpath::emitters::constant::ConstantEmitter;
use volpath::emitters::directional::DirectionalEmitter;
use volpath::integrators::volpath::{mis_weight, IntegratorConfig, VolumetricPathIntegrator};
use volpath::materials::diffuse::DiffuseBSDF;
use volpath::materials::null::NullBSDF;
use volpath::math::aabb::AABB;
use volpath::math::constants::{Float, Vector3f};
use volpath::math::ray::Ray3f;
use volpath::math::spectrum::{SampledWavelengths, SpectrumCurve};
use volpath::math::transform::Transform;
use volpath::media::free_flight::FreeFlightSampler;
use volpath::media::heterogeneous_medium::HeterogeneousMedium;
use volpath::media::homogeneous_medium::HomogeneousMedium;
use volpath::media::spectral_medium::SpectralMedium;
use volpath::shapes::cube::Cube;
use volpath::shapes::rectangle::Rectangle;
use volpath::volumes::const_volume::ConstantVolume;
use volpath::volumes::grid_volume::GridVolume;

fn unit_slab() -> AABB {
    AABB::new(Vector3f::new(-1.0, -1.0, 0.0), Vector3f::new(1.0, 1.0, 1.0))
}

fn scene_with_box(medium: Arc<dyn Medium>, bbox: &AABB, sky: Float) -> Scene {
    let mut scene = Scene::new();
    let boundary = Cube::from_box(bbox, Some("boundary".to_string()));
    scene.add_object(SceneObject::new(Arc::new(boundary), Arc::new(NullBSDF::new()))
        .with_interior_medium(Some(medium)));
    scene.add_emitter(Arc::new(ConstantEmitter::new(SpectrumCurve::uniform(sky))));
    scene
}

fn down_ray() -> Ray3f {
    Ray3f::new(Vector3f::new(0.0, 0.0, 5.0), Vector3f::new(0.0, 0.0, -1.0), None, None)
}

fn mean_radiance(integrator: &dyn Integrator, scene: &Scene, ray: &Ray3f, samples: usize, seed: u64) -> Float {
    let mut rng = LcgRng::new(seed);
    let mut sum = 0.0;
    for _ in 0..samples {
        let (radiance, _) = integrator.sample(scene, ray, None, &mut rng);
        sum += radiance[0];
    }
    sum / samples as Float
}

#[test]
fn test_absorbing_slab_attenuates_by_beer_lambert() {
    let bbox = unit_slab();
    let medium = HomogeneousMedium::new(SpectrumCurve::uniform(1.0), SpectrumCurve::uniform(0.0))
        .with_bbox(Some(bbox))
        .unwrap();
    let scene = scene_with_box(Arc::new(medium), &bbox, 1.0);
    let integrator = VolumetricPathIntegrator::new(IntegratorConfig::default(), 1);

    let estimate = mean_radiance(&integrator, &scene, &down_ray(), 20000, 3);
    let expected = (-1.0 as Float).exp();
    assert!((estimate - expected).abs() < 0.02, "estimate {} expected {}", estimate, expected);
}

#[test]
fn test_pure_null_medium_passes_light_through() {
    let bbox = unit_slab();
    let density: Arc<dyn Volume> = Arc::new(ConstantVolume::new_scalar(0.0).with_bbox(Some(bbox)));
    let medium = HeterogeneousMedium::new(density, Arc::new(ConstantVolume::new_scalar(1.0))).unwrap();
    let scene = scene_with_box(Arc::new(medium), &bbox, 0.75);
    let integrator = VolumetricPathIntegrator::new(IntegratorConfig::new(Some(1), 5, false).unwrap(), 1);

    let mut rng = LcgRng::new(11);
    for _ in 0..64 {
        let (radiance, valid) = integrator.sample(&scene, &down_ray(), None, &mut rng);
        assert!(valid);
        assert!((radiance[0] - 0.75).abs() < 1e-5, "radiance {}", radiance[0]);
    }
}

#[test]
fn test_white_furnace_keeps_energy() {
    // Non-absorbing medium under a uniform sky: every path escapes with
    // unit radiance, so NEE and phase sampling must share it exactly.
    let bbox = unit_slab();
    let medium = HomogeneousMedium::new(SpectrumCurve::uniform(1.5), SpectrumCurve::uniform(1.0))
        .with_bbox(Some(bbox))
        .unwrap();
    let scene = scene_with_box(Arc::new(medium), &bbox, 1.0);
    let integrator = VolumetricPathIntegrator::new(IntegratorConfig::default(), 1);

    let estimate = mean_radiance(&integrator, &scene, &down_ray(), 8000, 5);
    assert!((estimate - 1.0).abs() < 0.06, "estimate {}", estimate);
}

#[test]
fn test_emissive_slab_glows_by_collision_probability() {
    // Purely absorbing and emitting: every real collision contributes Le.
    let bbox = unit_slab();
    let medium = HomogeneousMedium::new(SpectrumCurve::uniform(1.0), SpectrumCurve::uniform(0.0))
        .with_emission(SpectrumCurve::uniform(1.0))
        .with_bbox(Some(bbox))
        .unwrap();
    let scene = scene_with_box(Arc::new(medium), &bbox, 0.0);
    let integrator = VolumetricPathIntegrator::new(IntegratorConfig::default(), 1);

    let estimate = mean_radiance(&integrator, &scene, &down_ray(), 20000, 29);
    let expected = 1.0 - (-1.0 as Float).exp();
    assert!((estimate - expected).abs() < 0.015, "estimate {} expected {}", estimate, expected);
}

#[test]
fn test_ground_shadowed_by_absorbing_slab() {
    // The camera looks at the ground from below the slab, so only the
    // light sample crosses the medium.
    let bbox = AABB::new(Vector3f::new(-1.0, -1.0, 1.0), Vector3f::new(1.0, 1.0, 2.0));
    let medium = HomogeneousMedium::new(SpectrumCurve::uniform(1.0), SpectrumCurve::uniform(0.0))
        .with_bbox(Some(bbox))
        .unwrap();
    let mut scene = Scene::new();
    let boundary = Cube::from_box(&bbox, Some("slab".to_string()));
    scene.add_object(SceneObject::new(Arc::new(boundary), Arc::new(NullBSDF::new()))
        .with_interior_medium(Some(Arc::new(medium))));
    let ground = Rectangle::new(Transform::scale(Vector3f::new(10.0, 10.0, 1.0)), None);
    scene.add_object(SceneObject::new(Arc::new(ground), Arc::new(DiffuseBSDF::new(SpectrumCurve::uniform(0.5)))));
    scene.add_emitter(Arc::new(DirectionalEmitter::new(Vector3f::new(0.0, 0.0, -1.0), SpectrumCurve::uniform(2.0))));

    let integrator = VolumetricPathIntegrator::new(IntegratorConfig::new(Some(2), 5, false).unwrap(), 1);
    let ray = Ray3f::new(Vector3f::new(4.0, 0.0, 0.5), Vector3f::new(-4.0, 0.0, -0.5), None, None);
    let estimate = mean_radiance(&integrator, &scene, &ray, 20000, 31);
    let expected = 0.5 * 2.0 / std::f32::consts::PI * (-1.0 as Float).exp();
    assert!((estimate - expected).abs() < 0.005, "estimate {} expected {}", estimate, expected);
}

#[test]
fn test_mis_weights_form_a_partition() {
    for &(a, b) in [(0.25, 4.0), (1e-3, 1e3), (7.0, 7.0)].iter() {
        let sum = mis_weight(a, b) + mis_weight(b, a);
        assert!((sum - 1.0).abs() < 1e-6);
    }
}

fn cloud_volume(bbox: &AABB) -> GridVolume {
    let res = 8;
    let mut data = Vec::with_capacity(res * res * res);
    for z in 0..res {
        for y in 0..res {
            for x in 0..res {
                data.push(((x * 7 + y * 3 + z * 5) % 11) as Float / 10.0);
            }
        }
    }
    GridVolume::from_data([res, res, res], 1, data, *bbox).unwrap()
}

#[test]
fn test_cloud_over_ground_is_non_negative() {
    let bbox = AABB::new(Vector3f::new(-1.0, -1.0, 0.5), Vector3f::new(1.0, 1.0, 2.0));
    let medium = HeterogeneousMedium::new(Arc::new(cloud_volume(&bbox)), Arc::new(ConstantVolume::new_scalar(0.8)))
        .unwrap()
        .with_scale(4.0)
        .unwrap()
        .with_supergrid(Some(2));
    let mut scene = scene_with_box(Arc::new(medium), &bbox, 0.5);
    let ground = Rectangle::new(Transform::scale(Vector3f::new(5.0, 5.0, 1.0)), None);
    scene.add_object(SceneObject::new(Arc::new(ground), Arc::new(DiffuseBSDF::new(SpectrumCurve::uniform(0.4)))));
    scene.add_emitter(Arc::new(DirectionalEmitter::new(Vector3f::new(0.3, -0.2, -1.0), SpectrumCurve::uniform(2.0))));

    let integrator = VolumetricPathIntegrator::new(IntegratorConfig::default(), 1);
    let mut rng = LcgRng::new(17);
    for i in 0..2000 {
        let x = -1.5 + 3.0 * (i % 40) as Float / 40.0;
        let wavelengths = SampledWavelengths::sample_visible(rng.next_1d());
        let ray = Ray3f::new(Vector3f::new(x, -4.0, 1.2), Vector3f::new(-0.1 * x, 1.0, -0.2), None, None)
            .with_wavelengths(wavelengths);
        let (radiance, _) = integrator.sample(&scene, &ray, None, &mut rng);
        for lane in radiance.values().iter() {
            assert!(lane.is_finite() && *lane >= 0.0, "radiance {}", radiance);
        }
    }
}

#[test]
fn test_spectral_mixture_transmittance() {
    // Two compounds in a 3:1 mix, both flat in wavelength.
    let bbox = unit_slab();
    let proportions = ConstantVolume::new_channels(vec![0.75, 0.25]).with_bbox(Some(bbox));
    let mut spectra = BTreeMap::new();
    spectra.insert("sigma_t_fog".to_string(), SpectrumCurve::uniform(2.0));
    spectra.insert("albedo_fog".to_string(), SpectrumCurve::uniform(0.9));
    spectra.insert("sigma_t_soot".to_string(), SpectrumCurve::uniform(4.0));
    spectra.insert("albedo_soot".to_string(), SpectrumCurve::uniform(0.1));
    let medium: Arc<dyn Medium> = Arc::new(SpectralMedium::new(Arc::new(proportions), spectra).unwrap());

    let sampler = FreeFlightSampler::default();
    let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 2.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
    let mut rng = LcgRng::new(23);
    let n = 20000;
    let mut sum = 0.0;
    for _ in 0..n {
        sum += sampler.eval_transmittance(&ray, &medium, Float::INFINITY, &mut rng)[0];
    }
    let expected = (-(0.75 * 2.0 + 0.25 * 4.0) as Float).exp();
    assert!((sum / n as Float - expected).abs() < 0.01, "estimate {} expected {}", sum / n as Float, expected);
}
