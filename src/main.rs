// Copyright 2020 TwoCookingMice

use volpath::core::error::ConfigError;
use volpath::core::medium::Medium;
use volpath::core::scene::{Scene, SceneObject};
use volpath::core::volume::Volume;
use volpath::emitters::constant::ConstantEmitter;
use volpath::emitters::directional::DirectionalEmitter;
use volpath::integrators::volpath::{IntegratorConfig, VolumetricPathIntegrator};
use volpath::io::exr_utils;
use volpath::materials::diffuse::DiffuseBSDF;
use volpath::materials::null::NullBSDF;
use volpath::math::aabb::AABB;
use volpath::math::constants::{Float, Vector3f};
use volpath::math::spectrum::SpectrumCurve;
use volpath::math::transform::Transform;
use volpath::media::activation::DensityActivation;
use volpath::media::heterogeneous_medium::HeterogeneousMedium;
use volpath::media::spectral_medium::SpectralMedium;
use volpath::phases::henyey_greenstein::HenyeyGreensteinPhase;
use volpath::renderers::simple::{Renderer, SimpleRenderer};
use volpath::sensors::perspective::PerspectiveCamera;
use volpath::shapes::cube::Cube;
use volpath::shapes::rectangle::Rectangle;
use volpath::volumes::const_volume::ConstantVolume;
use volpath::volumes::grid_volume::GridVolume;

use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;

const DEMO_RESOLUTION: usize = 48;

struct Options {
    output_path: String,
    spp: u32,
    max_depth: Option<u32>,
    rr_depth: u32,
    seed: u64,
    width: usize,
    height: usize,
    density_path: Option<String>,
    activation: DensityActivation,
    supergrid: Option<usize>,
    spectral: bool,
    hide_emitters: bool,
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> Result<T, ConfigError> {
    args.get(i)
        .and_then(|v| v.parse::<T>().ok())
        .ok_or_else(|| ConfigError::invalid_parameter(flag, "missing or malformed value"))
}

/// `name` or `name:param`, e.g. `softplus:-2.5`.
fn parse_activation(arg: &str) -> Result<DensityActivation, ConfigError> {
    let mut parts = arg.splitn(2, ':');
    let name = parts.next().unwrap_or("");
    let param = match parts.next() {
        Some(v) => Some(v.parse::<Float>()
            .map_err(|_| ConfigError::invalid_parameter("--activation", format!("bad parameter `{}`", v)))?),
        None => None,
    };
    DensityActivation::parse(name, param)
}

fn parse_options(args: &[String]) -> Result<Options, ConfigError> {
    let mut options = Options {
        output_path: args[1].clone(),
        spp: 16,
        max_depth: None,
        rr_depth: 5,
        seed: 0,
        width: 320,
        height: 240,
        density_path: None,
        activation: DensityActivation::None,
        supergrid: None,
        spectral: false,
        hide_emitters: false,
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--spp" => {
                i += 1;
                options.spp = parse_value(args, i, "--spp")?;
            }
            "--max-depth" => {
                i += 1;
                let depth: i64 = parse_value(args, i, "--max-depth")?;
                options.max_depth = if depth < 0 { None } else { Some(depth as u32) };
            }
            "--rr-depth" => {
                i += 1;
                options.rr_depth = parse_value(args, i, "--rr-depth")?;
            }
            "--seed" => {
                i += 1;
                options.seed = parse_value(args, i, "--seed")?;
            }
            "--width" => {
                i += 1;
                options.width = parse_value(args, i, "--width")?;
            }
            "--height" => {
                i += 1;
                options.height = parse_value(args, i, "--height")?;
            }
            "--density" => {
                i += 1;
                options.density_path = Some(parse_value(args, i, "--density")?);
            }
            "--activation" => {
                i += 1;
                let arg: String = parse_value(args, i, "--activation")?;
                options.activation = parse_activation(&arg)?;
            }
            "--supergrid" => {
                i += 1;
                options.supergrid = Some(parse_value(args, i, "--supergrid")?);
            }
            "--spectral" => options.spectral = true,
            "--hide-emitters" => options.hide_emitters = true,
            other => log::warn!("Ignoring unknown argument {}", other),
        }
        i += 1;
    }
    Ok(options)
}

/// Soft spherical blob, densest in the middle of the unit cube.
fn demo_density(bbox: &AABB) -> Result<GridVolume, ConfigError> {
    let res = DEMO_RESOLUTION;
    let mut data = Vec::with_capacity(res * res * res);
    for z in 0..res {
        for y in 0..res {
            for x in 0..res {
                let p = Vector3f::new(x as Float, y as Float, z as Float) / (res - 1) as Float
                    - Vector3f::new(0.5, 0.5, 0.5);
                let ripple = 0.15 * (9.0 * p.x).sin() * (7.0 * p.y).cos() * (11.0 * p.z).sin();
                data.push((1.0 - 2.2 * p.norm() + ripple).max(0.0));
            }
        }
    }
    GridVolume::from_data([res, res, res], 1, data, *bbox)
}

/// Two-channel proportions for the spectral demo: dust settles at the
/// bottom of the blob, mist rises to the top.
fn demo_proportions(bbox: &AABB) -> Result<GridVolume, ConfigError> {
    let density = demo_density(bbox)?;
    let res = density.resolution();
    let cell = bbox.diagnal().component_div(&Vector3f::new((res[0] - 1) as Float,
                                                          (res[1] - 1) as Float,
                                                          (res[2] - 1) as Float));
    let mut data = Vec::with_capacity(res[0] * res[1] * res[2] * 2);
    for z in 0..res[2] {
        for y in 0..res[1] {
            for x in 0..res[0] {
                let p = bbox.p_min + Vector3f::new(x as Float, y as Float, z as Float).component_mul(&cell);
                let d = density.eval_1(p);
                let height = z as Float / (res[2] - 1) as Float;
                data.push(d * (1.0 - height));
                data.push(d * height);
            }
        }
    }
    GridVolume::from_data(res, 2, data, *bbox)
}

fn cloud_medium(options: &Options, bbox: &AABB) -> Result<Arc<dyn Medium>, ConfigError> {
    if options.spectral {
        let mut spectra = BTreeMap::new();
        spectra.insert("sigma_t_dust".to_string(),
                       SpectrumCurve::irregular(vec![360.0, 500.0, 830.0], vec![2.0, 6.0, 9.0])?);
        spectra.insert("albedo_dust".to_string(), SpectrumCurve::uniform(0.7));
        spectra.insert("sigma_t_mist".to_string(),
                       SpectrumCurve::irregular(vec![360.0, 600.0, 830.0], vec![10.0, 4.0, 1.0])?);
        spectra.insert("albedo_mist".to_string(), SpectrumCurve::uniform(0.98));

        let proportions: Arc<dyn Volume> = match &options.density_path {
            Some(path) => Arc::new(GridVolume::from_file(path)?),
            None => Arc::new(demo_proportions(bbox)?),
        };
        let medium = SpectralMedium::new(proportions, spectra)?
            .with_id("cloud")
            .with_phase(Box::new(HenyeyGreensteinPhase::new(0.6)));
        return Ok(Arc::new(medium));
    }

    let density: Arc<dyn Volume> = match &options.density_path {
        Some(path) => Arc::new(GridVolume::from_file(path)?),
        None => Arc::new(demo_density(bbox)?),
    };
    let medium = HeterogeneousMedium::new(density, Arc::new(ConstantVolume::new_scalar(0.95)))?
        .with_id("cloud")
        .with_scale(8.0)?
        .with_activation(options.activation)
        .with_supergrid(options.supergrid)
        .with_phase(Box::new(HenyeyGreensteinPhase::new(0.6)));
    Ok(Arc::new(medium))
}

fn build_scene(options: &Options) -> Result<Scene, ConfigError> {
    let mut scene = Scene::new();

    let ground = Rectangle::new(Transform::scale(Vector3f::new(6.0, 6.0, 1.0)), Some("ground".to_string()));
    scene.add_object(SceneObject::new(Arc::new(ground), Arc::new(DiffuseBSDF::new(SpectrumCurve::uniform(0.6))))
        .with_name("ground".to_string()));

    let cloud_box = AABB::new(Vector3f::new(-1.2, -1.2, 0.4), Vector3f::new(1.2, 1.2, 2.8));
    let medium = cloud_medium(options, &cloud_box)?;
    let bbox = medium.bbox().unwrap_or(cloud_box);
    log::info!("Cloud medium {} spans {:?}", medium.id(), bbox);
    let boundary = Cube::from_box(&bbox, Some("cloud_boundary".to_string()));
    scene.add_object(SceneObject::new(Arc::new(boundary), Arc::new(NullBSDF::new()))
        .with_name("cloud".to_string())
        .with_interior_medium(Some(medium)));

    scene.add_emitter(Arc::new(DirectionalEmitter::new(Vector3f::new(-0.4, 0.3, -1.0),
                                                       SpectrumCurve::uniform(3.0))));
    scene.add_emitter(Arc::new(ConstantEmitter::new(
        SpectrumCurve::irregular(vec![360.0, 830.0], vec![0.6, 0.2])?)));
    Ok(scene)
}

fn run(options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let config = IntegratorConfig::new(options.max_depth, options.rr_depth, options.hide_emitters)?;
    let scene = build_scene(options)?;
    log::info!("Scene has {} objects and {} emitters", scene.len(), scene.emitters().len());

    let mut camera = PerspectiveCamera::new(Vector3f::new(0.0, -7.0, 2.5), Vector3f::new(0.0, 0.0, 1.4),
                                            Vector3f::new(0.0, 0.0, 1.0), 40.0, options.width, options.height);
    let integrator = Box::new(VolumetricPathIntegrator::new(config, options.spp));
    let renderer = SimpleRenderer::new(integrator, options.seed);
    let image = renderer.render(&scene, &mut camera);
    exr_utils::write_exr_to_file(&image, &options.output_path)?;
    Ok(())
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <output.exr> [--spp N] [--max-depth N] [--rr-depth N] [--seed N] \
                   [--width N] [--height N] [--density file.vol] [--activation name[:param]] \
                   [--supergrid N] [--spectral] [--hide-emitters]", args[0]);
        std::process::exit(1);
    }

    let options = match parse_options(&args) {
        Ok(options) => options,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = run(&options) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
