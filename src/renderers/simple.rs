// Copyright @yucwang 2021

use crate::core::integrator::Integrator;
use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::math::bitmap::Bitmap;
use crate::math::color::spectrum_to_srgb;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::spectrum::SampledWavelengths;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

pub use super::renderer::Renderer;

const BLOCK_SIZE: usize = 32;

struct Block {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
    pixels: Vec<Vector3f>,
    valid_samples: usize,
}

/// Splits the film into square blocks that worker threads pull from a
/// shared counter.
pub struct SimpleRenderer {
    integrator: Box<dyn Integrator>,
    seed: u64,
    thread_count: Option<usize>,
}

impl SimpleRenderer {
    pub fn new(integrator: Box<dyn Integrator>, seed: u64) -> Self {
        Self {
            integrator,
            seed,
            thread_count: None,
        }
    }

    pub fn with_threads(mut self, thread_count: usize) -> Self {
        self.thread_count = Some(thread_count.max(1));
        self
    }

    fn render_block(&self, scene: &Scene, sensor: &dyn Sensor, width: usize, height: usize,
                    x0: usize, y0: usize, x1: usize, y1: usize) -> Block {
        let spp = self.integrator.samples_per_pixel().max(1);
        let inv_spp = 1.0 / (spp as Float);
        let medium = sensor.medium();

        let mut pixels = vec![Vector3f::zeros(); (x1 - x0) * (y1 - y0)];
        let mut valid_samples = 0usize;
        for y in y0..y1 {
            for x in x0..x1 {
                let mut rng = LcgRng::for_pixel(self.seed, (y * width + x) as u64);
                let mut color = Vector3f::zeros();
                for _sample in 0..spp {
                    let film = Vector2f::new((x as Float + rng.next_1d()) / width as Float,
                                             (y as Float + rng.next_1d()) / height as Float);
                    let wavelengths = SampledWavelengths::sample_visible(rng.next_1d());
                    let ray = sensor.sample_ray(&film).with_wavelengths(wavelengths);
                    let (radiance, valid) = self.integrator.sample(scene, &ray, medium.clone(), &mut rng);
                    if valid {
                        valid_samples += 1;
                    }
                    color += spectrum_to_srgb(&radiance, &wavelengths);
                }
                pixels[(x - x0) + (x1 - x0) * (y - y0)] = color * inv_spp;
            }
        }
        Block { x0, y0, x1, y1, pixels, valid_samples }
    }
}

impl Renderer for SimpleRenderer {
    fn render(&self, scene: &Scene, sensor: &mut dyn Sensor) -> Bitmap {
        let (width, height) = {
            let bmp = sensor.bitmap();
            (bmp.width(), bmp.height())
        };
        if width == 0 || height == 0 {
            return Bitmap::new(0, 0);
        }
        log::info!("Rendering {}x{} at {} spp with {}", width, height,
                   self.integrator.samples_per_pixel(), sensor.describe());

        let blocks_x = (width + BLOCK_SIZE - 1) / BLOCK_SIZE;
        let blocks_y = (height + BLOCK_SIZE - 1) / BLOCK_SIZE;
        let total_blocks = blocks_x * blocks_y;
        let sensor_ref: &dyn Sensor = &*sensor;

        let progress = ProgressBar::new(total_blocks as u64);
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} blocks")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let next_block = Arc::new(AtomicUsize::new(0));
        let thread_count = self.thread_count.unwrap_or_else(|| {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        });
        let (tx, rx) = mpsc::channel::<Block>();
        let mut output = vec![Vector3f::zeros(); width * height];
        let mut valid_samples = 0usize;

        thread::scope(|scope| {
            for _ in 0..thread_count {
                let next_block = Arc::clone(&next_block);
                let tx = tx.clone();
                scope.spawn(move || {
                    loop {
                        let block_index = next_block.fetch_add(1, Ordering::Relaxed);
                        if block_index >= total_blocks {
                            break;
                        }

                        let x0 = (block_index % blocks_x) * BLOCK_SIZE;
                        let y0 = (block_index / blocks_x) * BLOCK_SIZE;
                        let x1 = (x0 + BLOCK_SIZE).min(width);
                        let y1 = (y0 + BLOCK_SIZE).min(height);
                        let block = self.render_block(scene, sensor_ref, width, height, x0, y0, x1, y1);
                        if tx.send(block).is_err() {
                            break;
                        }
                    }
                });
            }

            drop(tx);
            for block in rx.iter() {
                for y in block.y0..block.y1 {
                    for x in block.x0..block.x1 {
                        output[x + width * y] = block.pixels[(x - block.x0) + (block.x1 - block.x0) * (y - block.y0)];
                    }
                }
                valid_samples += block.valid_samples;
                progress.inc(1);
            }
        });
        progress.finish_and_clear();

        let total_samples = width * height * self.integrator.samples_per_pixel().max(1) as usize;
        log::info!("{} of {} samples reached an emitter or a surface", valid_samples, total_samples);

        let bitmap = sensor.bitmap_mut();
        for y in 0..height {
            for x in 0..width {
                bitmap[(x, y)] = output[x + width * y];
            }
        }
        bitmap.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitters::constant::ConstantEmitter;
    use crate::integrators::volpath::{IntegratorConfig, VolumetricPathIntegrator};
    use crate::math::spectrum::SpectrumCurve;
    use crate::sensors::perspective::PerspectiveCamera;

    #[test]
    fn test_render_is_deterministic_and_fills_film() {
        let mut scene = Scene::new();
        scene.add_emitter(std::sync::Arc::new(ConstantEmitter::new(SpectrumCurve::uniform(1.0))));
        let make_camera = || PerspectiveCamera::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, -1.0),
                                                    Vector3f::new(0.0, 1.0, 0.0), 45.0, 40, 20);
        let renderer = SimpleRenderer::new(
            Box::new(VolumetricPathIntegrator::new(IntegratorConfig::default(), 2)), 3).with_threads(3);

        let mut camera = make_camera();
        let a = renderer.render(&scene, &mut camera);
        let mut camera = make_camera();
        let b = renderer.render(&scene, &mut camera);
        assert_eq!(a.width(), 40);
        assert_eq!(a.pixels(), b.pixels());
        let mean = a.mean();
        assert!((mean.y - 1.0).abs() < 0.25, "mean {:?}", mean);
    }
}
