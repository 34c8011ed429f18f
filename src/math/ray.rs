// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f, FLOAT_MAX};
use super::spectrum::SampledWavelengths;

#[derive(Debug, Copy, Clone)]
pub struct Ray3f {
    origin: Vector3f,
    dir: Vector3f,
    time: Float,
    wavelengths: SampledWavelengths,
    pub min_t: Float,
    pub max_t: Float
}

impl Ray3f {
    pub fn new(o: Vector3f, d: Vector3f,
               min_t: Option<Float>, max_t: Option<Float>) -> Self {
        Self { origin: o, dir: d.normalize(),
               time: 0.0,
               wavelengths: SampledWavelengths::default(),
               min_t: min_t.unwrap_or(0.0),
               max_t: max_t.unwrap_or(FLOAT_MAX)}
    }

    pub fn with_wavelengths(mut self, wavelengths: SampledWavelengths) -> Self {
        self.wavelengths = wavelengths;
        self
    }

    pub fn with_time(mut self, time: Float) -> Self {
        self.time = time;
        self
    }

    /// New ray sharing time and wavelengths with this one.
    pub fn spawn(&self, o: Vector3f, d: Vector3f,
                 min_t: Option<Float>, max_t: Option<Float>) -> Self {
        Ray3f::new(o, d, min_t, max_t)
            .with_time(self.time)
            .with_wavelengths(self.wavelengths)
    }

    pub fn origin(&self) -> Vector3f {
        self.origin
    }

    pub fn dir(&self) -> Vector3f {
        self.dir
    }

    pub fn time(&self) -> Float {
        self.time
    }

    pub fn wavelengths(&self) -> &SampledWavelengths {
        &self.wavelengths
    }

    pub fn at(&self, t: Float) -> Vector3f {
        self.origin + self.dir * t
    }

    pub fn update(&mut self, t: Float) -> bool {
        if t < self.min_t || t > self.max_t {
            false
        } else {
            self.max_t = t;
            true
        }
    }

    pub fn test_segment(&self, t: Float) -> bool {
        t >= self.min_t && t <= self.max_t
    }
}

/* Tests for Ray */

#[cfg(test)]
mod tests {
    use super::Vector3f;
    use super::{Ray3f, SampledWavelengths};

    #[test]
    fn test_ray3f() {
        let o = Vector3f::new(0.0, 0.0, 0.0);
        let d = Vector3f::new(1.0, 0.0, 1.0);
        let mut ray = Ray3f::new(o, d, None, None);
        assert_eq!(o, ray.origin());

        let v1 = ray.at(2.0);
        assert!((v1[0] - std::f32::consts::SQRT_2).abs() < 1e-5);
        assert!((v1[1] - 0.0).abs() < 1e-5);
        assert!((v1[2] - std::f32::consts::SQRT_2).abs() < 1e-5);

        let status1 = ray.update(100.0);
        let status2 = ray.update(105.0);
        assert_eq!(status1, true);
        assert_eq!(status2, false);
    }

    #[test]
    fn test_spawn_keeps_wavelengths() {
        let wl = SampledWavelengths::fixed([400.0, 500.0, 600.0, 700.0]);
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None)
            .with_wavelengths(wl)
            .with_time(0.5);
        let next = ray.spawn(Vector3f::new(1.0, 0.0, 0.0), Vector3f::new(0.0, 2.0, 0.0), Some(1e-4), None);
        assert_eq!(next.wavelengths(), &wl);
        assert_eq!(next.time(), 0.5);
        assert!((next.dir().norm() - 1.0).abs() < 1e-6);
    }
}
