// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::interaction::SurfaceInteraction;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::spectrum::{SampledSpectrum, SampledWavelengths};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterFlag(u8);

impl EmitterFlag {
    pub const NONE: Self = Self(0);
    pub const DIRECTION: Self = Self(1 << 0);
    pub const SURFACE: Self = Self(1 << 1);
    pub const DELTA: Self = Self(1 << 2);
    pub const INFINITE: Self = Self(1 << 3);

    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }
}

impl std::ops::BitOr for EmitterFlag {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for EmitterFlag {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Direction from a reference point towards an emitter.
#[derive(Clone)]
pub struct DirectionSample {
    /// Point on the emitter (far away for infinite emitters).
    pub p: Vector3f,
    pub n: Vector3f,
    /// Unit direction from the reference point to `p`.
    pub d: Vector3f,
    pub dist: Float,
    /// Solid angle density; 1 for delta emitters.
    pub pdf: Float,
    pub delta: bool,
    pub emitter: Option<Arc<dyn Emitter>>,
}

impl DirectionSample {
    pub fn invalid() -> Self {
        Self {
            p: Vector3f::zeros(),
            n: Vector3f::zeros(),
            d: Vector3f::zeros(),
            dist: 0.0,
            pdf: 0.0,
            delta: false,
            emitter: None,
        }
    }

    /// Record for a ray from `ref_p` that landed on the emitting surface `si`.
    pub fn from_hit(ref_p: &Vector3f, si: &SurfaceInteraction) -> Self {
        let to_hit = si.p - ref_p;
        let dist = to_hit.norm();
        Self {
            p: si.p,
            n: si.n,
            d: if dist > 0.0 { to_hit / dist } else { Vector3f::zeros() },
            dist,
            pdf: 0.0,
            delta: false,
            emitter: si.emitter.clone(),
        }
    }

    /// Record for an escaped ray heading along `d`.
    pub fn from_direction(d: &Vector3f, emitter: Arc<dyn Emitter>) -> Self {
        Self {
            p: Vector3f::zeros(),
            n: -d,
            d: *d,
            dist: Float::INFINITY,
            pdf: 0.0,
            delta: false,
            emitter: Some(emitter),
        }
    }
}

pub trait Emitter: ComputationNode + Send + Sync {
    fn get_flag(&self) -> EmitterFlag;

    /// Samples a direction from `ref_p` towards the emitter. The spectrum is
    /// the incident radiance divided by the sample's pdf, without visibility.
    fn sample_direction(&self, ref_p: &Vector3f, u: &Vector2f,
                        wavelengths: &SampledWavelengths) -> (DirectionSample, SampledSpectrum);

    /// Solid angle density of `sample_direction` generating `ds`.
    fn pdf_direction(&self, ref_p: &Vector3f, ds: &DirectionSample) -> Float;

    /// Radiance leaving the emitting surface `si` towards `si.wi`.
    fn eval(&self, _si: &SurfaceInteraction) -> SampledSpectrum {
        SampledSpectrum::zero()
    }

    /// Radiance arriving along an escaped ray of direction `dir`.
    fn eval_direction(&self, _dir: &Vector3f, _wavelengths: &SampledWavelengths) -> SampledSpectrum {
        SampledSpectrum::zero()
    }

    fn is_environment(&self) -> bool {
        self.get_flag().contains(EmitterFlag::INFINITE)
    }

    fn is_delta(&self) -> bool {
        self.get_flag().contains(EmitterFlag::DELTA)
    }
}
