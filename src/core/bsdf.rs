// Copyright @yucwang 2023

use crate::core::interaction::SurfaceInteraction;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::spectrum::SampledSpectrum;

/// Lobe flags of a BSDF, also used to tag which lobe a sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BSDFFlags(u8);

impl BSDFFlags {
    pub const EMPTY: Self = Self(0);
    /// Index-matched boundary: light passes straight through.
    pub const NULL: Self = Self(1 << 0);
    pub const DIFFUSE_REFLECTION: Self = Self(1 << 1);
    pub const DELTA_REFLECTION: Self = Self(1 << 2);
    pub const DELTA_TRANSMISSION: Self = Self(1 << 3);

    pub const SMOOTH: Self = Self::DIFFUSE_REFLECTION;
    pub const DELTA: Self = Self(Self::DELTA_REFLECTION.0 | Self::DELTA_TRANSMISSION.0);

    /// True when any bit of `other` is set.
    pub fn has(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for BSDFFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for BSDFFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Radiance,
    Importance,
}

#[derive(Debug, Clone, Copy)]
pub struct BSDFContext {
    pub mode: TransportMode,
}

impl Default for BSDFContext {
    fn default() -> Self {
        Self { mode: TransportMode::Radiance }
    }
}

/// Sampled outgoing direction, in the local shading frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BSDFSample {
    pub wo: Vector3f,
    pub pdf: Float,
    /// Relative index of refraction along the sampled direction.
    pub eta: Float,
    pub sampled_type: BSDFFlags,
}

impl Default for BSDFSample {
    fn default() -> Self {
        Self {
            wo: Vector3f::zeros(),
            pdf: 0.0,
            eta: 1.0,
            sampled_type: BSDFFlags::EMPTY,
        }
    }
}

/// Directions are expressed in the shading frame of `si`, with `si.wi`
/// pointing away from the surface. `eval` includes the cosine foreshortening
/// and `sample` returns `f * cos / pdf` alongside the sample.
pub trait BSDF: Send + Sync {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn flags(&self) -> BSDFFlags;

    fn sample(&self, ctx: &BSDFContext, si: &SurfaceInteraction,
              sample1: Float, sample2: &Vector2f) -> (BSDFSample, SampledSpectrum);

    fn eval(&self, ctx: &BSDFContext, si: &SurfaceInteraction, wo: &Vector3f) -> SampledSpectrum;

    fn pdf(&self, ctx: &BSDFContext, si: &SurfaceInteraction, wo: &Vector3f) -> Float;

    /// Only an index-matched boundary: the path walks through it.
    fn is_null(&self) -> bool {
        self.flags() == BSDFFlags::NULL
    }
}
