// Copyright @yucwang 2026

use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::volumes::majorant_grid::MajorantGrid;

/// Spatially varying field with one or more channels.
pub trait Volume: Send + Sync {
    fn bbox(&self) -> Option<AABB> {
        None
    }

    fn channels(&self) -> usize;

    /// First channel at `p_world`.
    fn eval_1(&self, p_world: Vector3f) -> Float;

    /// All channels at `p_world`, written to the first `channels()` slots
    /// of `out`.
    fn eval_into(&self, p_world: Vector3f, out: &mut [Float]);

    fn eval_n(&self, p_world: Vector3f) -> Vec<Float> {
        let mut out = vec![0.0; self.channels()];
        self.eval_into(p_world, &mut out);
        out
    }

    /// Maximum over all channels and voxels.
    fn max(&self) -> Float;

    fn max_per_channel(&self) -> Vec<Float>;

    /// Coarse grid of `scale * max` over blocks of `resolution_factor`
    /// voxels per axis, for volumes with spatial structure.
    fn local_majorants(&self, _resolution_factor: usize, _scale: Float) -> Option<MajorantGrid> {
        None
    }
}
