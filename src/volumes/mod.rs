// Copyright @yucwang 2026

pub mod const_volume;
pub mod grid_volume;
pub mod majorant_grid;

use crate::math::constants::{Float, Vector3f};

/// Reconstruction filter of grid lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeFilterMode {
    Nearest,
    Trilinear,
}

/// Handling of lookups outside the unit cube.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeWrapMode {
    Repeat,
    Mirror,
    Clamp,
}

fn wrap_coord(value: Float, mode: VolumeWrapMode) -> Float {
    match mode {
        VolumeWrapMode::Clamp => value.clamp(0.0, 1.0),
        VolumeWrapMode::Repeat => {
            let mut v = value - value.floor();
            if v < 0.0 {
                v += 1.0;
            }
            v
        }
        VolumeWrapMode::Mirror => {
            let mut v = value % 2.0;
            if v < 0.0 {
                v += 2.0;
            }
            if v > 1.0 {
                2.0 - v
            } else {
                v
            }
        }
    }
}

pub(crate) fn wrap_coord3(value: Vector3f, mode: VolumeWrapMode) -> Vector3f {
    Vector3f::new(
        wrap_coord(value.x, mode),
        wrap_coord(value.y, mode),
        wrap_coord(value.z, mode),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_modes() {
        assert_eq!(wrap_coord(1.5, VolumeWrapMode::Clamp), 1.0);
        assert!((wrap_coord(1.25, VolumeWrapMode::Repeat) - 0.25).abs() < 1e-6);
        assert!((wrap_coord(-0.25, VolumeWrapMode::Repeat) - 0.75).abs() < 1e-6);
        assert!((wrap_coord(1.25, VolumeWrapMode::Mirror) - 0.75).abs() < 1e-6);
        let v = wrap_coord3(Vector3f::new(-1.0, 0.5, 2.0), VolumeWrapMode::Clamp);
        assert_eq!(v, Vector3f::new(0.0, 0.5, 1.0));
    }
}
