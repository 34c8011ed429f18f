// Copyright @yucwang 2026

use crate::core::volume::Volume;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};

/// Same value everywhere, with any number of channels.
pub struct ConstantVolume {
    values: Vec<Float>,
    bbox: Option<AABB>,
}

impl ConstantVolume {
    pub fn new_scalar(value: Float) -> Self {
        Self {
            values: vec![value],
            bbox: None,
        }
    }

    pub fn new_channels(values: Vec<Float>) -> Self {
        Self {
            values,
            bbox: None,
        }
    }

    pub fn with_bbox(mut self, bbox: Option<AABB>) -> Self {
        self.bbox = bbox;
        self
    }
}

impl Volume for ConstantVolume {
    fn bbox(&self) -> Option<AABB> {
        self.bbox
    }

    fn channels(&self) -> usize {
        self.values.len()
    }

    fn eval_1(&self, _p_world: Vector3f) -> Float {
        self.values.first().cloned().unwrap_or(0.0)
    }

    fn eval_into(&self, _p_world: Vector3f, out: &mut [Float]) {
        for (o, v) in out.iter_mut().zip(self.values.iter()) {
            *o = *v;
        }
    }

    fn max(&self) -> Float {
        self.values.iter().cloned().fold(Float::MIN, Float::max)
    }

    fn max_per_channel(&self) -> Vec<Float> {
        self.values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_volume_scalar() {
        let vol = ConstantVolume::new_scalar(2.0);
        assert_eq!(vol.channels(), 1);
        assert!(vol.bbox().is_none());
        assert_eq!(vol.eval_1(Vector3f::new(0.1, 0.2, 0.3)), 2.0);
        assert_eq!(vol.max(), 2.0);
        assert!(vol.local_majorants(4, 1.0).is_none());
    }

    #[test]
    fn constant_volume_channels_bbox() {
        let bbox = AABB::new(Vector3f::new(-1.0, 0.0, 1.0), Vector3f::new(2.0, 3.0, 4.0));
        let vol = ConstantVolume::new_channels(vec![0.5, 0.25, 0.25]).with_bbox(Some(bbox));
        assert_eq!(vol.channels(), 3);
        assert_eq!(vol.eval_n(Vector3f::new(-0.5, 1.0, 2.0)), vec![0.5, 0.25, 0.25]);
        assert_eq!(vol.max(), 0.5);
        let out = vol.bbox().unwrap();
        assert_eq!(out.p_min, Vector3f::new(-1.0, 0.0, 1.0));
        assert_eq!(out.p_max, Vector3f::new(2.0, 3.0, 4.0));
    }
}
