// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::transform::Transform;

/// Piecewise-constant extinction bound over a coarse grid of cells. Cell
/// `(i, j, k)` covers `[i, i + 1] x [j, j + 1] x [k, k + 1]` in grid space.
#[derive(Debug, Clone)]
pub struct MajorantGrid {
    res: [usize; 3],
    values: Vec<Float>,
    world_to_grid: Transform,
}

/// Stretch of a ray over which the majorant is constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MajorantSegment {
    pub t_min: Float,
    pub t_max: Float,
    pub majorant: Float,
}

impl MajorantGrid {
    pub fn new(res: [usize; 3], values: Vec<Float>, world_to_grid: Transform) -> Self {
        debug_assert_eq!(values.len(), res[0] * res[1] * res[2]);
        Self { res, values, world_to_grid }
    }

    pub fn resolution(&self) -> [usize; 3] {
        self.res
    }

    pub fn values(&self) -> &[Float] {
        &self.values
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Float {
        self.values[(z * self.res[1] + y) * self.res[0] + x]
    }

    pub fn max_value(&self) -> Float {
        self.values.iter().cloned().fold(0.0, Float::max)
    }

    /// Applies `f` to every cell.
    pub fn map<F: Fn(Float) -> Float>(mut self, f: F) -> Self {
        for v in self.values.iter_mut() {
            *v = f(*v);
        }
        self
    }

    fn cell_of(&self, p_grid: &Vector3f) -> [usize; 3] {
        let mut cell = [0usize; 3];
        for axis in 0..3 {
            let c = p_grid[axis].floor();
            let hi = (self.res[axis] - 1) as Float;
            cell[axis] = if c.is_nan() { 0.0 } else { c.max(0.0).min(hi) } as usize;
        }
        cell
    }

    /// Majorant of the cell containing `p_world`; points outside the grid
    /// use the nearest cell.
    pub fn lookup(&self, p_world: &Vector3f) -> Float {
        let cell = self.cell_of(&self.world_to_grid.apply_point(*p_world));
        self.get(cell[0], cell[1], cell[2])
    }

    /// Walks the cells pierced by `ray` within `[t_min, t_max]`, front to back.
    pub fn traverse(&self, ray: &Ray3f, t_min: Float, t_max: Float) -> DdaIterator<'_> {
        let o = self.world_to_grid.apply_point(ray.origin());
        let d = self.world_to_grid.apply_vector(ray.dir());

        let mut t0 = t_min;
        let mut t1 = t_max;
        for axis in 0..3 {
            let hi = self.res[axis] as Float;
            if d[axis].abs() < 1e-12 {
                if o[axis] < 0.0 || o[axis] > hi {
                    t1 = t0 - 1.0;
                }
                continue;
            }
            let inv = 1.0 / d[axis];
            let mut near = -o[axis] * inv;
            let mut far = (hi - o[axis]) * inv;
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }
            t0 = t0.max(near);
            t1 = t1.min(far);
        }

        let mut iter = DdaIterator {
            grid: self,
            t_min: t0,
            t_max: t1,
            voxel: [0; 3],
            step: [0; 3],
            voxel_limit: [0; 3],
            next_crossing: [Float::INFINITY; 3],
            delta_t: [0.0; 3],
        };
        if !(t0 < t1) {
            iter.t_max = iter.t_min;
            return iter;
        }

        let p = o + d * t0;
        let cell = self.cell_of(&p);
        for axis in 0..3 {
            iter.voxel[axis] = cell[axis] as i64;
            if d[axis].abs() < 1e-12 {
                iter.step[axis] = 0;
                iter.next_crossing[axis] = Float::INFINITY;
            } else if d[axis] > 0.0 {
                let boundary = (cell[axis] + 1) as Float;
                iter.next_crossing[axis] = t0 + (boundary - p[axis]) / d[axis];
                iter.delta_t[axis] = 1.0 / d[axis];
                iter.step[axis] = 1;
                iter.voxel_limit[axis] = self.res[axis] as i64;
            } else {
                let boundary = cell[axis] as Float;
                iter.next_crossing[axis] = t0 + (boundary - p[axis]) / d[axis];
                iter.delta_t[axis] = -1.0 / d[axis];
                iter.step[axis] = -1;
                iter.voxel_limit[axis] = -1;
            }
        }
        iter
    }
}

pub struct DdaIterator<'a> {
    grid: &'a MajorantGrid,
    t_min: Float,
    t_max: Float,
    voxel: [i64; 3],
    step: [i64; 3],
    voxel_limit: [i64; 3],
    next_crossing: [Float; 3],
    delta_t: [Float; 3],
}

impl<'a> Iterator for DdaIterator<'a> {
    type Item = MajorantSegment;

    fn next(&mut self) -> Option<MajorantSegment> {
        if !(self.t_min < self.t_max) {
            return None;
        }

        let mut axis = 0;
        for a in 1..3 {
            if self.next_crossing[a] < self.next_crossing[axis] {
                axis = a;
            }
        }

        let t_end = self.t_max.min(self.next_crossing[axis]);
        let majorant = self.grid.get(self.voxel[0] as usize, self.voxel[1] as usize, self.voxel[2] as usize);
        let segment = MajorantSegment { t_min: self.t_min, t_max: t_end, majorant };

        self.t_min = t_end;
        if self.next_crossing[axis] >= self.t_max {
            self.t_min = self.t_max;
        } else {
            self.voxel[axis] += self.step[axis];
            if self.voxel[axis] == self.voxel_limit[axis] {
                self.t_min = self.t_max;
            }
            self.next_crossing[axis] += self.delta_t[axis];
        }
        Some(segment)
    }
}
