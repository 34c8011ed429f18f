// Copyright @yucwang 2026

use crate::core::error::ConfigError;
use crate::core::volume::Volume;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::transform::Transform;
use crate::volumes::majorant_grid::MajorantGrid;
use crate::volumes::{wrap_coord3, VolumeFilterMode, VolumeWrapMode};
use std::fs;

/// Dense voxel grid with any number of channels, stored x-fastest with
/// channels interleaved (the layout of Mitsuba `.vol` files). Node `i` of an
/// axis with `res` nodes sits at `i / (res - 1)` in the unit cube.
pub struct GridVolume {
    data: Vec<Float>,
    xres: usize,
    yres: usize,
    zres: usize,
    channels: usize,
    bbox: AABB,
    use_grid_bbox: bool,
    to_world: Transform,
    filter_mode: VolumeFilterMode,
    wrap_mode: VolumeWrapMode,
    max_per_channel: Vec<Float>,
}

impl GridVolume {
    pub fn from_data(res: [usize; 3], channels: usize, data: Vec<Float>, bbox: AABB) -> Result<Self, ConfigError> {
        let [xres, yres, zres] = res;
        if xres == 0 || yres == 0 || zres == 0 || channels == 0 {
            return Err(ConfigError::InvalidVolume("grid dimensions must be positive".to_string()));
        }
        let expected = xres
            .checked_mul(yres)
            .and_then(|v| v.checked_mul(zres))
            .and_then(|v| v.checked_mul(channels))
            .ok_or_else(|| ConfigError::InvalidVolume("grid dimensions overflow".to_string()))?;
        if data.len() != expected {
            return Err(ConfigError::InvalidVolume(
                format!("expected {} values, got {}", expected, data.len())));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidVolume("grid contains non-finite values".to_string()));
        }
        if !bbox.is_solid() {
            return Err(ConfigError::InvalidBoundingBox("grid volume".to_string()));
        }

        let mut max_per_channel = vec![Float::MIN; channels];
        for (idx, v) in data.iter().enumerate() {
            let c = idx % channels;
            max_per_channel[c] = max_per_channel[c].max(*v);
        }

        Ok(Self {
            data,
            xres,
            yres,
            zres,
            channels,
            bbox,
            use_grid_bbox: true,
            to_world: Transform::default(),
            filter_mode: VolumeFilterMode::Trilinear,
            wrap_mode: VolumeWrapMode::Clamp,
            max_per_channel,
        })
    }

    /// Reads a binary Mitsuba `.vol` file (version 3, float32 encoding).
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|e| ConfigError::Io { path: path.to_string(), source: e })?;
        let mut cursor = 4usize;

        if bytes.len() < 4 {
            return Err(ConfigError::InvalidVolume("vol file too small".to_string()));
        }
        if &bytes[0..3] != b"VOL" {
            return Err(ConfigError::InvalidVolume("invalid vol header".to_string()));
        }
        let version = bytes[3];
        if version != 3 {
            return Err(ConfigError::InvalidVolume(format!("unsupported vol version: {}", version)));
        }

        let encoding = read_i32(&bytes, &mut cursor)?;
        let xres = read_i32(&bytes, &mut cursor)?;
        let yres = read_i32(&bytes, &mut cursor)?;
        let zres = read_i32(&bytes, &mut cursor)?;
        let channels = read_i32(&bytes, &mut cursor)?;

        if encoding != 1 {
            return Err(ConfigError::InvalidVolume(format!("unsupported vol encoding: {}", encoding)));
        }
        if xres <= 0 || yres <= 0 || zres <= 0 || channels <= 0 {
            return Err(ConfigError::InvalidVolume("vol dimensions must be positive".to_string()));
        }

        let mut corners = [0.0; 6];
        for c in corners.iter_mut() {
            *c = read_f32(&bytes, &mut cursor)?;
        }
        let bbox = AABB::new(
            Vector3f::new(corners[0], corners[1], corners[2]),
            Vector3f::new(corners[3], corners[4], corners[5]),
        );

        let count = (xres as usize) * (yres as usize) * (zres as usize) * (channels as usize);
        let mut data = Vec::with_capacity(count);
        for _ in 0..count {
            data.push(read_f32(&bytes, &mut cursor)?);
        }

        log::debug!("Loaded {} ({}x{}x{}, {} channels)", path, xres, yres, zres, channels);
        Self::from_data([xres as usize, yres as usize, zres as usize], channels as usize, data, bbox)
    }

    pub fn write_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let mut bytes = Vec::with_capacity(48 + 4 * self.data.len());
        bytes.extend_from_slice(b"VOL");
        bytes.push(3u8);
        for v in [1i32, self.xres as i32, self.yres as i32, self.zres as i32, self.channels as i32].iter() {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        for axis in 0..3 {
            bytes.extend_from_slice(&self.bbox.p_min[axis].to_le_bytes());
        }
        for axis in 0..3 {
            bytes.extend_from_slice(&self.bbox.p_max[axis].to_le_bytes());
        }
        for v in self.data.iter() {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        fs::write(path, bytes).map_err(|e| ConfigError::Io { path: path.to_string(), source: e })
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.to_world = transform;
    }

    pub fn set_filter_mode(&mut self, filter_mode: VolumeFilterMode) {
        self.filter_mode = filter_mode;
    }

    pub fn set_wrap_mode(&mut self, wrap_mode: VolumeWrapMode) {
        self.wrap_mode = wrap_mode;
    }

    pub fn set_use_grid_bbox(&mut self, use_grid_bbox: bool) {
        self.use_grid_bbox = use_grid_bbox;
    }

    pub fn resolution(&self) -> [usize; 3] {
        [self.xres, self.yres, self.zres]
    }

    fn fetch(&self, x: usize, y: usize, z: usize, channel: usize) -> Float {
        let idx = ((z * self.yres + y) * self.xres + x) * self.channels + channel;
        self.data[idx]
    }

    fn world_to_unit(&self) -> Transform {
        let to_local = self.to_world.inverse();
        if self.use_grid_bbox {
            Transform::from_box(self.bbox.p_min, self.bbox.p_max).inverse().compose(&to_local)
        } else {
            to_local
        }
    }

    /// Node indices and weights of the lookup at unit-cube position `p`.
    fn footprint(&self, p: Vector3f) -> ([[usize; 3]; 8], [Float; 8], usize) {
        let res = [self.xres, self.yres, self.zres];
        let mut nodes = [[0usize; 3]; 8];
        let mut weights = [0.0; 8];

        match self.filter_mode {
            VolumeFilterMode::Nearest => {
                for axis in 0..3 {
                    let x = p[axis] * (res[axis] as Float - 1.0);
                    let xi = (x + 0.5).floor() as isize;
                    nodes[0][axis] = xi.clamp(0, res[axis] as isize - 1) as usize;
                }
                weights[0] = 1.0;
                (nodes, weights, 1)
            }
            VolumeFilterMode::Trilinear => {
                let mut lo = [0usize; 3];
                let mut hi = [0usize; 3];
                let mut frac = [0.0; 3];
                for axis in 0..3 {
                    let x = p[axis] * (res[axis] as Float - 1.0);
                    let x0 = x.floor() as isize;
                    frac[axis] = x - x0 as Float;
                    lo[axis] = x0.clamp(0, res[axis] as isize - 1) as usize;
                    hi[axis] = (x0 + 1).clamp(0, res[axis] as isize - 1) as usize;
                }
                for corner in 0..8 {
                    let mut w = 1.0;
                    for axis in 0..3 {
                        if (corner >> axis) & 1 == 1 {
                            nodes[corner][axis] = hi[axis];
                            w *= frac[axis];
                        } else {
                            nodes[corner][axis] = lo[axis];
                            w *= 1.0 - frac[axis];
                        }
                    }
                    weights[corner] = w;
                }
                (nodes, weights, 8)
            }
        }
    }

    fn unit_position(&self, p_world: Vector3f) -> Option<Vector3f> {
        let p = self.world_to_unit().apply_point(p_world);
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            return None;
        }
        Some(wrap_coord3(p, self.wrap_mode))
    }

    fn eval_channel(&self, p_world: Vector3f, channel: usize) -> Float {
        let p = match self.unit_position(p_world) {
            Some(p) => p,
            None => return 0.0,
        };
        let (nodes, weights, count) = self.footprint(p);
        (0..count)
            .map(|i| weights[i] * self.fetch(nodes[i][0], nodes[i][1], nodes[i][2], channel))
            .sum()
    }
}

impl Volume for GridVolume {
    fn bbox(&self) -> Option<AABB> {
        let local = if self.use_grid_bbox {
            self.bbox
        } else {
            AABB::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(1.0, 1.0, 1.0))
        };
        let mut out = AABB::default();
        for corner in 0..8 {
            let c = Vector3f::new(
                if corner & 1 == 0 { local.p_min.x } else { local.p_max.x },
                if corner & 2 == 0 { local.p_min.y } else { local.p_max.y },
                if corner & 4 == 0 { local.p_min.z } else { local.p_max.z },
            );
            out.expand_by_point(&self.to_world.apply_point(c));
        }
        Some(out)
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn eval_1(&self, p_world: Vector3f) -> Float {
        self.eval_channel(p_world, 0)
    }

    fn eval_into(&self, p_world: Vector3f, out: &mut [Float]) {
        let n = self.channels.min(out.len());
        let out = &mut out[..n];
        for value in out.iter_mut() {
            *value = 0.0;
        }
        let p = match self.unit_position(p_world) {
            Some(p) => p,
            None => return,
        };
        let (nodes, weights, count) = self.footprint(p);
        for i in 0..count {
            for (c, value) in out.iter_mut().enumerate() {
                *value += weights[i] * self.fetch(nodes[i][0], nodes[i][1], nodes[i][2], c);
            }
        }
    }

    fn max(&self) -> Float {
        self.max_per_channel.iter().cloned().fold(Float::MIN, Float::max)
    }

    fn max_per_channel(&self) -> Vec<Float> {
        self.max_per_channel.clone()
    }

    /// Block `b` along an axis covers nodes `b * f ..= (b + 1) * f`, which is
    /// every node a lookup inside the cell can touch.
    fn local_majorants(&self, resolution_factor: usize, scale: Float) -> Option<MajorantGrid> {
        let f = resolution_factor.max(1);
        let res = [self.xres, self.yres, self.zres];
        let mut blocks = [1usize; 3];
        let mut cell_width = Vector3f::new(1.0, 1.0, 1.0);
        for axis in 0..3 {
            if res[axis] > 1 {
                blocks[axis] = ((res[axis] - 1) + f - 1) / f;
                cell_width[axis] = f as Float / (res[axis] - 1) as Float;
            }
        }

        let mut values = Vec::with_capacity(blocks[0] * blocks[1] * blocks[2]);
        for bz in 0..blocks[2] {
            for by in 0..blocks[1] {
                for bx in 0..blocks[0] {
                    let b = [bx, by, bz];
                    let mut lo = [0usize; 3];
                    let mut hi = [0usize; 3];
                    for axis in 0..3 {
                        lo[axis] = (b[axis] * f).min(res[axis] - 1);
                        hi[axis] = ((b[axis] + 1) * f).min(res[axis] - 1);
                    }
                    let mut block_max = Float::MIN;
                    for z in lo[2]..=hi[2] {
                        for y in lo[1]..=hi[1] {
                            for x in lo[0]..=hi[0] {
                                for c in 0..self.channels {
                                    block_max = block_max.max(self.fetch(x, y, z, c));
                                }
                            }
                        }
                    }
                    values.push(scale * block_max);
                }
            }
        }

        let unit_to_grid = Transform::scale(Vector3f::new(
            1.0 / cell_width.x, 1.0 / cell_width.y, 1.0 / cell_width.z));
        log::debug!("Built {}x{}x{} supergrid (factor {})", blocks[0], blocks[1], blocks[2], f);
        Some(MajorantGrid::new(blocks, values, unit_to_grid.compose(&self.world_to_unit())))
    }
}

fn read_i32(bytes: &[u8], cursor: &mut usize) -> Result<i32, ConfigError> {
    if *cursor + 4 > bytes.len() {
        return Err(ConfigError::InvalidVolume("unexpected eof while reading i32".to_string()));
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[*cursor..*cursor + 4]);
    *cursor += 4;
    Ok(i32::from_le_bytes(buf))
}

fn read_f32(bytes: &[u8], cursor: &mut usize) -> Result<Float, ConfigError> {
    if *cursor + 4 > bytes.len() {
        return Err(ConfigError::InvalidVolume("unexpected eof while reading f32".to_string()));
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[*cursor..*cursor + 4]);
    *cursor += 4;
    Ok(Float::from_le_bytes(buf))
}
