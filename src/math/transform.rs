// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Matrix4f, Vector3f };

/// Affine transform with its cached inverse.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    matrix: Matrix4f,
    inv_matrix: Matrix4f
}

impl Default for Transform {
    fn default() -> Self {
        Self { matrix: Matrix4f::identity(),
               inv_matrix: Matrix4f::identity() }
    }
}

impl Transform {
    pub fn new(matrix: Matrix4f) -> Self {
        Self { matrix,
               inv_matrix: matrix.try_inverse().unwrap_or_else(Matrix4f::identity) }
    }

    pub fn translate(offset: Vector3f) -> Self {
        Self::new(Matrix4f::new_translation(&offset))
    }

    pub fn scale(factors: Vector3f) -> Self {
        Self::new(Matrix4f::new_nonuniform_scaling(&factors))
    }

    /// Maps the unit cube `[0, 1]^3` onto the box `[p_min, p_max]`.
    pub fn from_box(p_min: Vector3f, p_max: Vector3f) -> Self {
        Self::translate(p_min).compose(&Self::scale(p_max - p_min))
    }

    /// `self ∘ other`: applies `other` first.
    pub fn compose(&self, other: &Transform) -> Self {
        Self { matrix: self.matrix * other.matrix,
               inv_matrix: other.inv_matrix * self.inv_matrix }
    }

    pub fn inverse(&self) -> Self {
        Self { matrix: self.inv_matrix, inv_matrix: self.matrix }
    }

    pub fn apply_point(&self, p: Vector3f) -> Vector3f {
        transform_point(&self.matrix, p)
    }

    pub fn apply_vector(&self, v: Vector3f) -> Vector3f {
        transform_vector(&self.matrix, v)
    }

    // Normals transform with the inverse transpose: if n^T x = 0 then
    // ((M^{-1})^T n)^T (M x) = 0.
    pub fn apply_normal(&self, n: Vector3f) -> Vector3f {
        transform_vector(&self.inv_matrix.transpose(), n)
    }

    pub fn inv_apply_point(&self, p: Vector3f) -> Vector3f {
        transform_point(&self.inv_matrix, p)
    }

    pub fn inv_apply_vector(&self, v: Vector3f) -> Vector3f {
        transform_vector(&self.inv_matrix, v)
    }
}

fn transform_point(m: &Matrix4f, p: Vector3f) -> Vector3f {
    let h = m * p.push(1.0);
    let w: Float = if h[3] != 0.0 { h[3] } else { 1.0 };
    Vector3f::new(h[0] / w, h[1] / w, h[2] / w)
}

fn transform_vector(m: &Matrix4f, v: Vector3f) -> Vector3f {
    let h = m * v.push(0.0);
    Vector3f::new(h[0], h[1], h[2])
}
