// Copyright @yucwang 2026

use crate::core::error::ConfigError;
use crate::math::constants::Float;

/// Map from raw (scaled) grid density to extinction. Every variant is
/// monotonically non-decreasing, so applying it to a bound yields a bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DensityActivation {
    None,
    Exponential,
    /// `ln(1 + exp(x + shift))`
    SoftPlus { shift: Float },
    ReLU,
}

impl Default for DensityActivation {
    fn default() -> Self {
        DensityActivation::None
    }
}

fn soft_plus(x: Float) -> Float {
    // ln(1 + e^x) without overflow for large x.
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

impl DensityActivation {
    pub fn apply(&self, x: Float) -> Float {
        match self {
            DensityActivation::None => x,
            DensityActivation::Exponential => x.exp(),
            DensityActivation::SoftPlus { shift } => soft_plus(x + shift),
            DensityActivation::ReLU => x.max(0.0),
        }
    }

    /// Accepts `none`, `exp`, `exponential`, `softplus` and `relu`, in any
    /// case. `param` is the SoftPlus shift and is ignored by the others.
    pub fn parse(name: &str, param: Option<Float>) -> Result<Self, ConfigError> {
        let activation = match name.trim().to_ascii_lowercase().as_str() {
            "none" => DensityActivation::None,
            "exp" | "exponential" => DensityActivation::Exponential,
            "softplus" => DensityActivation::SoftPlus { shift: param.unwrap_or(0.0) },
            "relu" => DensityActivation::ReLU,
            _ => return Err(ConfigError::UnsupportedActivation(name.to_string())),
        };
        if param.is_some() && !matches!(activation, DensityActivation::SoftPlus { .. }) {
            log::warn!("Activation {} takes no parameter, ignoring it", name);
        }
        Ok(activation)
    }

    /// SoftPlus shift for which a raw density of zero lets `1 - a` of the
    /// light through one voxel of width `voxel_width`.
    pub fn default_param(a: Float, voxel_width: Float) -> Result<Float, ConfigError> {
        if !(a > 0.0 && a < 1.0) {
            return Err(ConfigError::invalid_parameter("opacity", format!("{} is not in (0, 1)", a)));
        }
        if !(voxel_width > 0.0) || !voxel_width.is_finite() {
            return Err(ConfigError::invalid_parameter("voxel_width", format!("{} is not positive", voxel_width)));
        }
        let sigma = -(1.0 - a).ln() / voxel_width;
        // ln(e^sigma - 1)
        Ok(sigma + (-(-sigma).exp_m1()).ln())
    }

    pub fn soft_plus_for_opacity(a: Float, voxel_width: Float) -> Result<Self, ConfigError> {
        Ok(DensityActivation::SoftPlus { shift: Self::default_param(a, voxel_width)? })
    }

    pub fn name(&self) -> &'static str {
        match self {
            DensityActivation::None => "none",
            DensityActivation::Exponential => "exponential",
            DensityActivation::SoftPlus { .. } => "softplus",
            DensityActivation::ReLU => "relu",
        }
    }
}
