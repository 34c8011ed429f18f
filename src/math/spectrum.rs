// Copyright 2020 @TwoCookingMice

use super::constants::Float;
use crate::core::error::ConfigError;

use std::ops;

pub const SPECTRUM_SAMPLES: usize = 4;
pub const MIN_WAVELENGTH: Float = 360.0;
pub const MAX_WAVELENGTH: Float = 830.0;

/// Spectral quantity carried per wavelength lane of a path sample.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SampledSpectrum {
    values: [Float; SPECTRUM_SAMPLES],
}

impl Default for SampledSpectrum {
    fn default() -> Self {
        Self { values: [0.0; SPECTRUM_SAMPLES] }
    }
}

impl SampledSpectrum {
    pub fn new(values: [Float; SPECTRUM_SAMPLES]) -> Self {
        Self { values }
    }

    pub fn splat(value: Float) -> Self {
        Self { values: [value; SPECTRUM_SAMPLES] }
    }

    pub fn zero() -> Self {
        Self::splat(0.0)
    }

    pub fn one() -> Self {
        Self::splat(1.0)
    }

    pub fn is_black(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn has_nan(&self) -> bool {
        self.values.iter().any(|v| v.is_nan())
    }

    pub fn max_value(&self) -> Float {
        self.values.iter().fold(FLOAT_LOWEST, |a, &b| a.max(b))
    }

    pub fn min_value(&self) -> Float {
        self.values.iter().fold(Float::MAX, |a, &b| a.min(b))
    }

    pub fn average(&self) -> Float {
        self.values.iter().sum::<Float>() / (SPECTRUM_SAMPLES as Float)
    }

    pub fn map<F: Fn(Float) -> Float>(&self, f: F) -> Self {
        let mut values = self.values;
        for v in values.iter_mut() {
            *v = f(*v);
        }
        Self { values }
    }

    pub fn exp(&self) -> Self {
        self.map(|v| v.exp())
    }

    pub fn clamp_zero(&self) -> Self {
        self.map(|v| v.max(0.0))
    }

    /// Component-wise division that yields zero where the denominator is zero.
    pub fn safe_div(&self, rhs: &SampledSpectrum) -> Self {
        let mut values = [0.0; SPECTRUM_SAMPLES];
        for idx in 0..SPECTRUM_SAMPLES {
            if rhs.values[idx] != 0.0 {
                values[idx] = self.values[idx] / rhs.values[idx];
            }
        }
        Self { values }
    }

    pub fn values(&self) -> &[Float; SPECTRUM_SAMPLES] {
        &self.values
    }
}

const FLOAT_LOWEST: Float = std::f32::MIN;

impl ops::Index<usize> for SampledSpectrum {
    type Output = Float;

    fn index(&self, index: usize) -> &Float {
        &self.values[index]
    }
}

impl ops::IndexMut<usize> for SampledSpectrum {
    fn index_mut(&mut self, index: usize) -> &mut Float {
        &mut self.values[index]
    }
}

macro_rules! impl_spectrum_binary_op {
    ($trait:ident, $fn:ident, $assign_trait:ident, $assign_fn:ident, $op:tt) => {
        impl ops::$trait for SampledSpectrum {
            type Output = SampledSpectrum;

            fn $fn(self, rhs: SampledSpectrum) -> SampledSpectrum {
                let mut values = self.values;
                for idx in 0..SPECTRUM_SAMPLES {
                    values[idx] = values[idx] $op rhs.values[idx];
                }
                SampledSpectrum { values }
            }
        }

        impl ops::$trait<Float> for SampledSpectrum {
            type Output = SampledSpectrum;

            fn $fn(self, rhs: Float) -> SampledSpectrum {
                let mut values = self.values;
                for v in values.iter_mut() {
                    *v = *v $op rhs;
                }
                SampledSpectrum { values }
            }
        }

        impl ops::$assign_trait for SampledSpectrum {
            fn $assign_fn(&mut self, rhs: SampledSpectrum) {
                *self = *self $op rhs;
            }
        }

        impl ops::$assign_trait<Float> for SampledSpectrum {
            fn $assign_fn(&mut self, rhs: Float) {
                *self = *self $op rhs;
            }
        }
    };
}

impl_spectrum_binary_op!(Add, add, AddAssign, add_assign, +);
impl_spectrum_binary_op!(Sub, sub, SubAssign, sub_assign, -);
impl_spectrum_binary_op!(Mul, mul, MulAssign, mul_assign, *);
impl_spectrum_binary_op!(Div, div, DivAssign, div_assign, /);

impl ops::Mul<SampledSpectrum> for Float {
    type Output = SampledSpectrum;

    fn mul(self, rhs: SampledSpectrum) -> SampledSpectrum {
        rhs * self
    }
}

impl std::fmt::Display for SampledSpectrum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.values[0], self.values[1], self.values[2], self.values[3])
    }
}

/// Wavelengths carried by a path sample: a hero wavelength and rotations of
/// it spread evenly over the sampled range.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SampledWavelengths {
    lambda: [Float; SPECTRUM_SAMPLES],
    pdf: [Float; SPECTRUM_SAMPLES],
}

impl SampledWavelengths {
    pub fn sample_uniform(u: Float, lambda_min: Float, lambda_max: Float) -> Self {
        let range = lambda_max - lambda_min;
        let mut lambda = [0.0; SPECTRUM_SAMPLES];
        lambda[0] = lambda_min + u * range;
        let delta = range / (SPECTRUM_SAMPLES as Float);
        for idx in 1..SPECTRUM_SAMPLES {
            let mut l = lambda[idx - 1] + delta;
            if l > lambda_max {
                l = lambda_min + (l - lambda_max);
            }
            lambda[idx] = l;
        }
        let pdf = if range > 0.0 { 1.0 / range } else { 0.0 };
        Self { lambda, pdf: [pdf; SPECTRUM_SAMPLES] }
    }

    pub fn sample_visible(u: Float) -> Self {
        Self::sample_uniform(u, MIN_WAVELENGTH, MAX_WAVELENGTH)
    }

    /// Deterministic wavelengths, mostly useful for tests and probes.
    pub fn fixed(lambda: [Float; SPECTRUM_SAMPLES]) -> Self {
        let pdf = 1.0 / (MAX_WAVELENGTH - MIN_WAVELENGTH);
        Self { lambda, pdf: [pdf; SPECTRUM_SAMPLES] }
    }

    pub fn lambda(&self, idx: usize) -> Float {
        self.lambda[idx]
    }

    pub fn lambdas(&self) -> &[Float; SPECTRUM_SAMPLES] {
        &self.lambda
    }

    pub fn pdf(&self) -> SampledSpectrum {
        SampledSpectrum::new(self.pdf)
    }
}

impl Default for SampledWavelengths {
    fn default() -> Self {
        Self::fixed([450.0, 525.0, 600.0, 675.0])
    }
}

/// Continuous spectrum, evaluated at sampled wavelengths.
#[derive(Debug, Clone, PartialEq)]
pub enum SpectrumCurve {
    Uniform(Float),
    /// Piecewise linear between knots, zero outside the knot range.
    Irregular { wavelengths: Vec<Float>, values: Vec<Float> },
}

impl SpectrumCurve {
    pub fn uniform(value: Float) -> Self {
        SpectrumCurve::Uniform(value)
    }

    pub fn irregular(wavelengths: Vec<Float>, values: Vec<Float>) -> Result<Self, ConfigError> {
        if wavelengths.len() != values.len() {
            return Err(ConfigError::InvalidParameter {
                name: "spectrum".to_string(),
                reason: format!("{} wavelengths but {} values", wavelengths.len(), values.len()),
            });
        }
        if wavelengths.len() < 2 {
            return Err(ConfigError::InvalidParameter {
                name: "spectrum".to_string(),
                reason: "at least two samples are required".to_string(),
            });
        }
        if wavelengths.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(ConfigError::InvalidParameter {
                name: "spectrum".to_string(),
                reason: "wavelengths must be strictly increasing".to_string(),
            });
        }
        Ok(SpectrumCurve::Irregular { wavelengths, values })
    }

    pub fn regular(lambda_min: Float, lambda_max: Float, values: Vec<Float>) -> Result<Self, ConfigError> {
        if values.len() < 2 || !(lambda_max > lambda_min) {
            return Err(ConfigError::InvalidParameter {
                name: "spectrum".to_string(),
                reason: format!("cannot spread {} samples over [{}, {}]", values.len(), lambda_min, lambda_max),
            });
        }
        let step = (lambda_max - lambda_min) / ((values.len() - 1) as Float);
        let wavelengths = (0..values.len())
            .map(|i| lambda_min + step * (i as Float))
            .collect();
        Self::irregular(wavelengths, values)
    }

    pub fn eval(&self, lambda: Float) -> Float {
        match self {
            SpectrumCurve::Uniform(v) => *v,
            SpectrumCurve::Irregular { wavelengths, values } => {
                let n = wavelengths.len();
                if lambda < wavelengths[0] || lambda > wavelengths[n - 1] {
                    return 0.0;
                }
                let upper = wavelengths.partition_point(|w| *w <= lambda).min(n - 1).max(1);
                let lower = upper - 1;
                let span = wavelengths[upper] - wavelengths[lower];
                let t = if span > 0.0 { (lambda - wavelengths[lower]) / span } else { 0.0 };
                values[lower] * (1.0 - t) + values[upper] * t
            }
        }
    }

    pub fn eval_spectrum(&self, wavelengths: &SampledWavelengths) -> SampledSpectrum {
        let mut out = SampledSpectrum::zero();
        for idx in 0..SPECTRUM_SAMPLES {
            out[idx] = self.eval(wavelengths.lambda(idx));
        }
        out
    }

    pub fn range(&self) -> (Float, Float) {
        match self {
            SpectrumCurve::Uniform(_) => (MIN_WAVELENGTH, MAX_WAVELENGTH),
            SpectrumCurve::Irregular { wavelengths, .. } => {
                (wavelengths[0], wavelengths[wavelengths.len() - 1])
            }
        }
    }

    pub fn knots(&self) -> &[Float] {
        match self {
            SpectrumCurve::Uniform(_) => &[],
            SpectrumCurve::Irregular { wavelengths, .. } => wavelengths,
        }
    }

    pub fn min_spacing(&self) -> Option<Float> {
        self.knots()
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(None, |acc: Option<Float>, d| Some(acc.map_or(d, |a| a.min(d))))
    }

    pub fn max_value(&self) -> Float {
        match self {
            SpectrumCurve::Uniform(v) => *v,
            SpectrumCurve::Irregular { values, .. } => {
                values.iter().fold(FLOAT_LOWEST, |a, &b| a.max(b))
            }
        }
    }
}

/* Tests for spectra */
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampled_spectrum_arithmetic() {
        let a = SampledSpectrum::new([1.0, 2.0, 3.0, 4.0]);
        let b = SampledSpectrum::splat(2.0);
        assert_eq!((a * b)[3], 8.0);
        assert_eq!((a / 2.0)[1], 1.0);
        assert_eq!(a.max_value(), 4.0);
        assert_eq!(a.average(), 2.5);
        assert!(SampledSpectrum::zero().is_black());
        let c = a.safe_div(&SampledSpectrum::new([0.0, 1.0, 0.0, 2.0]));
        assert_eq!(c, SampledSpectrum::new([0.0, 2.0, 0.0, 2.0]));
    }

    #[test]
    fn test_wavelengths_stay_in_range() {
        for i in 0..50 {
            let u = i as Float / 50.0;
            let wl = SampledWavelengths::sample_visible(u);
            for l in wl.lambdas() {
                assert!(*l >= MIN_WAVELENGTH && *l <= MAX_WAVELENGTH);
            }
        }
    }

    #[test]
    fn test_irregular_curve_interpolates() {
        let curve = SpectrumCurve::irregular(vec![400.0, 500.0, 700.0], vec![1.0, 3.0, 1.0]).unwrap();
        assert!((curve.eval(450.0) - 2.0).abs() < 1e-5);
        assert!((curve.eval(500.0) - 3.0).abs() < 1e-5);
        assert!((curve.eval(600.0) - 2.0).abs() < 1e-5);
        assert_eq!(curve.eval(300.0), 0.0);
        assert_eq!(curve.range(), (400.0, 700.0));
        assert_eq!(curve.min_spacing(), Some(100.0));
    }

    #[test]
    fn test_irregular_curve_rejects_unsorted() {
        assert!(SpectrumCurve::irregular(vec![500.0, 400.0], vec![1.0, 1.0]).is_err());
        assert!(SpectrumCurve::irregular(vec![500.0], vec![1.0]).is_err());
    }
}
