// Copyright @yucwang 2026

use super::constants::{ Float, Vector3f };
use super::spectrum::{ SampledSpectrum, SampledWavelengths, SPECTRUM_SAMPLES };

/// Integral of the CIE 1931 `y` matching function over the visible range.
pub const CIE_Y_INTEGRAL: Float = 106.856895;

// Piecewise gaussian lobe of the multi-lobe CMF fit by Wyman et al. (2013).
fn lobe(lambda: Float, mu: Float, sigma_lo: Float, sigma_hi: Float) -> Float {
    let sigma = if lambda < mu { sigma_lo } else { sigma_hi };
    let t = (lambda - mu) / sigma;
    (-0.5 * t * t).exp()
}

/// CIE 1931 colour matching functions at `lambda` (nm).
pub fn cie_xyz(lambda: Float) -> Vector3f {
    let x = 1.056 * lobe(lambda, 599.8, 37.9, 31.0)
        + 0.362 * lobe(lambda, 442.0, 16.0, 26.7)
        - 0.065 * lobe(lambda, 501.1, 20.4, 26.2);
    let y = 0.821 * lobe(lambda, 568.8, 46.9, 40.5)
        + 0.286 * lobe(lambda, 530.9, 16.3, 31.1);
    let z = 1.217 * lobe(lambda, 437.0, 11.8, 36.0)
        + 0.681 * lobe(lambda, 459.0, 26.0, 13.8);
    Vector3f::new(x, y, z)
}

/// Monte Carlo estimate of XYZ from a radiance sample and the wavelengths it
/// was carried on.
pub fn spectrum_to_xyz(radiance: &SampledSpectrum, wavelengths: &SampledWavelengths) -> Vector3f {
    let pdf = wavelengths.pdf();
    let mut xyz = Vector3f::zeros();
    for idx in 0..SPECTRUM_SAMPLES {
        if pdf[idx] <= 0.0 {
            continue;
        }
        xyz += cie_xyz(wavelengths.lambda(idx)) * (radiance[idx] / pdf[idx]);
    }
    xyz / (SPECTRUM_SAMPLES as Float * CIE_Y_INTEGRAL)
}

pub fn xyz_to_linear_srgb(xyz: &Vector3f) -> Vector3f {
    Vector3f::new(
         3.2404542 * xyz.x - 1.5371385 * xyz.y - 0.4985314 * xyz.z,
        -0.9692660 * xyz.x + 1.8760108 * xyz.y + 0.0415560 * xyz.z,
         0.0556434 * xyz.x - 0.2040259 * xyz.y + 1.0572252 * xyz.z)
}

pub fn spectrum_to_srgb(radiance: &SampledSpectrum, wavelengths: &SampledWavelengths) -> Vector3f {
    xyz_to_linear_srgb(&spectrum_to_xyz(radiance, wavelengths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::spectrum::{ MIN_WAVELENGTH, MAX_WAVELENGTH };

    #[test]
    fn test_y_integral_matches_fit() {
        let mut sum = 0.0;
        let mut lambda = MIN_WAVELENGTH;
        while lambda < MAX_WAVELENGTH {
            sum += cie_xyz(lambda + 0.5).y;
            lambda += 1.0;
        }
        assert!((sum / CIE_Y_INTEGRAL - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_unit_spectrum_has_unit_luminance() {
        let n = 512;
        let mut y = 0.0;
        for i in 0..n {
            let wl = SampledWavelengths::sample_visible((i as Float + 0.5) / n as Float);
            y += spectrum_to_xyz(&SampledSpectrum::one(), &wl).y;
        }
        assert!((y / n as Float - 1.0).abs() < 0.02);
    }
}
