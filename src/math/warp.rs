// Copyright @yucwang 2023

use super::constants::{ INV_FOUR_PI, INV_PI, PI, Float, Vector2f, Vector3f };

pub fn sample_uniform_sphere(u: &Vector2f) -> Vector3f {
    let z: Float = 1.0 - 2.0 * u.x;
    let r: Float = (1. - z * z).max(0.0).sqrt();
    let phi: Float = 2. * PI * u.y;

    return Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

pub fn sample_uniform_disk_concentric(u: &Vector2f) -> Vector2f {
    let r1: Float = 2.0 * u.x - 1.0;
    let r2: Float = 2.0 * u.y - 1.0;

    let phi: Float;
    let r:   Float;

    if r1 == 0. && r2 == 0. {
        r = 0.0;
        phi = 0.0;
    } else if r1 * r1 > r2 * r2 {
        r = r1;
        phi = (PI / 4.0) * (r2 / r1);
    } else {
        r = r2;
        phi = (PI / 2.0) - (r1 / r2) * (PI / 4.0);
    }

    let (sin_phi, cos_phi) = phi.sin_cos();

    return Vector2f::new(r * cos_phi, r * sin_phi)
}

pub fn sample_cosine_hemisphere(u: &Vector2f) -> Vector3f {
    let p = sample_uniform_disk_concentric(&u);
    let z = (1. - p.x * p.x - p.y * p.y).max(0.0).sqrt();

    return Vector3f::new(p.x, p.y, z)
}

pub fn sample_cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    return cos_theta.max(0.0) * INV_PI;
}

/// Henyey-Greenstein phase value for the cosine between the propagation
/// direction and the outgoing direction; `g > 0` favours forward scattering.
pub fn henyey_greenstein(cos_theta: Float, g: Float) -> Float {
    let denom = 1.0 + g * g - 2.0 * g * cos_theta;
    INV_FOUR_PI * (1.0 - g * g) / (denom * denom.max(1e-12).sqrt())
}

/// Samples a direction in the local frame whose `z` is the propagation
/// direction, distributed according to Henyey-Greenstein.
pub fn sample_henyey_greenstein(u: &Vector2f, g: Float) -> Vector3f {
    let cos_theta = if g.abs() < 1e-3 {
        1.0 - 2.0 * u.x
    } else {
        let sqr = (1.0 - g * g) / (1.0 - g + 2.0 * g * u.x);
        (1.0 + g * g - sqr * sqr) / (2.0 * g)
    };
    let cos_theta = cos_theta.max(-1.0).min(1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * PI * u.y;
    Vector3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_hemisphere_upper() {
        for i in 0..16 {
            for j in 0..16 {
                let u = Vector2f::new((i as Float + 0.5) / 16.0, (j as Float + 0.5) / 16.0);
                let v = sample_cosine_hemisphere(&u);
                assert!(v.z >= 0.0);
                assert!((v.norm() - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_henyey_greenstein_isotropic_limit() {
        assert!((henyey_greenstein(0.3, 0.0) - INV_FOUR_PI).abs() < 1e-6);
        let v = sample_uniform_sphere(&Vector2f::new(0.25, 0.5));
        assert!((v.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_henyey_greenstein_integrates_to_one() {
        let g = 0.6;
        let n = 2000;
        let mut sum = 0.0;
        for i in 0..n {
            let mu = -1.0 + 2.0 * (i as Float + 0.5) / (n as Float);
            sum += henyey_greenstein(mu, g) * 2.0 * PI * (2.0 / n as Float);
        }
        assert!((sum - 1.0).abs() < 1e-2);
    }
}
