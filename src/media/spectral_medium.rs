// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::error::ConfigError;
use crate::core::medium::{null_coefficient, Medium, MediumInteraction};
use crate::core::phase::PhaseFunction;
use crate::core::volume::Volume;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f, MIN_MAJORANT};
use crate::math::spectrum::{SampledSpectrum, SampledWavelengths, SpectrumCurve,
                            MAX_WAVELENGTH, MIN_WAVELENGTH, SPECTRUM_SAMPLES};
use crate::media::heterogeneous_medium::DEFAULT_MAX_FACTOR;
use crate::phases::isotropic::IsotropicPhase;
use std::collections::BTreeMap;
use std::sync::Arc;

const SIGMA_T_PREFIX: &str = "sigma_t_";
const ALBEDO_PREFIX: &str = "albedo_";
const MAX_MAJORANT_KNOTS: usize = 4096;
// Mixtures up to this size read their proportions without allocating.
const INLINE_COMPOUNDS: usize = 8;

/// One named component of the mixture.
#[derive(Debug, Clone)]
pub struct Compound {
    pub name: String,
    pub sigma_t: SpectrumCurve,
    pub albedo: SpectrumCurve,
}

/// Mixture of compounds whose local proportions come from one volume
/// channel each. Channel `i` belongs to the `i`-th compound in alphabetical
/// order of the compound names.
pub struct SpectralMedium {
    id: String,
    proportions: Arc<dyn Volume>,
    compounds: Vec<Compound>,
    scale: Float,
    max_factor: Float,
    phase: Box<dyn PhaseFunction>,
    bbox: Option<AABB>,
    majorant: SpectrumCurve,
}

/// Groups `sigma_t_<id>` / `albedo_<id>` pairs into compounds sorted by id.
pub fn bind_compounds(spectra: BTreeMap<String, SpectrumCurve>) -> Result<Vec<Compound>, ConfigError> {
    let mut pairs: BTreeMap<String, (Option<SpectrumCurve>, Option<SpectrumCurve>)> = BTreeMap::new();
    for (key, curve) in spectra {
        let (name, is_sigma_t) = if let Some(name) = key.strip_prefix(SIGMA_T_PREFIX) {
            (name, true)
        } else if let Some(name) = key.strip_prefix(ALBEDO_PREFIX) {
            (name, false)
        } else {
            return Err(ConfigError::CompoundNaming(
                format!("`{}` starts with neither `{}` nor `{}`", key, SIGMA_T_PREFIX, ALBEDO_PREFIX)));
        };
        if name.is_empty() {
            return Err(ConfigError::CompoundNaming(format!("`{}` has an empty compound name", key)));
        }
        let entry = pairs.entry(name.to_string()).or_insert((None, None));
        if is_sigma_t {
            entry.0 = Some(curve);
        } else {
            entry.1 = Some(curve);
        }
    }

    if pairs.is_empty() {
        return Err(ConfigError::CompoundNaming("no compounds were given".to_string()));
    }

    let mut compounds = Vec::with_capacity(pairs.len());
    for (name, pair) in pairs {
        match pair {
            (Some(sigma_t), Some(albedo)) => compounds.push(Compound { name, sigma_t, albedo }),
            (None, _) => return Err(ConfigError::CompoundNaming(
                format!("compound `{}` has no `{}{}`", name, SIGMA_T_PREFIX, name))),
            (_, None) => return Err(ConfigError::CompoundNaming(
                format!("compound `{}` has no `{}{}`", name, ALBEDO_PREFIX, name))),
        }
    }
    Ok(compounds)
}

/// Wavelength knots on which a weighted sum of the `sigma_t` curves is
/// exactly piecewise linear: a uniform grid at the finest knot spacing,
/// merged with every compound knot. Covers at least the sampled range.
fn majorant_knots(compounds: &[Compound]) -> Vec<Float> {
    let mut lo = MIN_WAVELENGTH;
    let mut hi = MAX_WAVELENGTH;
    let mut spacing = Float::INFINITY;
    for compound in compounds {
        if let Some(step) = compound.sigma_t.min_spacing() {
            let (a, b) = compound.sigma_t.range();
            lo = lo.min(a);
            hi = hi.max(b);
            spacing = spacing.min(step);
        }
    }

    let mut knots: Vec<Float> = Vec::new();
    if spacing.is_finite() && spacing > 0.0 {
        let count = (((hi - lo) / spacing).ceil() as usize + 1).min(MAX_MAJORANT_KNOTS).max(2);
        let step = (hi - lo) / ((count - 1) as Float);
        knots.extend((0..count).map(|i| lo + step * i as Float));
    } else {
        knots.push(lo);
        knots.push(hi);
    }
    for compound in compounds {
        knots.extend_from_slice(compound.sigma_t.knots());
    }
    knots.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    knots.dedup_by(|a, b| (*a - *b).abs() < 1e-4);
    knots
}

impl SpectralMedium {
    /// `spectra` maps `sigma_t_<id>` and `albedo_<id>` to curves. The
    /// medium is unbounded when `proportions` has no bounding box.
    pub fn new(proportions: Arc<dyn Volume>, spectra: BTreeMap<String, SpectrumCurve>) -> Result<Self, ConfigError> {
        let id = generate_node_id("SpectralMedium");
        let compounds = bind_compounds(spectra)?;
        let bbox = Self::check_proportions(proportions.as_ref(), compounds.len(), &id)?;
        log::debug!("{}: compounds {:?}", id, compounds.iter().map(|c| c.name.as_str()).collect::<Vec<_>>());
        let mut medium = Self {
            id,
            proportions,
            compounds,
            scale: 1.0,
            max_factor: DEFAULT_MAX_FACTOR,
            phase: Box::new(IsotropicPhase::new()),
            bbox,
            majorant: SpectrumCurve::uniform(MIN_MAJORANT),
        };
        medium.parameters_changed();
        Ok(medium)
    }

    fn check_proportions(proportions: &dyn Volume, compounds: usize, id: &str)
        -> Result<Option<AABB>, ConfigError> {
        if proportions.channels() != compounds {
            return Err(ConfigError::ChannelMismatch { expected: compounds, actual: proportions.channels() });
        }
        match proportions.bbox() {
            Some(bbox) if !bbox.is_solid() => Err(ConfigError::InvalidBoundingBox(id.to_string())),
            bbox => Ok(bbox),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_scale(mut self, scale: Float) -> Result<Self, ConfigError> {
        self.set_scale(scale)?;
        Ok(self)
    }

    pub fn with_phase(mut self, phase: Box<dyn PhaseFunction>) -> Self {
        self.phase = phase;
        self
    }

    pub fn set_scale(&mut self, scale: Float) -> Result<(), ConfigError> {
        if !(scale >= 0.0) || !scale.is_finite() {
            return Err(ConfigError::invalid_parameter("scale", format!("{} is not a finite non-negative number", scale)));
        }
        self.scale = scale;
        self.parameters_changed();
        Ok(())
    }

    pub fn set_max_factor(&mut self, max_factor: Float) -> Result<(), ConfigError> {
        if !(max_factor >= 1.0) || !max_factor.is_finite() {
            return Err(ConfigError::invalid_parameter("max_factor", format!("{} is below 1", max_factor)));
        }
        self.max_factor = max_factor;
        self.parameters_changed();
        Ok(())
    }

    pub fn set_proportions(&mut self, proportions: Arc<dyn Volume>) -> Result<(), ConfigError> {
        self.bbox = Self::check_proportions(proportions.as_ref(), self.compounds.len(), &self.id)?;
        self.proportions = proportions;
        self.parameters_changed();
        Ok(())
    }

    pub fn compounds(&self) -> &[Compound] {
        &self.compounds
    }

    pub fn majorant_curve(&self) -> &SpectrumCurve {
        &self.majorant
    }

    pub fn parameters_changed(&mut self) {
        let max_proportions: Vec<Float> = self.proportions.max_per_channel()
            .iter()
            .map(|p| p.max(0.0))
            .collect();
        let factor = self.max_factor * self.scale;
        let bound = |lambda: Float| {
            let sum: Float = self.compounds.iter()
                .zip(max_proportions.iter())
                .map(|(c, p)| p * c.sigma_t.eval(lambda).max(0.0))
                .sum();
            (factor * sum).max(MIN_MAJORANT)
        };

        self.majorant = if self.compounds.iter().all(|c| c.sigma_t.knots().is_empty()) {
            SpectrumCurve::uniform(bound(MIN_WAVELENGTH))
        } else {
            let knots = majorant_knots(&self.compounds);
            let values = knots.iter().map(|l| bound(*l)).collect();
            match SpectrumCurve::irregular(knots, values) {
                Ok(curve) => curve,
                Err(err) => {
                    log::warn!("{}: falling back to a flat majorant ({})", self.id, err);
                    let peak = self.compounds.iter()
                        .zip(max_proportions.iter())
                        .map(|(c, p)| p * c.sigma_t.max_value().max(0.0))
                        .sum::<Float>();
                    SpectrumCurve::uniform((factor * peak).max(MIN_MAJORANT))
                }
            }
        };
        log::debug!("{}: spectral majorant peak {}", self.id, self.majorant.max_value());
    }

    /// Weighted `(sigma_s, sigma_t)` of the mixture at `p`.
    fn mixture(&self, p: Vector3f, wavelengths: &SampledWavelengths) -> (SampledSpectrum, SampledSpectrum) {
        let count = self.compounds.len();
        let mut inline = [0.0 as Float; INLINE_COMPOUNDS];
        let mut spilled: Vec<Float>;
        let proportions: &mut [Float] = if count <= INLINE_COMPOUNDS {
            &mut inline[..count]
        } else {
            spilled = vec![0.0; count];
            &mut spilled
        };
        self.proportions.eval_into(p, proportions);
        let mut sigma_s = SampledSpectrum::zero();
        let mut sigma_t = SampledSpectrum::zero();
        for (compound, proportion) in self.compounds.iter().zip(proportions.iter()) {
            let proportion = proportion.max(0.0);
            if proportion == 0.0 {
                continue;
            }
            for lane in 0..SPECTRUM_SAMPLES {
                let lambda = wavelengths.lambda(lane);
                let st = proportion * compound.sigma_t.eval(lambda).max(0.0);
                sigma_t[lane] += st;
                sigma_s[lane] += st * compound.albedo.eval(lambda).max(0.0).min(1.0);
            }
        }
        (sigma_s * self.scale, sigma_t * self.scale)
    }
}

impl ComputationNode for SpectralMedium {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("SpectralMedium [id={}, compounds={}, scale={}]", self.id, self.compounds.len(), self.scale)
    }
}

impl Medium for SpectralMedium {
    fn phase_function(&self) -> &dyn PhaseFunction {
        self.phase.as_ref()
    }

    fn get_majorant(&self, _p_world: &Vector3f, wavelengths: &SampledWavelengths) -> SampledSpectrum {
        self.majorant.eval_spectrum(wavelengths).map(|v| v.max(MIN_MAJORANT))
    }

    fn get_scattering_coefficients(&self, mi: &MediumInteraction)
        -> (SampledSpectrum, SampledSpectrum, SampledSpectrum) {
        let (sigma_s, sigma_t) = self.mixture(mi.p, &mi.wavelengths);
        let sigma_n = null_coefficient(&mi.combined_extinction, &sigma_t);
        (sigma_s, sigma_n, sigma_t)
    }

    fn bbox(&self) -> Option<AABB> {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::LcgRng;
    use crate::math::ray::Ray3f;
    use crate::volumes::const_volume::ConstantVolume;
    use crate::volumes::grid_volume::GridVolume;

    fn two_compounds() -> BTreeMap<String, SpectrumCurve> {
        let mut spectra = BTreeMap::new();
        spectra.insert("sigma_t_water".to_string(),
                       SpectrumCurve::irregular(vec![400.0, 550.0, 700.0], vec![0.5, 2.0, 1.0]).unwrap());
        spectra.insert("albedo_water".to_string(), SpectrumCurve::uniform(0.9));
        spectra.insert("sigma_t_ink".to_string(),
                       SpectrumCurve::irregular(vec![380.0, 480.0, 580.0, 680.0, 780.0],
                                                vec![3.0, 0.2, 1.5, 0.1, 2.5]).unwrap());
        spectra.insert("albedo_ink".to_string(), SpectrumCurve::uniform(0.1));
        spectra
    }

    fn interaction(medium: Arc<dyn Medium>, p: Vector3f, wavelengths: SampledWavelengths) -> MediumInteraction {
        let ray = Ray3f::new(p, Vector3f::new(0.0, 0.0, 1.0), None, None).with_wavelengths(wavelengths);
        let mut mi = MediumInteraction::new(medium.clone(), &ray);
        mi.combined_extinction = medium.get_majorant(&p, &wavelengths);
        mi
    }

    #[test]
    fn test_even_mixture_is_mean_extinction() {
        let spectra = two_compounds();
        let ink = spectra["sigma_t_ink"].clone();
        let water = spectra["sigma_t_water"].clone();
        let medium: Arc<dyn Medium> = Arc::new(
            SpectralMedium::new(Arc::new(ConstantVolume::new_channels(vec![0.5, 0.5])), spectra).unwrap());
        let wl = SampledWavelengths::fixed([420.0, 500.0, 610.0, 690.0]);
        let mi = interaction(medium.clone(), Vector3f::zeros(), wl);
        let (sigma_s, sigma_n, sigma_t) = medium.get_scattering_coefficients(&mi);
        for lane in 0..SPECTRUM_SAMPLES {
            let lambda = wl.lambda(lane);
            let expected = 0.5 * (ink.eval(lambda) + water.eval(lambda));
            assert!((sigma_t[lane] - expected).abs() < 1e-5);
            let expected_s = 0.5 * (0.1 * ink.eval(lambda) + 0.9 * water.eval(lambda));
            assert!((sigma_s[lane] - expected_s).abs() < 1e-5);
            assert!(sigma_n[lane] >= 0.0);
        }
    }

    #[test]
    fn test_large_mixture_matches_weighted_sum() {
        // More compounds than the inline proportion buffer holds.
        let count = INLINE_COMPOUNDS + 3;
        let mut spectra = BTreeMap::new();
        for i in 0..count {
            spectra.insert(format!("sigma_t_c{:02}", i), SpectrumCurve::uniform(1.0 + i as Float));
            spectra.insert(format!("albedo_c{:02}", i), SpectrumCurve::uniform(0.5));
        }
        let proportions = ConstantVolume::new_channels(vec![1.0 / count as Float; count]);
        let medium: Arc<dyn Medium> = Arc::new(SpectralMedium::new(Arc::new(proportions), spectra).unwrap());
        let mi = interaction(medium.clone(), Vector3f::zeros(), SampledWavelengths::default());
        let (sigma_s, _, sigma_t) = medium.get_scattering_coefficients(&mi);
        let expected = (1..=count).map(|v| v as Float).sum::<Float>() / count as Float;
        assert!((sigma_t[0] - expected).abs() < 1e-4, "sigma_t {}", sigma_t[0]);
        assert!((sigma_s[0] - 0.5 * expected).abs() < 1e-4);
    }

    #[test]
    fn test_channel_order_is_alphabetical() {
        let medium = SpectralMedium::new(Arc::new(ConstantVolume::new_channels(vec![1.0, 0.0])), two_compounds()).unwrap();
        assert_eq!(medium.compounds()[0].name, "ink");
        assert_eq!(medium.compounds()[1].name, "water");
    }

    #[test]
    fn test_spectral_majorant_bounds_extinction() {
        let res = 5;
        let mut rng = LcgRng::new(17);
        let data = (0..res * res * res * 2).map(|_| rng.next_1d()).collect();
        let bbox = AABB::new(Vector3f::zeros(), Vector3f::new(1.0, 1.0, 1.0));
        let proportions = Arc::new(GridVolume::from_data([res, res, res], 2, data, bbox).unwrap());
        let medium: Arc<dyn Medium> = Arc::new(
            SpectralMedium::new(proportions, two_compounds()).unwrap().with_scale(3.0).unwrap());

        for _ in 0..4000 {
            let p = Vector3f::new(rng.next_1d(), rng.next_1d(), rng.next_1d());
            let wl = SampledWavelengths::sample_visible(rng.next_1d());
            let mi = interaction(medium.clone(), p, wl);
            let (_, _, sigma_t) = medium.get_scattering_coefficients(&mi);
            for lane in 0..SPECTRUM_SAMPLES {
                assert!(mi.combined_extinction[lane] >= sigma_t[lane],
                        "lane {} at {}nm: {} < {}", lane, wl.lambda(lane), mi.combined_extinction[lane], sigma_t[lane]);
            }
        }
    }

    #[test]
    fn test_naming_errors() {
        let proportions: Arc<dyn Volume> = Arc::new(ConstantVolume::new_channels(vec![1.0]));

        let mut unpaired = BTreeMap::new();
        unpaired.insert("sigma_t_smoke".to_string(), SpectrumCurve::uniform(1.0));
        assert!(matches!(SpectralMedium::new(proportions.clone(), unpaired), Err(ConfigError::CompoundNaming(_))));

        let mut unknown = BTreeMap::new();
        unknown.insert("sigma_t_smoke".to_string(), SpectrumCurve::uniform(1.0));
        unknown.insert("albedo_smoke".to_string(), SpectrumCurve::uniform(1.0));
        unknown.insert("density_smoke".to_string(), SpectrumCurve::uniform(1.0));
        assert!(matches!(SpectralMedium::new(proportions.clone(), unknown), Err(ConfigError::CompoundNaming(_))));

        assert!(matches!(SpectralMedium::new(proportions.clone(), BTreeMap::new()), Err(ConfigError::CompoundNaming(_))));

        assert!(matches!(SpectralMedium::new(proportions, two_compounds()),
                         Err(ConfigError::ChannelMismatch { expected: 2, actual: 1 })));
    }

    #[test]
    fn test_albedo_is_zero_where_extinction_vanishes() {
        let medium: Arc<dyn Medium> = Arc::new(
            SpectralMedium::new(Arc::new(ConstantVolume::new_channels(vec![0.0, 0.0])), two_compounds()).unwrap());
        let mi = interaction(medium.clone(), Vector3f::zeros(), SampledWavelengths::default());
        assert!(medium.get_albedo(&mi).is_black());
        assert!(medium.get_majorant(&Vector3f::zeros(), &SampledWavelengths::default()).min_value() >= MIN_MAJORANT);
    }
}
