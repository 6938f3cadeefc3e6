use super::per_kpoint::PerKpointWeights;
use crate::common::constants::PROCAR_PRINT_RESOLUTION;
use crate::domain::{
    BandFileHeader, EnergyRange, FermiLevel, ParsedBandFile, ProcarError, ProcarResult, Selection,
};
use crate::modules::fatband::band_energy_ranges;
use crate::numerics::KahanSum;
use ndarray::{Array1, Array2, Array3};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

const BAND_MODEL_SHAPE_PLACEHOLDER: &str = "INPUT.BAND_MODEL_SHAPE";

/// Zero-based array positions for a [`Selection`] after dropping ions and
/// orbitals the PROCAR does not contain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub ion_positions: Vec<usize>,
    pub orbital_positions: Vec<usize>,
}

impl ResolvedSelection {
    pub fn is_empty(&self) -> bool {
        self.ion_positions.is_empty() || self.orbital_positions.is_empty()
    }

    /// Every `(ion position, orbital position)` pair, ion-major.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.ion_positions.iter().flat_map(move |ion| {
            self.orbital_positions
                .iter()
                .map(move |orbital| (*ion, *orbital))
        })
    }
}

/// Dense arrays derived from a parsed PROCAR. Immutable after construction
/// except for the per-k-point expansion, which is filled at most once.
#[derive(Debug)]
pub struct BandModel {
    parsed: ParsedBandFile,
    fermi: FermiLevel,
    orbital_index: HashMap<String, usize>,
    energies: Array2<f64>,
    occupancies: Array2<f64>,
    weights: Array3<f64>,
    band_weights: Array1<f64>,
    reported_band_totals: Array1<f64>,
    per_kpoint: OnceLock<PerKpointWeights>,
}

impl BandModel {
    pub fn from_parsed(parsed: ParsedBandFile, fermi: FermiLevel) -> ProcarResult<Self> {
        validate_shape(&parsed)?;

        let kpoint_count = parsed.kpoint_count();
        let band_count = parsed.band_count();
        let ion_count = parsed.ion_count();
        let orbital_count = parsed.orbitals().len();

        let mut energies = Array2::zeros((band_count, kpoint_count));
        let mut occupancies = Array2::zeros((band_count, kpoint_count));
        let mut weights = Array3::zeros((band_count, ion_count, orbital_count));
        let mut band_sums = vec![KahanSum::default(); band_count];
        let mut reported_band_totals = Array1::<f64>::zeros(band_count);

        for (k, kpoint) in parsed.kpoints.iter().enumerate() {
            for (b, band) in kpoint.bands.iter().enumerate() {
                energies[[b, k]] = band.energy;
                occupancies[[b, k]] = band.occupancy;
                reported_band_totals[b] += band.total.total();
                for (i, ion) in band.ions.iter().enumerate() {
                    for (o, value) in ion.weights.values().iter().enumerate() {
                        weights[[b, i, o]] += *value;
                        band_sums[b].add(*value);
                    }
                }
            }
        }

        let band_weights = band_sums.iter().map(KahanSum::value).collect::<Array1<f64>>();
        let tolerance = PROCAR_PRINT_RESOLUTION * (kpoint_count * (orbital_count + 1)) as f64;
        for (band, (computed, reported)) in band_weights
            .iter()
            .zip(reported_band_totals.iter())
            .enumerate()
        {
            if (computed - reported).abs() > tolerance {
                debug!(
                    band = band + 1,
                    computed, reported, "summed projections differ from the printed tot column"
                );
            }
        }

        let orbital_index = parsed
            .orbitals()
            .iter()
            .enumerate()
            .map(|(position, label)| (label.clone(), position))
            .collect();

        debug!(
            bands = band_count,
            kpoints = kpoint_count,
            ions = ion_count,
            orbitals = orbital_count,
            fermi = fermi.energy,
            "band model built"
        );

        Ok(Self {
            parsed,
            fermi,
            orbital_index,
            energies,
            occupancies,
            weights,
            band_weights,
            reported_band_totals,
            per_kpoint: OnceLock::new(),
        })
    }

    pub fn header(&self) -> &BandFileHeader {
        &self.parsed.header
    }

    pub fn fermi(&self) -> FermiLevel {
        self.fermi
    }

    pub fn band_count(&self) -> usize {
        self.parsed.band_count()
    }

    pub fn kpoint_count(&self) -> usize {
        self.parsed.kpoint_count()
    }

    pub fn ion_count(&self) -> usize {
        self.parsed.ion_count()
    }

    pub fn orbitals(&self) -> &[String] {
        self.parsed.orbitals()
    }

    pub fn orbital_position(&self, label: &str) -> Option<usize> {
        self.orbital_index.get(label).copied()
    }

    /// Absolute band energies (eV), shape `(nb, nk)`.
    pub fn energies(&self) -> &Array2<f64> {
        &self.energies
    }

    pub fn relative_energies(&self) -> Array2<f64> {
        &self.energies - self.fermi.energy
    }

    pub fn occupancies(&self) -> &Array2<f64> {
        &self.occupancies
    }

    /// k-summed projections, shape `(nb, nion, norb)`.
    pub fn weights(&self) -> &Array3<f64> {
        &self.weights
    }

    /// Sum of every ion and orbital projection over all k-points, per band.
    pub fn band_weights(&self) -> &Array1<f64> {
        &self.band_weights
    }

    /// The file's own `tot` row summed over k-points.
    pub fn reported_band_totals(&self) -> &Array1<f64> {
        &self.reported_band_totals
    }

    pub fn kpoint_coordinates(&self) -> Vec<[f64; 3]> {
        self.parsed
            .kpoints
            .iter()
            .map(|kpoint| kpoint.coordinates)
            .collect()
    }

    pub fn kpoint_weights(&self) -> Vec<f64> {
        self.parsed.kpoints.iter().map(|kpoint| kpoint.weight).collect()
    }

    pub fn energy_ranges(&self) -> Vec<EnergyRange> {
        band_energy_ranges(&self.energies)
    }

    /// k-resolved projections. Built on first use; concurrent first callers
    /// block until the single expansion finishes and then share it.
    pub fn per_kpoint_weights(&self) -> &PerKpointWeights {
        self.per_kpoint
            .get_or_init(|| PerKpointWeights::expand(&self.parsed))
    }

    pub fn resolve_selection(&self, selection: &Selection) -> ResolvedSelection {
        let mut resolved = ResolvedSelection::default();
        for ion in &selection.ions {
            if (1..=self.ion_count()).contains(ion) {
                resolved.ion_positions.push(ion - 1);
            } else {
                debug!(ion, ion_count = self.ion_count(), "ignoring unknown ion in selection");
            }
        }
        for orbital in &selection.orbitals {
            match self.orbital_position(orbital) {
                Some(position) => resolved.orbital_positions.push(position),
                None => debug!(%orbital, "ignoring unknown orbital in selection"),
            }
        }
        resolved
    }

    /// Selected weight per band summed over k-points.
    pub fn compute_selected_weights(&self, selection: &Selection) -> Array1<f64> {
        let resolved = self.resolve_selection(selection);
        (0..self.band_count())
            .map(|band| {
                let mut sum = KahanSum::default();
                for (ion, orbital) in resolved.pairs() {
                    sum.add(self.weights[[band, ion, orbital]]);
                }
                sum.value()
            })
            .collect()
    }

    /// `(selected, totals)`, each of shape `(nb, nk)`.
    pub fn compute_per_kpoint_selected_weights(
        &self,
        selection: &Selection,
    ) -> (Array2<f64>, Array2<f64>) {
        let resolved = self.resolve_selection(selection);
        let per_kpoint = self.per_kpoint_weights();
        (per_kpoint.selected(&resolved), per_kpoint.totals().clone())
    }
}

fn validate_shape(parsed: &ParsedBandFile) -> ProcarResult<()> {
    let shape_error = |message: String| {
        ProcarError::input_validation(BAND_MODEL_SHAPE_PLACEHOLDER, message)
    };

    if parsed.kpoints.len() != parsed.kpoint_count() {
        return Err(shape_error(format!(
            "header declares {} k-points but {} were parsed",
            parsed.kpoint_count(),
            parsed.kpoints.len()
        )));
    }

    let orbital_count = parsed.orbitals().len();
    for kpoint in &parsed.kpoints {
        if kpoint.bands.len() != parsed.band_count() {
            return Err(shape_error(format!(
                "k-point {} holds {} bands; header declares {}",
                kpoint.index,
                kpoint.bands.len(),
                parsed.band_count()
            )));
        }
        for band in &kpoint.bands {
            if band.ions.len() != parsed.ion_count() {
                return Err(shape_error(format!(
                    "k-point {} band {} holds {} ions; header declares {}",
                    kpoint.index,
                    band.index,
                    band.ions.len(),
                    parsed.ion_count()
                )));
            }
            if let Some(ion) = band
                .ions
                .iter()
                .find(|ion| ion.weights.values().len() != orbital_count)
            {
                return Err(shape_error(format!(
                    "k-point {} band {} ion {} holds {} orbital values; expected {}",
                    kpoint.index,
                    band.index,
                    ion.index,
                    ion.weights.values().len(),
                    orbital_count
                )));
            }
        }
    }

    Ok(())
}
