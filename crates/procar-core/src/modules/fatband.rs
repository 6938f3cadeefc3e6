//! Groups bands with overlapping energy ranges into fatbands and ranks the
//! bands inside a fatband by their dominant ion/orbital character.
//!
//! Grouping is first-fit over bands in file order, so the result depends on
//! band ordering. A band that bridges two existing fatbands joins the first
//! one it touches; fatbands are never merged with each other afterwards.

use crate::domain::{EnergyRange, FermiLevel};
use crate::modules::band::BandModel;
use crate::numerics::min_max;
use ndarray::Array2;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fatband {
    pub energy_min: f64,
    pub energy_max: f64,
    /// Zero-based band indices in the order they joined.
    pub band_indices: Vec<usize>,
}

impl Fatband {
    fn seeded(band: usize, range: EnergyRange) -> Self {
        Self {
            energy_min: range.min,
            energy_max: range.max,
            band_indices: vec![band],
        }
    }

    fn absorb(&mut self, band: usize, range: EnergyRange) {
        let grown = self.range().union(&range);
        self.energy_min = grown.min;
        self.energy_max = grown.max;
        self.band_indices.push(band);
    }

    pub fn range(&self) -> EnergyRange {
        EnergyRange::new(self.energy_min, self.energy_max)
    }

    pub fn relative_to(&self, fermi: &FermiLevel) -> EnergyRange {
        self.range().shifted(-fermi.energy)
    }

    pub fn len(&self) -> usize {
        self.band_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.band_indices.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FatbandPartition {
    pub fatbands: Vec<Fatband>,
    pub band_ranges: Vec<EnergyRange>,
}

/// `[min, max]` of each row of a `(nb, nk)` energy array.
pub fn band_energy_ranges(energies: &Array2<f64>) -> Vec<EnergyRange> {
    energies
        .outer_iter()
        .map(|row| {
            // a band without k-points has no extent
            let (min, max) = min_max(row.iter().copied()).unwrap_or((0.0, 0.0));
            EnergyRange::new(min, max)
        })
        .collect()
}

pub fn identify_fatbands(energies: &Array2<f64>) -> FatbandPartition {
    let band_ranges = band_energy_ranges(energies);
    let mut fatbands: Vec<Fatband> = Vec::new();

    for (band, range) in band_ranges.iter().enumerate() {
        match fatbands
            .iter_mut()
            .find(|fatband| fatband.range().overlaps(range))
        {
            Some(fatband) => fatband.absorb(band, *range),
            None => fatbands.push(Fatband::seeded(band, *range)),
        }
    }

    FatbandPartition {
        fatbands,
        band_ranges,
    }
}

/// Position of the first fatband whose closed range holds `energy`.
pub fn fatband_containing(fatbands: &[Fatband], energy: f64) -> Option<usize> {
    fatbands
        .iter()
        .position(|fatband| fatband.range().contains(energy))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandContribution {
    /// 1-based, as printed in PROCAR.
    pub ion: usize,
    pub orbital: String,
    pub weight: f64,
}

impl BandContribution {
    pub fn label(&self) -> String {
        format!("I{}:{}", self.ion, self.orbital)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FatbandBandSummary {
    pub band_index: usize,
    pub energy_min: f64,
    pub energy_max: f64,
    pub contributions: Vec<BandContribution>,
    pub top_weight: f64,
}

impl FatbandBandSummary {
    /// 1-based band number for display.
    pub fn band_number(&self) -> usize {
        self.band_index + 1
    }
}

/// Every (ion, orbital) weight of `band`, heaviest first. Ties keep ion-major,
/// orbital-column order.
pub(crate) fn ranked_contributions(model: &BandModel, band: usize) -> Vec<BandContribution> {
    let weights = model.weights();
    let mut contributions = Vec::with_capacity(model.ion_count() * model.orbitals().len());
    for ion in 0..model.ion_count() {
        for (position, orbital) in model.orbitals().iter().enumerate() {
            contributions.push(BandContribution {
                ion: ion + 1,
                orbital: orbital.clone(),
                weight: weights[[band, ion, position]],
            });
        }
    }
    contributions.sort_by(|lhs, rhs| rhs.weight.total_cmp(&lhs.weight));
    contributions
}

/// Per-band summaries for one fatband, ordered by each band's single largest
/// contribution, heaviest first.
pub fn fatband_info(
    model: &BandModel,
    fatband: &Fatband,
    band_ranges: &[EnergyRange],
    top_n: usize,
) -> Vec<FatbandBandSummary> {
    let mut summaries = fatband
        .band_indices
        .iter()
        .filter_map(|&band| {
            let range = band_ranges.get(band)?;
            let mut contributions = ranked_contributions(model, band);
            contributions.truncate(top_n);
            let top_weight = contributions.first().map_or(0.0, |top| top.weight);
            Some(FatbandBandSummary {
                band_index: band,
                energy_min: range.min,
                energy_max: range.max,
                contributions,
                top_weight,
            })
        })
        .collect::<Vec<_>>();

    summaries.sort_by(|lhs, rhs| rhs.top_weight.total_cmp(&lhs.top_weight));
    summaries
}

pub fn find_band_summary(
    summaries: &[FatbandBandSummary],
    band_index: usize,
) -> Option<&FatbandBandSummary> {
    summaries
        .iter()
        .find(|summary| summary.band_index == band_index)
}
