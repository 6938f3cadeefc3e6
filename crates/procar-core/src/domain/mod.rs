pub mod errors;

pub use errors::{ParserResult, ProcarError, ProcarErrorCategory, ProcarResult};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandFileHeader {
    pub title: String,
    pub kpoint_count: usize,
    pub band_count: usize,
    pub ion_count: usize,
    pub orbitals: Vec<String>,
}

impl BandFileHeader {
    pub fn orbital_count(&self) -> usize {
        self.orbitals.len()
    }
}

/// One row of a PROCAR weight table: a value per orbital column plus the
/// aggregate printed in the trailing `tot` column.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalWeights {
    values: Vec<f64>,
    total: f64,
}

impl OrbitalWeights {
    pub fn new(values: Vec<f64>, total: f64) -> Self {
        Self { values, total }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IonRecord {
    pub index: usize,
    pub weights: OrbitalWeights,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandRecord {
    pub index: usize,
    pub energy: f64,
    pub occupancy: f64,
    pub ions: Vec<IonRecord>,
    pub total: OrbitalWeights,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KPointRecord {
    pub index: usize,
    pub coordinates: [f64; 3],
    pub weight: f64,
    pub bands: Vec<BandRecord>,
}

/// Fully parsed PROCAR contents. Built once by the parser and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBandFile {
    pub header: BandFileHeader,
    pub kpoints: Vec<KPointRecord>,
}

impl ParsedBandFile {
    pub fn kpoint_count(&self) -> usize {
        self.header.kpoint_count
    }

    pub fn band_count(&self) -> usize {
        self.header.band_count
    }

    pub fn ion_count(&self) -> usize {
        self.header.ion_count
    }

    pub fn orbitals(&self) -> &[String] {
        &self.header.orbitals
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FermiSource {
    File,
    AssumedZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FermiLevel {
    pub energy: f64,
    pub source: FermiSource,
}

impl FermiLevel {
    pub const fn verified(energy: f64) -> Self {
        Self {
            energy,
            source: FermiSource::File,
        }
    }

    pub const fn assumed_zero() -> Self {
        Self {
            energy: 0.0,
            source: FermiSource::AssumedZero,
        }
    }

    pub const fn is_verified(&self) -> bool {
        matches!(self.source, FermiSource::File)
    }

    /// Suffix for energies reported relative to this level.
    pub const fn reference_label(&self) -> &'static str {
        match self.source {
            FermiSource::File => "relative to E_F",
            FermiSource::AssumedZero => "relative to assumed E_F = 0",
        }
    }
}

impl Default for FermiLevel {
    fn default() -> Self {
        Self::assumed_zero()
    }
}

/// Ion numbers are 1-based, as printed in PROCAR.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub ions: BTreeSet<usize>,
    pub orbitals: BTreeSet<String>,
}

impl Selection {
    pub fn new<I, O, S>(ions: I, orbitals: O) -> Self
    where
        I: IntoIterator<Item = usize>,
        O: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ions: ions.into_iter().collect(),
            orbitals: orbitals.into_iter().map(Into::into).collect(),
        }
    }

    /// True when no (ion, orbital) pair can be selected.
    pub fn is_empty(&self) -> bool {
        self.ions.is_empty() || self.orbitals.is_empty()
    }

    pub fn contains(&self, ion: usize, orbital: &str) -> bool {
        self.ions.contains(&ion) && self.orbitals.contains(orbital)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyRange {
    pub min: f64,
    pub max: f64,
}

impl EnergyRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, energy: f64) -> bool {
        self.min <= energy && energy <= self.max
    }

    /// Either endpoint of `other` falls inside `self`, or `other` strictly
    /// encloses `self`.
    pub fn overlaps(&self, other: &EnergyRange) -> bool {
        self.contains(other.min)
            || self.contains(other.max)
            || (other.min < self.min && other.max > self.max)
    }

    pub fn union(&self, other: &EnergyRange) -> EnergyRange {
        EnergyRange::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn shifted(&self, delta: f64) -> EnergyRange {
        EnergyRange::new(self.min + delta, self.max + delta)
    }
}

/// A closed energy interval chosen by the caller. Built from two arbitrary
/// edges so the order of the edges does not matter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyWindow {
    pub min: f64,
    pub max: f64,
}

impl EnergyWindow {
    pub fn new(first_edge: f64, second_edge: f64) -> Self {
        Self {
            min: first_edge.min(second_edge),
            max: first_edge.max(second_edge),
        }
    }

    pub fn around(center: f64, half_width: f64) -> Self {
        Self::new(center - half_width.abs(), center + half_width.abs())
    }

    pub fn contains(&self, energy: f64) -> bool {
        self.min <= energy && energy <= self.max
    }

    pub fn intersects(&self, range: &EnergyRange) -> bool {
        !(range.max < self.min || range.min > self.max)
    }

    pub fn to_absolute(&self, fermi: &FermiLevel) -> Self {
        Self::new(self.min + fermi.energy, self.max + fermi.energy)
    }

    pub fn to_relative(&self, fermi: &FermiLevel) -> Self {
        Self::new(self.min - fermi.energy, self.max - fermi.energy)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    Approximate,
    #[default]
    Exact,
}

impl WindowMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approximate => "approximate",
            Self::Exact => "exact",
        }
    }
}

impl Display for WindowMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}
