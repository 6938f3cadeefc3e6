use super::ResolvedSelection;
use crate::domain::ParsedBandFile;
use ndarray::{Array2, Array3, Array4, Axis};
use tracing::debug;

/// k-resolved projections, shape `(nb, nk, nion, norb)`, with per-(band, k)
/// totals over every ion and orbital.
#[derive(Debug, Clone, PartialEq)]
pub struct PerKpointWeights {
    weights: Array4<f64>,
    totals: Array2<f64>,
}

impl PerKpointWeights {
    pub(super) fn expand(parsed: &ParsedBandFile) -> Self {
        let shape = (
            parsed.band_count(),
            parsed.kpoint_count(),
            parsed.ion_count(),
            parsed.orbitals().len(),
        );
        debug!(
            elements = shape.0 * shape.1 * shape.2 * shape.3,
            "expanding per-k-point weights"
        );

        let mut weights = Array4::zeros(shape);
        let mut totals = Array2::zeros((shape.0, shape.1));
        for (k, kpoint) in parsed.kpoints.iter().enumerate() {
            for (b, band) in kpoint.bands.iter().enumerate() {
                for (i, ion) in band.ions.iter().enumerate() {
                    for (o, value) in ion.weights.values().iter().enumerate() {
                        weights[[b, k, i, o]] = *value;
                        totals[[b, k]] += *value;
                    }
                }
            }
        }

        Self { weights, totals }
    }

    pub fn weights(&self) -> &Array4<f64> {
        &self.weights
    }

    pub fn totals(&self) -> &Array2<f64> {
        &self.totals
    }

    /// Selected weight per (band, k-point).
    pub fn selected(&self, selection: &ResolvedSelection) -> Array2<f64> {
        let (band_count, kpoint_count, _, _) = self.weights.dim();
        Array2::from_shape_fn((band_count, kpoint_count), |(b, k)| {
            selection
                .pairs()
                .map(|(i, o)| self.weights[[b, k, i, o]])
                .sum()
        })
    }

    /// Sums the k axis away, giving `(nb, nion, norb)`.
    pub fn collapse_kpoints(&self) -> Array3<f64> {
        self.weights.sum_axis(Axis(1))
    }
}
