//! Selected-versus-total weight inside an energy window.
//!
//! Windows passed to this module are in absolute energies (eV, same
//! reference as the PROCAR). [`WindowStatistics`] carries both the absolute
//! window and its Fermi-relative counterpart.

use crate::common::AnalysisConfig;
use crate::common::constants::{
    DEFAULT_OTHER_CONTRIBUTOR_LIMIT, DEGENERATE_BAND_TOLERANCE, SPIN_ORBIT_MULTIPLIER,
};
use crate::domain::{EnergyRange, EnergyWindow, Selection, WindowMode};
use crate::modules::band::BandModel;
use crate::modules::fatband::BandContribution;
use crate::numerics::{KahanSum, safe_ratio, stable_sum};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Bands whose `[min, max]` range intersects `window`, in band order.
pub fn bands_in_window(band_ranges: &[EnergyRange], window: &EnergyWindow) -> Vec<usize> {
    band_ranges
        .iter()
        .enumerate()
        .filter(|(_, range)| window.intersects(range))
        .map(|(band, _)| band)
        .collect()
}

/// Share of a band's energy span covered by `window`, in `[0, 1]`. A flat
/// band counts fully when its energy lies inside the window, else not at all.
pub fn overlap_fraction(range: &EnergyRange, window: &EnergyWindow) -> f64 {
    if range.span() < DEGENERATE_BAND_TOLERANCE {
        return if window.contains(range.min) { 1.0 } else { 0.0 };
    }
    let overlap = range.max.min(window.max) - range.min.max(window.min);
    (overlap / range.span()).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowWeights {
    pub selected: f64,
    pub total: f64,
}

/// Band-level estimate: each intersecting band contributes its k-summed
/// weights scaled by [`overlap_fraction`].
pub fn approximate_window_weights(
    model: &BandModel,
    selection: &Selection,
    window: &EnergyWindow,
) -> WindowWeights {
    let band_ranges = model.energy_ranges();
    let selected_weights = model.compute_selected_weights(selection);
    let band_weights = model.band_weights();

    let mut selected = KahanSum::default();
    let mut total = KahanSum::default();
    for band in bands_in_window(&band_ranges, window) {
        let fraction = overlap_fraction(&band_ranges[band], window);
        selected.add(fraction * selected_weights[band]);
        total.add(fraction * band_weights[band]);
    }

    WindowWeights {
        selected: selected.value(),
        total: total.value(),
    }
}

/// Per-k-point accumulation over every (band, k-point) whose energy lies in
/// the closed window. The total covers every ion and orbital.
pub fn exact_window_weights(
    model: &BandModel,
    selection: &Selection,
    window: &EnergyWindow,
) -> WindowWeights {
    let (selected_per_kpoint, totals_per_kpoint) =
        model.compute_per_kpoint_selected_weights(selection);

    let mut selected = KahanSum::default();
    let mut total = KahanSum::default();
    for ((position, energy), selected_weight) in model
        .energies()
        .indexed_iter()
        .zip(selected_per_kpoint.iter())
    {
        if window.contains(*energy) {
            selected.add(*selected_weight);
            total.add(totals_per_kpoint[position]);
        }
    }

    WindowWeights {
        selected: selected.value(),
        total: total.value(),
    }
}

pub fn window_weights(
    model: &BandModel,
    selection: &Selection,
    window: &EnergyWindow,
    mode: WindowMode,
) -> WindowWeights {
    match mode {
        WindowMode::Approximate => approximate_window_weights(model, selection, window),
        WindowMode::Exact => exact_window_weights(model, selection, window),
    }
}

pub fn wannier_function_count(selection: &Selection, spin_orbit: bool) -> usize {
    let multiplier = if spin_orbit { SPIN_ORBIT_MULTIPLIER } else { 1 };
    selection.ions.len() * selection.orbitals.len() * multiplier
}

/// Heaviest (ion, orbital) pairs outside `selection`, summed over `bands`.
/// Pairs with no weight are dropped.
pub fn other_contributors(
    model: &BandModel,
    selection: &Selection,
    bands: &[usize],
    limit: usize,
) -> Vec<BandContribution> {
    let weights = model.weights();
    let mut sums: HashMap<(usize, usize), KahanSum> = HashMap::new();
    for &band in bands {
        for ion in 0..model.ion_count() {
            for (position, orbital) in model.orbitals().iter().enumerate() {
                if selection.contains(ion + 1, orbital) {
                    continue;
                }
                sums.entry((ion, position))
                    .or_default()
                    .add(weights[[band, ion, position]]);
            }
        }
    }

    let mut contributors = sums
        .into_iter()
        .map(|((ion, position), sum)| BandContribution {
            ion: ion + 1,
            orbital: model.orbitals()[position].clone(),
            weight: sum.value(),
        })
        .filter(|contribution| contribution.weight > 0.0)
        .collect::<Vec<_>>();
    // HashMap order is arbitrary; fix the tie order before ranking.
    contributors.sort_by(|lhs, rhs| {
        rhs.weight
            .total_cmp(&lhs.weight)
            .then(lhs.ion.cmp(&rhs.ion))
            .then_with(|| {
                model
                    .orbital_position(&lhs.orbital)
                    .cmp(&model.orbital_position(&rhs.orbital))
            })
    });
    contributors.truncate(limit);
    contributors
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowOptions {
    pub mode: WindowMode,
    pub spin_orbit: bool,
    pub other_contributor_limit: usize,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            mode: WindowMode::default(),
            spin_orbit: false,
            other_contributor_limit: DEFAULT_OTHER_CONTRIBUTOR_LIMIT,
        }
    }
}

impl From<&AnalysisConfig> for WindowOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            mode: config.window_mode,
            spin_orbit: config.spin_orbit,
            other_contributor_limit: config.other_contributor_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStatistics {
    pub mode: WindowMode,
    pub absolute_window: EnergyWindow,
    pub relative_window: EnergyWindow,
    pub fermi_verified: bool,
    pub selected_in_window: f64,
    pub total_in_window: f64,
    /// Selected weight over every band and k-point.
    pub total_selected: f64,
    pub selected_percent: f64,
    pub wannier_functions: usize,
    pub bands_in_window: Vec<usize>,
    pub other_contributors: Vec<BandContribution>,
}

pub fn window_statistics(
    model: &BandModel,
    selection: &Selection,
    absolute_window: &EnergyWindow,
    options: &WindowOptions,
) -> WindowStatistics {
    let fermi = model.fermi();
    let band_ranges = model.energy_ranges();
    let bands = bands_in_window(&band_ranges, absolute_window);

    let weights = window_weights(model, selection, absolute_window, options.mode);
    let total_selected = stable_sum(model.compute_selected_weights(selection).iter().copied());
    let selected_percent = safe_ratio(weights.selected, total_selected) * 100.0;

    let other_contributors = if selection.is_empty() {
        Vec::new()
    } else {
        other_contributors(model, selection, &bands, options.other_contributor_limit)
    };

    debug!(
        mode = %options.mode,
        min = absolute_window.min,
        max = absolute_window.max,
        selected = weights.selected,
        total = weights.total,
        bands = bands.len(),
        "window statistics computed"
    );

    WindowStatistics {
        mode: options.mode,
        absolute_window: *absolute_window,
        relative_window: absolute_window.to_relative(&fermi),
        fermi_verified: fermi.is_verified(),
        selected_in_window: weights.selected,
        total_in_window: weights.total,
        total_selected,
        selected_percent,
        wannier_functions: wannier_function_count(selection, options.spin_orbit),
        bands_in_window: bands,
        other_contributors,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        WindowOptions, approximate_window_weights, bands_in_window, exact_window_weights,
        other_contributors, overlap_fraction, wannier_function_count, window_statistics,
        window_weights,
    };
    use crate::domain::{EnergyRange, EnergyWindow, FermiLevel, Selection, WindowMode};
    use crate::modules::band::BandModel;
    use crate::modules::procar::fixtures::{overlapping_file, two_band_file};

    fn two_band_model() -> BandModel {
        BandModel::from_parsed(two_band_file(), FermiLevel::default())
            .expect("two-band fixture should build a model")
    }

    fn overlapping_model() -> BandModel {
        BandModel::from_parsed(overlapping_file(), FermiLevel::verified(0.25))
            .expect("overlapping fixture should build a model")
    }

    fn close(lhs: f64, rhs: f64) -> bool {
        (lhs - rhs).abs() < 1.0e-9
    }

    #[test]
    fn two_band_scenario_captures_band_one() {
        let model = two_band_model();
        let selection = Selection::new([1], ["s"]);
        let window = EnergyWindow::new(-1.0, 0.0);

        let exact = exact_window_weights(&model, &selection, &window);
        assert!(close(exact.selected, 2.0), "selected = {}", exact.selected);
        assert!(close(exact.total, 2.0), "total = {}", exact.total);

        let approximate = approximate_window_weights(&model, &selection, &window);
        assert!(close(approximate.selected, 2.0));
        assert!(close(approximate.total, 2.0));
    }

    #[test]
    fn bands_in_window_uses_closed_intersection() {
        let ranges = [
            EnergyRange::new(-1.0, -0.8),
            EnergyRange::new(0.5, 0.6),
            EnergyRange::new(0.0, 0.0),
        ];

        assert_eq!(bands_in_window(&ranges, &EnergyWindow::new(-0.8, 0.5)), vec![0, 1, 2]);
        assert_eq!(bands_in_window(&ranges, &EnergyWindow::new(-0.5, -0.1)), Vec::<usize>::new());
        assert_eq!(bands_in_window(&ranges, &EnergyWindow::new(-2.0, 2.0)), vec![0, 1, 2]);
    }

    #[test]
    fn overlap_fraction_is_linear_in_the_covered_span() {
        let range = EnergyRange::new(-1.0, 1.0);

        assert_eq!(overlap_fraction(&range, &EnergyWindow::new(-1.0, 1.0)), 1.0);
        assert_eq!(overlap_fraction(&range, &EnergyWindow::new(-5.0, 5.0)), 1.0);
        assert!(close(overlap_fraction(&range, &EnergyWindow::new(0.0, 3.0)), 0.5));
        assert_eq!(overlap_fraction(&range, &EnergyWindow::new(2.0, 3.0)), 0.0);
    }

    #[test]
    fn flat_band_is_all_or_nothing() {
        let flat = EnergyRange::new(0.3, 0.3);

        assert_eq!(overlap_fraction(&flat, &EnergyWindow::new(0.0, 0.3)), 1.0);
        assert_eq!(overlap_fraction(&flat, &EnergyWindow::new(0.31, 1.0)), 0.0);
        assert!(overlap_fraction(&flat, &EnergyWindow::new(0.3, 0.3)).is_finite());
    }

    #[test]
    fn full_span_window_returns_full_band_weight() {
        let model = overlapping_model();
        // only band 2 carries ion 1 p character
        let selection = Selection::new([1], ["p"]);
        let band_two = model.energy_ranges()[1];
        let window = EnergyWindow::new(band_two.min, band_two.max);

        assert_eq!(overlap_fraction(&band_two, &window), 1.0);
        let approximate = approximate_window_weights(&model, &selection, &window);
        let full = model.compute_selected_weights(&selection)[1];
        assert!(close(approximate.selected, full));
        assert!(close(full, 1.5));
    }

    #[test]
    fn exact_selected_weight_grows_with_the_window() {
        let model = overlapping_model();
        let selection = Selection::new([1, 2], ["p", "d"]);

        let mut previous = 0.0;
        for step in 0..=12 {
            let half_width = 0.5 * step as f64;
            let window = EnergyWindow::around(0.0, half_width);
            let weights = exact_window_weights(&model, &selection, &window);
            assert!(
                weights.selected + 1.0e-12 >= previous,
                "half width {half_width}: {} < {previous}",
                weights.selected
            );
            assert!(weights.selected <= weights.total + 1.0e-12);
            previous = weights.selected;
        }
    }

    #[test]
    fn exact_mode_counts_only_kpoints_inside_the_window() {
        let model = overlapping_model();
        let selection = Selection::new([2], ["p"]);
        let window = EnergyWindow::new(-1.5, 0.5);

        let weights = window_weights(&model, &selection, &window, WindowMode::Exact);
        assert!(close(weights.selected, 1.3));
        assert!(close(weights.total, 3.9));
    }

    #[test]
    fn empty_selection_yields_zero_without_error() {
        let model = overlapping_model();
        let selection = Selection::new([1, 2], Vec::<String>::new());
        let window = EnergyWindow::new(-10.0, 10.0);

        for mode in [WindowMode::Exact, WindowMode::Approximate] {
            let weights = window_weights(&model, &selection, &window, mode);
            assert_eq!(weights.selected, 0.0);
            assert!(weights.total > 0.0);
        }

        let statistics = window_statistics(&model, &selection, &window, &WindowOptions::default());
        assert_eq!(statistics.selected_percent, 0.0);
        assert_eq!(statistics.wannier_functions, 0);
        assert!(statistics.other_contributors.is_empty());
    }

    #[test]
    fn other_contributors_rank_unselected_pairs_in_window() {
        let model = overlapping_model();
        let selection = Selection::new([1], ["s"]);
        let bands = bands_in_window(&model.energy_ranges(), &EnergyWindow::new(-1.5, 1.0));
        assert_eq!(bands, vec![1, 2]);

        let contributors = other_contributors(&model, &selection, &bands, 5);
        let labels = contributors
            .iter()
            .map(|contributor| contributor.label())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["I2:p", "I1:p", "I2:d", "I1:d"]);
        assert!(close(contributors[0].weight, 1.8));

        let limited = other_contributors(&model, &selection, &bands, 2);
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn statistics_report_percentage_and_wannier_count() {
        let model = overlapping_model();
        let selection = Selection::new([2], ["p"]);
        let window = EnergyWindow::new(-1.5, 0.5);
        let options = WindowOptions {
            spin_orbit: true,
            ..WindowOptions::default()
        };

        let statistics = window_statistics(&model, &selection, &window, &options);
        assert!(close(statistics.total_selected, 1.8));
        assert!(close(statistics.selected_percent, 1.3 / 1.8 * 100.0));
        assert_eq!(statistics.wannier_functions, 2);
        assert_eq!(statistics.bands_in_window, vec![1, 2]);
        assert!(close(statistics.relative_window.min, -1.75));
        assert!(close(statistics.relative_window.max, 0.25));
        assert!(statistics.fermi_verified);
        assert_eq!(statistics.other_contributors[0].label(), "I1:p");
    }

    #[test]
    fn wannier_count_is_multiplicative() {
        let selection = Selection::new([1, 2, 3], ["px", "py"]);
        assert_eq!(wannier_function_count(&selection, false), 6);
        assert_eq!(wannier_function_count(&selection, true), 12);
    }
}
