//! Plot-ready state for a band-structure view.
//!
//! [`compute_view_state`] is the single entry point a front end calls after
//! every selection or window change. It holds no references to the caller
//! and recomputes everything from the model.

use crate::common::AnalysisConfig;
use crate::common::constants::{
    DEFAULT_HIGHLIGHT_THRESHOLD, DEFAULT_LINEWIDTH_SCALE, FRACTION_FLOOR, LINE_STYLE_BASE,
    LINE_STYLE_SPAN,
};
use crate::domain::{EnergyWindow, FermiLevel, Selection};
use crate::modules::band::BandModel;
use crate::modules::window::{WindowOptions, WindowStatistics, window_statistics};
use crate::numerics::{min_max, normalize_to_unit, safe_ratio, stable_mean, stable_sum};
use ndarray::Array2;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewRequest {
    pub selection: Selection,
    /// Fermi-relative window.
    pub window: EnergyWindow,
    pub highlight_threshold: f64,
    pub linewidth_scale: f64,
    pub window_options: WindowOptions,
}

impl ViewRequest {
    pub fn new(selection: Selection, window: EnergyWindow) -> Self {
        Self {
            selection,
            window,
            highlight_threshold: DEFAULT_HIGHLIGHT_THRESHOLD,
            linewidth_scale: DEFAULT_LINEWIDTH_SCALE,
            window_options: WindowOptions::default(),
        }
    }

    pub fn from_config(selection: Selection, window: EnergyWindow, config: &AnalysisConfig) -> Self {
        Self {
            selection,
            window,
            highlight_threshold: config.highlight_threshold,
            linewidth_scale: config.linewidth_scale,
            window_options: WindowOptions::from(config),
        }
    }
}

/// Colour value and width of the line between k-points `k` and `k + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentStyle {
    pub value: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandStyle {
    pub band_index: usize,
    /// Selected weight over the band's summed per-k-point total.
    pub selected_fraction: f64,
    pub highlighted: bool,
    pub linewidth: f64,
    pub alpha: f64,
    pub segments: Vec<SegmentStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub fermi: FermiLevel,
    /// `[band][k-point]`, eV relative to the Fermi level.
    pub relative_energies: Vec<Vec<f64>>,
    /// `[band][k-point]` selected share of the total weight.
    pub proportions: Vec<Vec<f64>>,
    pub bands: Vec<BandStyle>,
    pub statistics: WindowStatistics,
}

pub fn compute_view_state(model: &BandModel, request: &ViewRequest) -> ViewState {
    let fermi = model.fermi();
    let (selected, totals) = model.compute_per_kpoint_selected_weights(&request.selection);
    let selected_weights = model.compute_selected_weights(&request.selection);

    let proportions = Array2::from_shape_fn(selected.dim(), |position| {
        safe_ratio(selected[position], totals[position])
    });

    let (global_min, global_max) = min_max(totals.iter().copied()).unwrap_or((0.0, 0.0));
    let normalized_totals = totals.mapv(|total| normalize_to_unit(total, global_min, global_max));

    // band means are scaled against the extreme single k-point totals
    let mean_totals = totals
        .outer_iter()
        .map(|row| stable_mean(row.iter().copied()).unwrap_or(0.0))
        .collect::<Vec<_>>();

    let bands = mean_totals
        .iter()
        .enumerate()
        .map(|(band, mean_total)| {
            let band_total = stable_sum(totals.row(band).iter().copied()).max(FRACTION_FLOOR);
            let selected_fraction = selected_weights[band] / band_total;
            let style = LINE_STYLE_BASE
                + LINE_STYLE_SPAN * normalize_to_unit(*mean_total, global_min, global_max);

            let proportion = proportions.row(band);
            let weight = normalized_totals.row(band);
            let segments = (1..proportion.len())
                .map(|k| SegmentStyle {
                    value: 0.5 * (proportion[k - 1] + proportion[k]),
                    width: (request.linewidth_scale * 0.5 * (weight[k - 1] + weight[k])).max(0.0),
                })
                .collect();

            BandStyle {
                band_index: band,
                selected_fraction,
                highlighted: selected_fraction >= request.highlight_threshold,
                linewidth: style,
                alpha: style,
                segments,
            }
        })
        .collect();

    let statistics = window_statistics(
        model,
        &request.selection,
        &request.window.to_absolute(&fermi),
        &request.window_options,
    );

    ViewState {
        fermi,
        relative_energies: rows(&model.relative_energies()),
        proportions: rows(&proportions),
        bands,
        statistics,
    }
}

fn rows(array: &Array2<f64>) -> Vec<Vec<f64>> {
    array.outer_iter().map(|row| row.to_vec()).collect()
}
