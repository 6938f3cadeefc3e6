//! Plain-text and JSON renderings of analysis results.

use super::band::BandModel;
use super::fatband::{Fatband, FatbandBandSummary};
use super::serialization::format_fixed_f64;
use super::window::WindowStatistics;
use crate::domain::{BandFileHeader, EnergyRange, FermiLevel};
use serde::Serialize;
use std::fmt::Write;

/// Contributors listed in the stats panel.
const PANEL_CONTRIBUTOR_LINES: usize = 3;

/// Stats side-panel text for one window query.
pub fn render_stats_panel(statistics: &WindowStatistics, fermi: &FermiLevel) -> String {
    let relative = statistics.relative_window;
    let absolute = statistics.absolute_window;

    let mut lines = vec![
        format!("Wannier functions: {}", statistics.wannier_functions),
        format!("Bands in window: {}", statistics.bands_in_window.len()),
        String::new(),
        "Total weight in window:".to_string(),
        format!("  {:.4}", statistics.total_in_window),
        "Selected weight in window:".to_string(),
        format!("  {:.4}", statistics.selected_in_window),
        "% of selected in window:".to_string(),
        format!("  {:.2}%", statistics.selected_percent),
        String::new(),
        "Window (relative):".to_string(),
        format!("  {:.3} -> {:.3} eV", relative.min, relative.max),
        "Window (absolute):".to_string(),
        format!("  {:.3} -> {:.3} eV", absolute.min, absolute.max),
        String::new(),
        "Top other contributors:".to_string(),
    ];

    if statistics.other_contributors.is_empty() {
        lines.push("  None".to_string());
    } else {
        lines.extend(
            statistics
                .other_contributors
                .iter()
                .take(PANEL_CONTRIBUTOR_LINES)
                .map(|contributor| format!("  {}: {:.4}", contributor.label(), contributor.weight)),
        );
    }

    if !fermi.is_verified() {
        lines.push(String::new());
        lines.push(format!("Energies {}.", fermi.reference_label()));
    }

    let mut panel = lines.join("\n");
    panel.push('\n');
    panel
}

/// One row per fatband with absolute and Fermi-relative bounds. The fatband
/// holding E_F is starred.
pub fn render_fatband_table(fatbands: &[Fatband], fermi: &FermiLevel) -> String {
    let mut table = String::new();
    let _ = writeln!(
        table,
        "{:>4} {:>7} {:>10} {:>10} {:>10} {:>10}  bands",
        "#", "count", "E_min", "E_max", "rel_min", "rel_max"
    );
    for (position, fatband) in fatbands.iter().enumerate() {
        let relative = fatband.relative_to(fermi);
        let marker = if fatband.range().contains(fermi.energy) { "*" } else { " " };
        let bands = fatband
            .band_indices
            .iter()
            .map(|band| (band + 1).to_string())
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(
            table,
            "{:>3}{} {:>7} {} {} {} {}  {}",
            position + 1,
            marker,
            fatband.len(),
            format_fixed_f64(fatband.energy_min, 10, 4),
            format_fixed_f64(fatband.energy_max, 10, 4),
            format_fixed_f64(relative.min, 10, 4),
            format_fixed_f64(relative.max, 10, 4),
            bands
        );
    }
    table
}

/// Energy span of every band across the k-points, 1-based band numbers.
pub fn render_band_range_table(ranges: &[EnergyRange], fermi: &FermiLevel) -> String {
    let mut table = String::new();
    let _ = writeln!(
        table,
        "{:>5} {:>10} {:>10} {:>10} {:>10}",
        "band", "E_min", "E_max", "rel_min", "rel_max"
    );
    for (band, range) in ranges.iter().enumerate() {
        let _ = writeln!(
            table,
            "{:>5} {} {} {} {}",
            band + 1,
            format_fixed_f64(range.min, 10, 4),
            format_fixed_f64(range.max, 10, 4),
            format_fixed_f64(range.min - fermi.energy, 10, 4),
            format_fixed_f64(range.max - fermi.energy, 10, 4)
        );
    }
    table
}

/// Ranked band summaries of one fatband, 1-based band numbers.
pub fn render_band_table(summaries: &[FatbandBandSummary], fermi: &FermiLevel) -> String {
    let mut table = String::new();
    let _ = writeln!(
        table,
        "{:>5} {:>10} {:>10} {:>10}  top contributions",
        "band", "rel_min", "rel_max", "top"
    );
    for summary in summaries {
        let contributions = summary
            .contributions
            .iter()
            .map(|contribution| format!("{}={:.4}", contribution.label(), contribution.weight))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(
            table,
            "{:>5} {} {} {}  {}",
            summary.band_number(),
            format_fixed_f64(summary.energy_min - fermi.energy, 10, 4),
            format_fixed_f64(summary.energy_max - fermi.energy, 10, 4),
            format_fixed_f64(summary.top_weight, 10, 4),
            contributions
        );
    }
    table
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarySnapshot<'a> {
    pub header: &'a BandFileHeader,
    pub fermi: FermiLevel,
    pub fermi_fatband: Option<usize>,
    pub band_ranges: &'a [EnergyRange],
    pub band_weights: Vec<f64>,
    pub kpoint_coordinates: Vec<[f64; 3]>,
    pub kpoint_weights: Vec<f64>,
    pub fatbands: &'a [Fatband],
}

impl<'a> SummarySnapshot<'a> {
    pub fn new(
        model: &'a BandModel,
        fatbands: &'a [Fatband],
        band_ranges: &'a [EnergyRange],
        fermi_fatband: Option<usize>,
    ) -> Self {
        Self {
            header: model.header(),
            fermi: model.fermi(),
            fermi_fatband,
            band_ranges,
            band_weights: model.band_weights().to_vec(),
            kpoint_coordinates: model.kpoint_coordinates(),
            kpoint_weights: model.kpoint_weights(),
            fatbands,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FatbandReport<'a> {
    /// 0-based position in the fatband list.
    pub position: usize,
    pub fatband: &'a Fatband,
    pub bands: Vec<FatbandBandSummary>,
}

#[cfg(test)]
mod tests {
    use super::{
        SummarySnapshot, render_band_range_table, render_band_table, render_fatband_table,
        render_stats_panel,
    };
    use crate::domain::{EnergyWindow, FermiLevel, Selection};
    use crate::modules::band::BandModel;
    use crate::modules::fatband::{fatband_info, identify_fatbands};
    use crate::modules::procar::fixtures::{overlapping_file, two_band_file};
    use crate::modules::window::{WindowOptions, window_statistics};

    #[test]
    fn stats_panel_lists_weights_windows_and_contributors() {
        let model = BandModel::from_parsed(overlapping_file(), FermiLevel::verified(0.25))
            .expect("overlapping fixture should build a model");
        let statistics = window_statistics(
            &model,
            &Selection::new([2], ["p"]),
            &EnergyWindow::new(-1.5, 0.5),
            &WindowOptions::default(),
        );

        let panel = render_stats_panel(&statistics, &model.fermi());
        let lines = panel.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Wannier functions: 1");
        assert_eq!(lines[1], "Bands in window: 2");
        assert_eq!(lines[4], "  3.9000");
        assert_eq!(lines[6], "  1.3000");
        assert_eq!(lines[8], "  72.22%");
        assert_eq!(lines[11], "  -1.750 -> 0.250 eV");
        assert_eq!(lines[13], "  -1.500 -> 0.500 eV");
        assert_eq!(lines[15], "Top other contributors:");
        assert_eq!(lines[16], "  I1:p: 1.5000");
        assert_eq!(lines.len(), 19);
    }

    #[test]
    fn stats_panel_flags_assumed_fermi_and_empty_contributors() {
        let model = BandModel::from_parsed(two_band_file(), FermiLevel::default())
            .expect("two-band fixture should build a model");
        let statistics = window_statistics(
            &model,
            &Selection::new([1], ["s", "p"]),
            &EnergyWindow::new(-1.0, 0.0),
            &WindowOptions::default(),
        );

        let panel = render_stats_panel(&statistics, &model.fermi());
        assert!(panel.contains("Top other contributors:\n  None\n"));
        assert!(panel.ends_with("Energies relative to assumed E_F = 0.\n"));
    }

    #[test]
    fn tables_use_one_based_band_numbers() {
        let model = BandModel::from_parsed(overlapping_file(), FermiLevel::verified(0.25))
            .expect("overlapping fixture should build a model");
        let partition = identify_fatbands(model.energies());

        let fatbands = render_fatband_table(&partition.fatbands, &model.fermi());
        let rows = fatbands.lines().collect::<Vec<_>>();
        assert_eq!(rows.len(), 4);
        assert!(rows[2].starts_with("  2*"));
        assert!(rows[2].ends_with("  2,3"));

        let summaries = fatband_info(&model, &partition.fatbands[1], &partition.band_ranges, 1);
        let bands = render_band_table(&summaries, &model.fermi());
        let rows = bands.lines().collect::<Vec<_>>();
        assert!(rows[1].trim_start().starts_with("3 "));
        assert!(rows[1].ends_with("I2:p=1.8000"));
    }

    #[test]
    fn band_range_table_lists_absolute_and_relative_spans() {
        let model = BandModel::from_parsed(two_band_file(), FermiLevel::verified(-0.5))
            .expect("two-band fixture should build a model");

        let table = render_band_range_table(&model.energy_ranges(), &model.fermi());
        let rows = table.lines().collect::<Vec<_>>();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], "    1    -1.0000    -0.8000    -0.5000    -0.3000");
        assert_eq!(rows[2], "    2     0.5000     0.6000     1.0000     1.1000");
    }

    #[test]
    fn summary_snapshot_serializes_camel_case() {
        let model = BandModel::from_parsed(two_band_file(), FermiLevel::default())
            .expect("two-band fixture should build a model");
        let partition = identify_fatbands(model.energies());
        let snapshot =
            SummarySnapshot::new(&model, &partition.fatbands, &partition.band_ranges, None);

        let value = serde_json::to_value(&snapshot).expect("snapshot should serialize");
        assert_eq!(value["header"]["bandCount"], 2);
        assert_eq!(value["header"]["orbitals"][1], "p");
        assert_eq!(value["fermi"]["source"], "assumedZero");
        assert_eq!(value["fatbands"][1]["bandIndices"][0], 1);
        assert_eq!(value["bandRanges"][0]["min"], -1.0);
        assert_eq!(value["kpointWeights"], serde_json::json!([0.5, 0.5]));
        assert_eq!(value["kpointCoordinates"][1][0], 0.5);
    }
}
