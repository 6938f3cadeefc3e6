use super::CliError;
use super::helpers::{
    InputFlags, fermi_status_line, open_session, print_stdout, relative_window,
};
use procar_core::common::AnalysisConfig;
use procar_core::domain::{Selection, WindowMode};
use procar_core::modules::report::{
    FatbandReport, SummarySnapshot, render_band_range_table, render_band_table,
    render_fatband_table, render_stats_panel,
};
use procar_core::modules::serialization::write_json_artifact;
use procar_core::modules::{AnalysisSession, build_selection};
use std::fmt::Write;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct SummaryArgs {
    #[command(flatten)]
    input: InputFlags,

    /// Also write the summary as JSON
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct FatbandsArgs {
    #[command(flatten)]
    input: InputFlags,

    /// Contributions listed per band
    #[arg(long)]
    top_n: Option<usize>,

    /// Only the fatband holding the Fermi energy
    #[arg(long)]
    at_fermi: bool,

    /// Also write the ranked bands as JSON
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct SelectionFlags {
    /// Ion numbers, e.g. `1-4,7` (default: all ions)
    #[arg(long)]
    ions: Option<String>,

    /// Orbital labels or globs, e.g. `s,p?,d*` (default: all orbitals)
    #[arg(long, value_delimiter = ',')]
    orbitals: Vec<String>,
}

impl SelectionFlags {
    fn resolve(&self, session: &AnalysisSession) -> Result<Selection, CliError> {
        let orbitals = (!self.orbitals.is_empty()).then_some(self.orbitals.as_slice());
        Ok(build_selection(
            session.model(),
            self.ions.as_deref(),
            orbitals,
        )?)
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub(super) enum ModeArg {
    Exact,
    Approximate,
}

impl From<ModeArg> for WindowMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Exact => WindowMode::Exact,
            ModeArg::Approximate => WindowMode::Approximate,
        }
    }
}

#[derive(clap::Args)]
pub(super) struct WindowEdges {
    /// Lower window edge in eV (default: E_F minus the configured half width)
    #[arg(long, allow_negative_numbers = true)]
    emin: Option<f64>,

    /// Upper window edge in eV (default: E_F plus the configured half width)
    #[arg(long, allow_negative_numbers = true)]
    emax: Option<f64>,

    /// Edges are absolute energies instead of relative to E_F
    #[arg(long)]
    absolute: bool,
}

#[derive(clap::Args)]
pub(super) struct WindowArgs {
    #[command(flatten)]
    input: InputFlags,

    #[command(flatten)]
    edges: WindowEdges,

    #[command(flatten)]
    selection: SelectionFlags,

    /// Accuracy mode
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Spin-orbit coupled calculation (doubles the Wannier estimate)
    #[arg(long)]
    soc: bool,

    /// Also write the statistics as JSON
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct ViewArgs {
    #[command(flatten)]
    input: InputFlags,

    #[command(flatten)]
    edges: WindowEdges,

    #[command(flatten)]
    selection: SelectionFlags,

    /// Selected fraction at which a band is highlighted
    #[arg(long)]
    threshold: Option<f64>,

    /// Accuracy mode for the window statistics
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// View state JSON output path
    #[arg(long, value_name = "PATH")]
    output: PathBuf,
}

pub(super) fn run_summary_command(
    args: SummaryArgs,
    config: AnalysisConfig,
) -> Result<i32, CliError> {
    let session = open_session(&args.input, config)?;
    let model = session.model();
    let header = model.header();
    let fermi = session.fermi();

    let mut text = String::new();
    let _ = writeln!(text, "PROCAR: {}", session.procar_path().display());
    let _ = writeln!(text, "Title: {}", header.title);
    let _ = writeln!(
        text,
        "k-points: {}  bands: {}  ions: {}",
        header.kpoint_count, header.band_count, header.ion_count
    );
    let _ = writeln!(text, "Orbitals: {}", header.orbitals.join(" "));
    let _ = writeln!(text, "{}", fermi_status_line(&fermi));
    let _ = writeln!(text, "Bands:");
    text.push_str(&render_band_range_table(session.band_ranges(), &fermi));
    let _ = writeln!(text, "Fatbands: {}", session.fatbands().len());
    text.push_str(&render_fatband_table(session.fatbands(), &fermi));
    print_stdout(&text)?;

    if let Some(path) = &args.json {
        let snapshot = SummarySnapshot::new(
            model,
            session.fatbands(),
            session.band_ranges(),
            session.fermi_fatband(),
        );
        write_json_artifact(path, &snapshot)?;
    }
    Ok(0)
}

pub(super) fn run_fatbands_command(
    args: FatbandsArgs,
    mut config: AnalysisConfig,
) -> Result<i32, CliError> {
    if let Some(top_n) = args.top_n {
        config.top_n = top_n;
    }
    config.validate()?;
    let session = open_session(&args.input, config)?;
    let fermi = session.fermi();

    let positions = if args.at_fermi {
        match session.fermi_fatband() {
            Some(position) => vec![position],
            None => {
                print_stdout(&format!(
                    "No fatband contains the Fermi energy ({:.4} eV).\n",
                    fermi.energy
                ))?;
                return Ok(0);
            }
        }
    } else {
        (0..session.fatbands().len()).collect()
    };

    let mut text = String::new();
    let mut reports = Vec::with_capacity(positions.len());
    for position in positions {
        let (Some(fatband), Some(bands)) = (
            session.fatbands().get(position),
            session.fatband_summaries(position),
        ) else {
            continue;
        };
        let relative = fatband.relative_to(&fermi);
        let _ = writeln!(
            text,
            "Fatband {} ({} bands): {:.4} -> {:.4} eV, {}",
            position + 1,
            fatband.len(),
            relative.min,
            relative.max,
            fermi.reference_label()
        );
        text.push_str(&render_band_table(&bands, &fermi));
        text.push('\n');
        reports.push(FatbandReport {
            position,
            fatband,
            bands,
        });
    }
    print_stdout(&text)?;

    if let Some(path) = &args.json {
        write_json_artifact(path, &reports)?;
    }
    Ok(0)
}

pub(super) fn run_window_command(
    args: WindowArgs,
    mut config: AnalysisConfig,
) -> Result<i32, CliError> {
    if let Some(mode) = args.mode {
        config.window_mode = mode.into();
    }
    config.spin_orbit |= args.soc;

    let session = open_session(&args.input, config)?;
    let selection = args.selection.resolve(&session)?;
    let window = relative_window(
        args.edges.emin,
        args.edges.emax,
        args.edges.absolute,
        &session,
    );

    let statistics = session.window_statistics(&selection, &window);
    print_stdout(&render_stats_panel(&statistics, &session.fermi()))?;

    if let Some(path) = &args.json {
        write_json_artifact(path, &statistics)?;
    }
    Ok(0)
}

pub(super) fn run_view_command(args: ViewArgs, mut config: AnalysisConfig) -> Result<i32, CliError> {
    if let Some(threshold) = args.threshold {
        config.highlight_threshold = threshold;
    }
    if let Some(mode) = args.mode {
        config.window_mode = mode.into();
    }
    config.validate()?;

    let session = open_session(&args.input, config)?;
    let selection = args.selection.resolve(&session)?;
    let window = relative_window(
        args.edges.emin,
        args.edges.emax,
        args.edges.absolute,
        &session,
    );

    let view = session.view_state(selection, window);
    write_json_artifact(&args.output, &view)?;
    let highlighted = view.bands.iter().filter(|band| band.highlighted).count();
    print_stdout(&format!(
        "View state for {} bands ({} highlighted) written to {}\n",
        view.bands.len(),
        highlighted,
        args.output.display()
    ))?;
    Ok(0)
}
