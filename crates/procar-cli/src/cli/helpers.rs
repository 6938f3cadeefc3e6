use super::CliError;
use anyhow::Context;
use procar_core::common::{AnalysisConfig, load_analysis_config};
use procar_core::domain::{EnergyWindow, FermiLevel};
use procar_core::modules::{AnalysisSession, LocalDirectory};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn";

/// Explicit level first, then `RUST_LOG`, then `warn`. Logs go to stderr so
/// stdout stays machine-readable.
pub(super) fn init_logging(level: Option<&str>) -> Result<(), CliError> {
    let filter = match level {
        Some(directive) => EnvFilter::try_new(directive).map_err(|error| {
            CliError::Usage(format!("invalid --log-level '{directive}': {error}"))
        })?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    // a subscriber may already be installed when the CLI runs in-process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    Ok(())
}

pub(super) fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, CliError> {
    match path {
        Some(path) => {
            let config = load_analysis_config(path)?;
            debug!(path = %path.display(), ?config, "loaded analysis config");
            Ok(config)
        }
        None => Ok(AnalysisConfig::default()),
    }
}

#[derive(clap::Args)]
pub(super) struct InputFlags {
    /// Directory holding the PROCAR and FERMI files
    #[arg(long, default_value = ".")]
    pub(super) dir: PathBuf,

    /// PROCAR file name inside --dir
    #[arg(long, default_value = "PROCAR")]
    pub(super) procar: String,

    /// FERMI file name inside --dir
    #[arg(long, default_value = "FERMI")]
    pub(super) fermi: String,
}

pub(super) fn open_session(
    input: &InputFlags,
    config: AnalysisConfig,
) -> Result<AnalysisSession, CliError> {
    let stager = LocalDirectory::new(&input.dir);
    let session = AnalysisSession::open(&stager, &input.procar, &input.fermi)?;
    Ok(session.with_config(config))
}

/// Fermi-relative window from optional edges. Missing edges fall back to the
/// configured half width around E_F; `absolute` edges are shifted by E_F.
pub(super) fn relative_window(
    min: Option<f64>,
    max: Option<f64>,
    absolute: bool,
    session: &AnalysisSession,
) -> EnergyWindow {
    let fermi = session.fermi();
    let fallback = if absolute {
        session.default_window().to_absolute(&fermi)
    } else {
        session.default_window()
    };
    let window = EnergyWindow::new(min.unwrap_or(fallback.min), max.unwrap_or(fallback.max));
    if absolute {
        window.to_relative(&fermi)
    } else {
        window
    }
}

pub(super) fn fermi_status_line(fermi: &FermiLevel) -> String {
    if fermi.is_verified() {
        format!("Fermi energy: {:.4} eV", fermi.energy)
    } else {
        "Fermi energy: not found, energies are relative to an assumed 0.0 eV".to_string()
    }
}

pub(super) fn print_stdout(text: &str) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.flush())
        .context("failed to write to stdout")?;
    Ok(())
}
