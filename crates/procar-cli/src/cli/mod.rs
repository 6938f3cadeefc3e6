mod commands;
mod helpers;

use clap::Parser;
use procar_core::common::{AnalysisConfig, AnalysisConfigError};
use procar_core::domain::ProcarError;
use std::path::PathBuf;

pub fn run_from_env() -> i32 {
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let diagnostic = error.as_procar_error();
            eprintln!("{}", diagnostic.diagnostic_line());
            diagnostic.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("procar-rs".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_logging(cli.global.log_level.as_deref())?;
            let config = helpers::load_config(cli.global.config.as_deref())?;
            dispatch_parsed(cli.command, config)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "procar-rs",
    version,
    about = "Band-structure analysis of VASP PROCAR projections"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalFlags,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Args)]
struct GlobalFlags {
    /// Log filter directive, e.g. `info` or `procar_core=debug` (falls back to RUST_LOG, then `warn`)
    #[arg(long, global = true, env = "PROCAR_LOG")]
    log_level: Option<String>,

    /// Analysis settings JSON; command-line flags take precedence
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Print the PROCAR header, Fermi level and fatband list
    Summary(commands::SummaryArgs),
    /// Rank the bands of each fatband by dominant ion/orbital character
    Fatbands(commands::FatbandsArgs),
    /// Selected-versus-total weight inside an energy window
    Window(commands::WindowArgs),
    /// Write plot-ready view state as JSON
    View(commands::ViewArgs),
}

fn dispatch_parsed(command: CliCommand, config: AnalysisConfig) -> Result<i32, CliError> {
    match command {
        CliCommand::Summary(args) => commands::run_summary_command(args, config),
        CliCommand::Fatbands(args) => commands::run_fatbands_command(args, config),
        CliCommand::Window(args) => commands::run_window_command(args, config),
        CliCommand::View(args) => commands::run_view_command(args, config),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Analysis(ProcarError),
    #[error(transparent)]
    Config(#[from] AnalysisConfigError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ProcarError> for CliError {
    fn from(error: ProcarError) -> Self {
        Self::Analysis(error)
    }
}

impl CliError {
    fn as_procar_error(&self) -> ProcarError {
        match self {
            Self::Usage(message) => {
                ProcarError::input_validation("INPUT.CLI_USAGE", message.trim_end().to_string())
            }
            Self::Analysis(error) => error.clone(),
            Self::Config(error) => ProcarError::input_validation("INPUT.CONFIG", error.to_string()),
            Self::Internal(error) => ProcarError::internal("RUN.CLI", format!("{error:#}")),
        }
    }
}
