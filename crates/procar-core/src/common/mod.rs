pub mod config;
pub mod constants;

pub use config::{AnalysisConfig, AnalysisConfigError, load_analysis_config};
