use crate::domain::FermiLevel;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Why a FERMI file could not supply an energy. Logged, never returned.
#[derive(Debug, thiserror::Error)]
pub enum FermiUnavailable {
    #[error("cannot read '{}': {source}", path.display())]
    Unreadable {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("'{}' is empty", path.display())]
    Empty { path: std::path::PathBuf },
    #[error("'{}' starts with '{token}', which is not a number", path.display())]
    NotNumeric {
        path: std::path::PathBuf,
        token: String,
    },
}

/// Reads the Fermi energy (eV) from the first token of `path`. Any failure
/// yields [`FermiLevel::assumed_zero`] and a warning.
pub fn parse_fermi(path: impl AsRef<Path>) -> FermiLevel {
    match read_fermi(path.as_ref()) {
        Ok(energy) => FermiLevel::verified(energy),
        Err(reason) => {
            warn!(%reason, "FERMI energy not found; energies are relative to an assumed 0.0 eV");
            FermiLevel::assumed_zero()
        }
    }
}

pub fn read_fermi(path: &Path) -> Result<f64, FermiUnavailable> {
    let source = fs::read_to_string(path).map_err(|source| FermiUnavailable::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let token = source
        .split_whitespace()
        .next()
        .ok_or_else(|| FermiUnavailable::Empty {
            path: path.to_path_buf(),
        })?;

    token
        .parse::<f64>()
        .ok()
        .filter(|energy| energy.is_finite())
        .ok_or_else(|| FermiUnavailable::NotNumeric {
            path: path.to_path_buf(),
            token: token.to_string(),
        })
}
