use crate::domain::{ProcarError, ProcarResult};
use std::path::{Path, PathBuf};

/// Makes named input files available on the local filesystem. Remote
/// front ends implement this by downloading into a scratch directory.
pub trait InputStager {
    fn stage(&self, name: &str) -> ProcarResult<PathBuf>;
}

/// Inputs that already live in a local directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDirectory {
    root: PathBuf,
}

impl LocalDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl InputStager for LocalDirectory {
    fn stage(&self, name: &str) -> ProcarResult<PathBuf> {
        let path = self.root.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(ProcarError::io_system(
                "IO.INPUT_STAGE",
                format!("input file '{}' does not exist", path.display()),
            ))
        }
    }
}
