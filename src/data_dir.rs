use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const ENV_DATA_DIR: &str = "DOCSEEK_DATA_DIR";
const XDG_PREFIX: &str = "docseek";
const DOCUMENTS_DB: &str = "documents.redb";

/// Where docseek keeps its database.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// `--data-dir` wins over `DOCSEEK_DATA_DIR`, which wins over
    /// `$XDG_DATA_HOME/docseek`. The directory is created if missing.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let root = match explicit {
            Some(path) => path.to_path_buf(),
            None => match std::env::var_os(ENV_DATA_DIR) {
                Some(val) => PathBuf::from(val),
                None => xdg_data_home()?,
            },
        };

        std::fs::create_dir_all(&root)
            .map_err(|_| Error::DataDir(root.clone()))?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The redb file holding documents and settings.
    pub fn documents_db(&self) -> PathBuf {
        self.root.join(DOCUMENTS_DB)
    }
}

fn xdg_data_home() -> Result<PathBuf> {
    xdg::BaseDirectories::with_prefix(XDG_PREFIX)
        .get_data_home()
        .ok_or_else(|| {
            Error::Config("could not determine XDG data home directory".into())
        })
}
