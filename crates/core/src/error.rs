use std::path::PathBuf;
use thiserror::Error;

use crate::template::MaskError;

#[derive(Debug, Error)]
pub enum RenameError {
    #[error("Error in name log file line {line_number}: >{line:?}<")]
    NamesLog { line_number: usize, line: String },

    #[error("Too many files for {file}")]
    TooManyFiles { file: String },

    #[error("Cannot merge {} into itself", folder.display())]
    MergeSameDir { folder: PathBuf },

    #[error("Invalid destination mask: {0}")]
    InvalidMask(#[from] MaskError),

    #[error("{} : {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenameError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RenameError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            RenameError::NamesLog { .. } => 2,
            RenameError::TooManyFiles { .. } => 3,
            RenameError::MergeSameDir { .. } => 4,
            RenameError::InvalidMask(_) => 5,
            RenameError::Io { .. } => 6,
        }
    }
}
