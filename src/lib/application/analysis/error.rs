use crate::infrastructure::model::ModelError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },
    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("column '{column}' missing from {}", path.display())]
    MissingColumn { column: String, path: PathBuf },
    #[error("no posts could be classified from {}", path.display())]
    NoPosts { path: PathBuf },
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl AnalysisError {
    pub(super) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}
