use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("need at least two non-empty groups to compare, found {found}")]
    TooFewGroups { found: usize },
    #[error("all observations are identical; rank statistics are undefined")]
    IdenticalValues,
    #[error("input is missing required column `{0}`")]
    MissingColumn(String),
    #[error("unsupported column `{0}`")]
    UnknownColumn(String),
    #[error("distribution error: {0}")]
    Distribution(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;
