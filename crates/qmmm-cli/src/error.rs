use qmmm::core::forcefield::params::ParamError;
use qmmm::core::models::system::SystemError;
use qmmm::engine::error::QmmmError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Qmmm(#[from] QmmmError),

    #[error(transparent)]
    Params(#[from] ParamError),

    #[error("Invalid structure: {0}")]
    Structure(#[from] SystemError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
