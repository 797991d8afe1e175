use thiserror::Error;

use crate::core::calculator::CalculatorError;
use crate::core::forcefield::interactions::InteractionError;
use crate::core::forcefield::params::ParamError;
use crate::core::models::selection::SelectionError;
use crate::core::models::system::SystemError;

#[derive(Debug, Error)]
pub enum QmmmError {
    #[error("Invalid QM selection: {source}")]
    Selection {
        #[from]
        source: SelectionError,
    },

    #[error("Invalid system: {source}")]
    System {
        #[from]
        source: SystemError,
    },

    #[error("Invalid interaction parameters: {source}")]
    Params {
        #[from]
        source: ParamError,
    },

    #[error("QM/MM interaction failed: {source}")]
    Interaction {
        #[from]
        source: InteractionError,
    },

    #[error(transparent)]
    Calculator(#[from] CalculatorError),

    #[error("Calculator '{calculator}' does not provide the {capability} capability")]
    MissingCapability {
        calculator: String,
        capability: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("{component} used before initialization")]
    NotInitialized { component: &'static str },
}
