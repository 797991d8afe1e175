use crate::core::forcefield::params::{AtomicLjTable, LjSpeciesTable};
use crate::core::models::selection::Selection;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Which coupling formula to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scheme {
    /// `E = E_QM(qm) - E_MM(qm) + E_MM(all)`.
    #[default]
    Subtractive,
    /// `E = E_I(qm, mm) + E_QM(qm) + E_MM(mm)`.
    Explicit,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Subtractive => write!(f, "subtractive"),
            Scheme::Explicit => write!(f, "explicit"),
        }
    }
}

/// Parameters of a built-in [`LennardJones`](crate::core::calculator::lennard_jones::LennardJones)
/// calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LjCalculatorConfig {
    pub sigma: f64,
    pub epsilon: f64,
    /// Defaults to three σ when absent.
    pub cutoff: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionConfig {
    /// Final σ/ε per element pair.
    SpeciesTable(LjSpeciesTable),
    /// Per-atom tables for one QM and one MM molecule, combined by Lorentz-Berthelot.
    General {
        qm: AtomicLjTable,
        mm: AtomicLjTable,
        qm_molecule_size: usize,
        mm_molecule_size: usize,
        cutoff: Option<f64>,
        width: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    pub selection: Selection,
    pub vacuum: Option<f64>,
    pub scheme: Scheme,
    pub qm_calculator: LjCalculatorConfig,
    pub mm_calculator: LjCalculatorConfig,
    /// Only read by the explicit scheme.
    pub interaction: Option<InteractionConfig>,
}

#[derive(Default)]
pub struct EvaluationConfigBuilder {
    selection: Option<Selection>,
    vacuum: Option<f64>,
    scheme: Option<Scheme>,
    qm_calculator: Option<LjCalculatorConfig>,
    mm_calculator: Option<LjCalculatorConfig>,
    interaction: Option<InteractionConfig>,
}

impl EvaluationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }
    pub fn vacuum(mut self, vacuum: Option<f64>) -> Self {
        self.vacuum = vacuum;
        self
    }
    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = Some(scheme);
        self
    }
    pub fn qm_calculator(mut self, config: LjCalculatorConfig) -> Self {
        self.qm_calculator = Some(config);
        self
    }
    pub fn mm_calculator(mut self, config: LjCalculatorConfig) -> Self {
        self.mm_calculator = Some(config);
        self
    }
    pub fn interaction(mut self, config: InteractionConfig) -> Self {
        self.interaction = Some(config);
        self
    }

    pub fn build(self) -> Result<EvaluationConfig, ConfigError> {
        let scheme = self.scheme.unwrap_or_default();
        if scheme == Scheme::Explicit && self.interaction.is_none() {
            return Err(ConfigError::MissingParameter("interaction"));
        }
        Ok(EvaluationConfig {
            selection: self
                .selection
                .ok_or(ConfigError::MissingParameter("selection"))?,
            vacuum: self.vacuum,
            scheme,
            qm_calculator: self
                .qm_calculator
                .ok_or(ConfigError::MissingParameter("qm_calculator"))?,
            mm_calculator: self
                .mm_calculator
                .ok_or(ConfigError::MissingParameter("mm_calculator"))?,
            interaction: self.interaction,
        })
    }
}
