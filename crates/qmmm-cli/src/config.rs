use crate::cli::EvaluateArgs;
use crate::error::{CliError, Result};
use qmmm::core::forcefield::params::{AtomicLjTable, LjSpeciesTable};
use qmmm::core::models::selection::Selection;
use qmmm::engine::config::{
    EvaluationConfig, EvaluationConfigBuilder, InteractionConfig, LjCalculatorConfig, Scheme,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_MOLECULE_SIZE: usize = 3;
const DEFAULT_SWITCH_WIDTH: f64 = 1.0;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct PartialRunConfig {
    pub qmmm: Option<PartialQmmmConfig>,
    pub calculators: Option<PartialCalculatorsConfig>,
    pub interaction: Option<PartialInteractionConfig>,
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct PartialQmmmConfig {
    pub scheme: Option<Scheme>,
    pub vacuum: Option<f64>,
    pub selection: Option<PartialSelection>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum PartialSelection {
    Indices { indices: Vec<usize> },
    Mask { mask: Vec<bool> },
    Range { start: usize, end: usize },
}

impl From<PartialSelection> for Selection {
    fn from(partial: PartialSelection) -> Self {
        match partial {
            PartialSelection::Indices { indices } => Selection::Indices(indices),
            PartialSelection::Mask { mask } => Selection::Mask(mask),
            PartialSelection::Range { start, end } => Selection::Range(start..end),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct PartialCalculatorsConfig {
    pub qm: Option<PartialLjCalculatorConfig>,
    pub mm: Option<PartialLjCalculatorConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct PartialLjCalculatorConfig {
    pub sigma: Option<f64>,
    pub epsilon: Option<f64>,
    pub cutoff: Option<f64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case",
    tag = "type"
)]
pub enum PartialInteractionConfig {
    SpeciesTable {
        parameters: PathBuf,
    },
    General {
        qm_parameters: PathBuf,
        mm_parameters: PathBuf,
        qm_molecule_size: Option<usize>,
        mm_molecule_size: Option<usize>,
        cutoff: Option<f64>,
        width: Option<f64>,
    },
}

impl PartialRunConfig {
    /// Reads a run configuration. Parameter file paths inside it are resolved against the
    /// directory that contains `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    pub fn merge_with_cli(mut self, args: &EvaluateArgs) -> Result<EvaluationConfig> {
        self.apply_set_values(&args.set_values)?;

        let qmmm = self.qmmm.take().unwrap_or_default();
        let scheme = args
            .scheme
            .map(Scheme::from)
            .or(qmmm.scheme)
            .unwrap_or_default();
        let vacuum = args.vacuum.or(qmmm.vacuum);
        let selection = qmmm
            .selection
            .ok_or_else(|| CliError::Config("`qmmm.selection` is required.".to_string()))?;

        let calculators = self.calculators.take().unwrap_or_default();
        let qm_calculator = resolve_calculator("qm", calculators.qm)?;
        let mm_calculator = resolve_calculator("mm", calculators.mm)?;

        let mut builder = EvaluationConfigBuilder::new()
            .selection(selection.into())
            .scheme(scheme)
            .vacuum(vacuum)
            .qm_calculator(qm_calculator)
            .mm_calculator(mm_calculator);

        // Parameter files are only read when the scheme will use them.
        if scheme == Scheme::Explicit {
            if let Some(interaction) = self.interaction.take() {
                builder = builder.interaction(self.load_interaction(interaction)?);
            }
        }

        builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn load_interaction(&self, partial: PartialInteractionConfig) -> Result<InteractionConfig> {
        match partial {
            PartialInteractionConfig::SpeciesTable { parameters } => {
                let table = LjSpeciesTable::load(&self.resolve(&parameters))?;
                Ok(InteractionConfig::SpeciesTable(table))
            }
            PartialInteractionConfig::General {
                qm_parameters,
                mm_parameters,
                qm_molecule_size,
                mm_molecule_size,
                cutoff,
                width,
            } => Ok(InteractionConfig::General {
                qm: AtomicLjTable::load_csv(&self.resolve(&qm_parameters))?,
                mm: AtomicLjTable::load_csv(&self.resolve(&mm_parameters))?,
                qm_molecule_size: qm_molecule_size.unwrap_or(DEFAULT_MOLECULE_SIZE),
                mm_molecule_size: mm_molecule_size.unwrap_or(DEFAULT_MOLECULE_SIZE),
                cutoff,
                width: width.unwrap_or(DEFAULT_SWITCH_WIDTH),
            }),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv in set_values {
            let (key, value) = kv.split_once('=').ok_or_else(|| {
                CliError::Config(format!("Invalid --set format: '{}'. Expected KEY=VALUE.", kv))
            })?;
            let key = key.trim();
            let value = value.trim();

            match key {
                "qmmm.scheme" => {
                    let scheme = match value {
                        "subtractive" => Scheme::Subtractive,
                        "explicit" => Scheme::Explicit,
                        _ => {
                            return Err(CliError::Config(format!(
                                "Unknown scheme '{}' for key '{}'.",
                                value, key
                            )));
                        }
                    };
                    self.qmmm.get_or_insert_with(Default::default).scheme = Some(scheme);
                }
                "qmmm.vacuum" => {
                    self.qmmm.get_or_insert_with(Default::default).vacuum =
                        Some(parse_value(key, value)?);
                }
                "calculators.qm.sigma" => {
                    self.calculator_mut("qm").sigma = Some(parse_value(key, value)?)
                }
                "calculators.qm.epsilon" => {
                    self.calculator_mut("qm").epsilon = Some(parse_value(key, value)?)
                }
                "calculators.qm.cutoff" => {
                    self.calculator_mut("qm").cutoff = Some(parse_value(key, value)?)
                }
                "calculators.mm.sigma" => {
                    self.calculator_mut("mm").sigma = Some(parse_value(key, value)?)
                }
                "calculators.mm.epsilon" => {
                    self.calculator_mut("mm").epsilon = Some(parse_value(key, value)?)
                }
                "calculators.mm.cutoff" => {
                    self.calculator_mut("mm").cutoff = Some(parse_value(key, value)?)
                }
                "interaction.cutoff" | "interaction.width" => {
                    let parsed: f64 = parse_value(key, value)?;
                    match self.interaction.as_mut() {
                        Some(PartialInteractionConfig::General { cutoff, width, .. }) => {
                            if key == "interaction.cutoff" {
                                *cutoff = Some(parsed);
                            } else {
                                *width = Some(parsed);
                            }
                        }
                        _ => {
                            return Err(CliError::Config(format!(
                                "Key '{}' requires an [interaction] section of type 'general'.",
                                key
                            )));
                        }
                    }
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unknown or unsupported key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    fn calculator_mut(&mut self, role: &str) -> &mut PartialLjCalculatorConfig {
        let calculators = self.calculators.get_or_insert_with(Default::default);
        let slot = if role == "qm" {
            &mut calculators.qm
        } else {
            &mut calculators.mm
        };
        slot.get_or_insert_with(Default::default)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!("Invalid value '{}' for key '{}'", value, key))
    })
}

fn resolve_calculator(
    role: &str,
    partial: Option<PartialLjCalculatorConfig>,
) -> Result<LjCalculatorConfig> {
    let partial = partial.unwrap_or_default();
    let sigma = partial
        .sigma
        .ok_or_else(|| CliError::Config(format!("`calculators.{role}.sigma` is required.")))?;
    let epsilon = partial
        .epsilon
        .ok_or_else(|| CliError::Config(format!("`calculators.{role}.epsilon` is required.")))?;
    Ok(LjCalculatorConfig {
        sigma,
        epsilon,
        cutoff: partial.cutoff,
    })
}
