use crate::core::models::elements;
use nalgebra::DMatrix;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("{side} parameter table is empty")]
    EmptyTable { side: &'static str },
    #[error("{side} parameter table has {sigma} σ values but {epsilon} ε values")]
    LengthMismatch {
        side: &'static str,
        sigma: usize,
        epsilon: usize,
    },
    #[error("{side} parameter table has invalid ε = {value} at index {index}")]
    InvalidEpsilon {
        side: &'static str,
        index: usize,
        value: f64,
    },
    #[error("Unknown element symbol '{0}'")]
    UnknownElement(String),
    #[error("Malformed species pair key '{0}'; expected 'A-B' (e.g. 'O-H')")]
    MalformedPairKey(String),
}

/// Final Lennard-Jones parameters for one species pair.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct LjPairParam {
    pub epsilon: f64,
    pub sigma: f64,
}

#[derive(Debug, Deserialize)]
struct LjPairFile {
    pairs: HashMap<String, LjPairParam>,
}

/// Symmetric table of pair parameters keyed by atomic number.
///
/// Inserting `(a, b)` also makes the entry visible as `(b, a)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LjSpeciesTable {
    pairs: HashMap<(u8, u8), LjPairParam>,
}

impl LjSpeciesTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, z1: u8, z2: u8, param: LjPairParam) {
        self.pairs.insert((z1, z2), param);
        self.pairs.insert((z2, z1), param);
    }

    pub fn get(&self, z1: u8, z2: u8) -> Option<&LjPairParam> {
        self.pairs.get(&(z1, z2))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Builds a table from element-symbol pairs mapped to `(epsilon, sigma)`.
    pub fn from_symbols<'a, I>(entries: I) -> Result<Self, ParamError>
    where
        I: IntoIterator<Item = ((&'a str, &'a str), (f64, f64))>,
    {
        let mut table = Self::new();
        for ((symbol1, symbol2), (epsilon, sigma)) in entries {
            table.insert(
                lookup_element(symbol1)?,
                lookup_element(symbol2)?,
                LjPairParam { epsilon, sigma },
            );
        }
        Ok(table)
    }

    /// Loads a table from a TOML file with one `[pairs.A-B]` section per species pair.
    ///
    /// ```toml
    /// [pairs.O-O]
    /// epsilon = 0.1521
    /// sigma = 3.1507
    /// ```
    pub fn load(path: &Path) -> Result<Self, ParamError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let file: LjPairFile = toml::from_str(&content).map_err(|e| ParamError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let mut table = Self::new();
        for (key, param) in file.pairs {
            let (symbol1, symbol2) = key
                .split_once('-')
                .ok_or_else(|| ParamError::MalformedPairKey(key.clone()))?;
            table.insert(lookup_element(symbol1)?, lookup_element(symbol2)?, param);
        }
        Ok(table)
    }
}

fn lookup_element(symbol: &str) -> Result<u8, ParamError> {
    elements::atomic_number(symbol.trim())
        .ok_or_else(|| ParamError::UnknownElement(symbol.to_string()))
}

#[derive(Debug, Deserialize)]
struct AtomicLjRecord {
    sigma: f64,
    epsilon: f64,
}

/// Per-atom σ and ε values for the atoms of one molecule, in atom order.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicLjTable {
    sigma: Vec<f64>,
    epsilon: Vec<f64>,
}

impl AtomicLjTable {
    pub fn new(sigma: Vec<f64>, epsilon: Vec<f64>) -> Result<Self, ParamError> {
        validate_table("per-atom", &sigma, &epsilon)?;
        Ok(Self { sigma, epsilon })
    }

    /// Loads a table from a CSV file with `sigma,epsilon` columns, one row per atom.
    pub fn load_csv(path: &Path) -> Result<Self, ParamError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| ParamError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let mut sigma = Vec::new();
        let mut epsilon = Vec::new();
        for result in reader.deserialize::<AtomicLjRecord>() {
            let record = result.map_err(|e| ParamError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
            sigma.push(record.sigma);
            epsilon.push(record.epsilon);
        }
        Self::new(sigma, epsilon)
    }

    pub fn sigma(&self) -> &[f64] {
        &self.sigma
    }

    pub fn epsilon(&self) -> &[f64] {
        &self.epsilon
    }

    pub fn len(&self) -> usize {
        self.sigma.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sigma.is_empty()
    }
}

fn validate_table(side: &'static str, sigma: &[f64], epsilon: &[f64]) -> Result<(), ParamError> {
    if sigma.is_empty() || epsilon.is_empty() {
        return Err(ParamError::EmptyTable { side });
    }
    if sigma.len() != epsilon.len() {
        return Err(ParamError::LengthMismatch {
            side,
            sigma: sigma.len(),
            epsilon: epsilon.len(),
        });
    }
    if let Some((index, &value)) = epsilon
        .iter()
        .enumerate()
        .find(|(_, e)| e.is_nan() || **e < 0.0)
    {
        return Err(ParamError::InvalidEpsilon { side, index, value });
    }
    Ok(())
}

/// Cross-combined σ and ε matrices, indexed `[(qm_atom, mm_atom)]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedLj {
    pub sigma: DMatrix<f64>,
    pub epsilon: DMatrix<f64>,
}

/// Combines QM-side and MM-side tables with the Lorentz-Berthelot rule:
/// `σ_ij = (σ_i + σ_j) / 2` and `ε_ij = sqrt(ε_i ε_j)`.
pub fn combine_lorentz_berthelot(
    sigma_qm: &[f64],
    epsilon_qm: &[f64],
    sigma_mm: &[f64],
    epsilon_mm: &[f64],
) -> Result<CombinedLj, ParamError> {
    validate_table("QM", sigma_qm, epsilon_qm)?;
    validate_table("MM", sigma_mm, epsilon_mm)?;

    let (n, m) = (sigma_qm.len(), sigma_mm.len());
    Ok(CombinedLj {
        sigma: DMatrix::from_fn(n, m, |i, j| (sigma_qm[i] + sigma_mm[j]) / 2.0),
        epsilon: DMatrix::from_fn(n, m, |i, j| (epsilon_qm[i] * epsilon_mm[j]).sqrt()),
    })
}
