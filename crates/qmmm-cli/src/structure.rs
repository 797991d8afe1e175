use crate::error::{CliError, Result};
use nalgebra::{Point3, Vector3};
use qmmm::core::models::cell::Cell;
use qmmm::core::models::elements;
use qmmm::core::models::system::AtomicSystem;
use serde::Deserialize;
use std::path::Path;

/// On-disk structure description.
///
/// ```toml
/// cell = [20.0, 20.0, 20.0]
/// pbc = [true, true, true]
///
/// [[atoms]]
/// symbol = "O"
/// position = [0.0, 0.0, 0.0]
/// charge = -0.834
/// ```
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct StructureFile {
    cell: Option<[f64; 3]>,
    pbc: Option<[bool; 3]>,
    #[serde(default)]
    atoms: Vec<AtomRecord>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct AtomRecord {
    symbol: String,
    position: [f64; 3],
    charge: Option<f64>,
}

pub fn load_structure(path: &Path) -> Result<AtomicSystem> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    let file: StructureFile = toml::from_str(&content).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    build_system(file)
}

fn build_system(file: StructureFile) -> Result<AtomicSystem> {
    if file.atoms.is_empty() {
        return Err(CliError::Config(
            "Structure file contains no atoms.".to_string(),
        ));
    }

    let mut numbers = Vec::with_capacity(file.atoms.len());
    let mut positions = Vec::with_capacity(file.atoms.len());
    let mut charges = Vec::with_capacity(file.atoms.len());
    for (index, atom) in file.atoms.iter().enumerate() {
        let number = elements::atomic_number(&atom.symbol).ok_or_else(|| {
            CliError::Config(format!(
                "Unknown element symbol '{}' for atom {}",
                atom.symbol, index
            ))
        })?;
        numbers.push(number);
        positions.push(Point3::from(atom.position));
        charges.push(atom.charge.unwrap_or(0.0));
    }

    let mut system = AtomicSystem::new(numbers, positions)?.with_charges(charges)?;
    if let Some(lengths) = file.cell {
        system = system.with_cell(Cell::orthorhombic(Vector3::from(lengths)));
    }
    if let Some(pbc) = file.pbc {
        system = system.with_pbc(pbc);
    }
    Ok(system)
}
