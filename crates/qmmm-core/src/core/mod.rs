//! # Core Module
//!
//! Fundamental building blocks for QM/MM coupling.
//!
//! - **Atomic Representation** ([`models`]) - Atomic systems, orthorhombic cells, QM selections
//! - **Calculators** ([`calculator`]) - The capability contract consumed from QM and MM engines
//! - **Force Field** ([`forcefield`]) - Lennard-Jones potentials, parameter tables and the
//!   explicit QM/MM interaction engines
//! - **Utilities** ([`utils`]) - Geometry helpers such as molecule-preserving periodic wrapping

pub mod calculator;
pub mod forcefield;
pub mod models;
pub mod utils;
