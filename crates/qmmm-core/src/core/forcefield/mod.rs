//! # Force Field Module
//!
//! Lennard-Jones building blocks for the explicit QM/MM coupling.
//!
//! ## Key Components
//!
//! - [`potentials`] - The 12-6 pair term and the smooth cutoff switch
//! - [`params`] - Species-pair and per-atom σ/ε tables, their file formats, and
//!   Lorentz-Berthelot combination
//! - [`interactions`] - The [`interactions::Interaction`] engines that compute the QM↔MM
//!   dispersion/repulsion energy and forces
//! - [`term`] - Per-term energy breakdown of a coupled evaluation
//!
//! ```ignore
//! use qmmm::core::forcefield::interactions::{Interaction, lj::LjInteractions};
//!
//! let lj = LjInteractions::from_symbols([(("O", "O"), (0.1521, 3.1507))])?;
//! let result = lj.calculate(&qm_system, &mm_system, &shift)?;
//! ```

pub mod interactions;
pub mod params;
pub(crate) mod potentials;
pub mod term;
