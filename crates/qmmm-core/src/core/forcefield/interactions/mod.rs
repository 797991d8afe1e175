//! Explicit QM↔MM interaction engines.
//!
//! An [`Interaction`] sees the QM and MM subsystems after the QM region has been moved
//! into its own box, together with the `shift` that was applied to it. MM positions must be
//! moved by the same shift to stay consistent with the QM frame.

pub mod lj;
pub mod lj_general;

use super::params::ParamError;
use crate::core::models::system::{AtomicSystem, SystemError};
use nalgebra::Vector3;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("QM atom {qm_index} and MM atom {mm_index} are at zero separation")]
    ZeroDistance { qm_index: usize, mm_index: usize },

    #[error(
        "{region} region has {atoms} atoms, which is not a multiple of the molecule size {molecule_size}"
    )]
    IncompleteMolecule {
        region: &'static str,
        atoms: usize,
        molecule_size: usize,
    },

    #[error(
        "{side} parameter table has {found} entries but the molecule size is {molecule_size}"
    )]
    TableShape {
        side: &'static str,
        found: usize,
        molecule_size: usize,
    },

    #[error("Interaction returned {found} forces for the {region} region of {expected} atoms")]
    ForceCount {
        region: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Invalid cutoff switch: cutoff {cutoff}, width {width}")]
    InvalidSwitch { cutoff: f64, width: f64 },

    #[error(transparent)]
    System(#[from] SystemError),

    #[error(transparent)]
    Params(#[from] ParamError),
}

/// Energy and forces produced by an interaction engine.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionResult {
    pub energy: f64,
    pub qm_forces: Vec<Vector3<f64>>,
    pub mm_forces: Vec<Vector3<f64>>,
}

impl InteractionResult {
    pub(crate) fn zeros(n_qm: usize, n_mm: usize) -> Self {
        Self {
            energy: 0.0,
            qm_forces: vec![Vector3::zeros(); n_qm],
            mm_forces: vec![Vector3::zeros(); n_mm],
        }
    }

    /// Ensures there is exactly one force per atom of each region.
    pub fn check_force_counts(&self, n_qm: usize, n_mm: usize) -> Result<(), InteractionError> {
        for (region, expected, found) in [
            ("QM", n_qm, self.qm_forces.len()),
            ("MM", n_mm, self.mm_forces.len()),
        ] {
            if found != expected {
                return Err(InteractionError::ForceCount {
                    region,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }
}

pub trait Interaction {
    fn name(&self) -> &str;

    /// Computes the interaction energy and the forces it exerts on both regions.
    fn calculate(
        &self,
        qm: &AtomicSystem,
        mm: &AtomicSystem,
        shift: &Vector3<f64>,
    ) -> Result<InteractionResult, InteractionError>;
}
