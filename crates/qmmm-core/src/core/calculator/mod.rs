//! # Calculator Contract
//!
//! Traits through which the QM/MM schemes talk to the quantum and classical engines they
//! couple. Every engine implements [`Calculator`]. Engines that take part in electrostatic
//! embedding additionally expose one of two optional capabilities:
//!
//! - [`PointChargeEmbedder`] on the QM side, which accepts external point charges and
//!   hands back a [`PointChargePotential`] used to move them and read their forces.
//! - [`ChargeModel`] on the MM side, which supplies the charges and may expand real atoms
//!   into additional virtual charge sites.
//!
//! Capabilities are discovered once, when a scheme is first initialized.

pub mod lennard_jones;

use crate::core::models::system::{AtomicSystem, SystemError};
use nalgebra::{Point3, Vector3};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalculatorError {
    #[error("Calculator '{name}' failed: {message}")]
    Failed { name: String, message: String },

    #[error("Calculator '{name}' returned {found} forces for {expected} atoms")]
    ForceCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    System(#[from] SystemError),

    #[error(transparent)]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Energy and per-atom forces from one calculator call.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub energy: f64,
    pub forces: Vec<Vector3<f64>>,
}

impl Evaluation {
    pub fn new(energy: f64, forces: Vec<Vector3<f64>>) -> Self {
        Self { energy, forces }
    }

    pub fn zeros(n_atoms: usize) -> Self {
        Self::new(0.0, vec![Vector3::zeros(); n_atoms])
    }

    /// Rejects results whose force array does not cover exactly `expected` atoms.
    pub fn checked(self, name: &str, expected: usize) -> Result<Self, CalculatorError> {
        if self.forces.len() != expected {
            return Err(CalculatorError::ForceCount {
                name: name.to_string(),
                expected,
                found: self.forces.len(),
            });
        }
        Ok(self)
    }
}

/// Extra settings forwarded to [`PointChargeEmbedder::embed`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingParameters {
    /// Long-range cutoff for the point-charge interaction. When set, the potential also
    /// receives the geometric center of each MM molecule, one copy per charge site.
    pub long_range_cutoff: Option<f64>,
    /// Backend-specific numeric options, passed through untouched.
    pub extra: BTreeMap<String, f64>,
}

/// Handle to the external point charges inside a QM calculator.
///
/// The handle shares its state with the calculator that issued it: once positions are
/// set, the next QM evaluation includes the field of the charges.
pub trait PointChargePotential {
    fn set_positions(
        &mut self,
        positions: &[Point3<f64>],
        molecule_centers: Option<&[Point3<f64>]>,
    ) -> Result<(), CalculatorError>;

    /// Forces exerted by the QM density on each charge site, as of the last QM evaluation.
    fn forces(&mut self) -> Result<Vec<Vector3<f64>>, CalculatorError>;
}

pub trait PointChargeEmbedder {
    fn embed(
        &mut self,
        charges: &[f64],
        parameters: &EmbeddingParameters,
    ) -> Result<Box<dyn PointChargePotential>, CalculatorError>;
}

/// Charge description of a classical model.
///
/// Models without virtual sites only implement [`ChargeModel::virtual_charges`]; the
/// expansion and force redistribution then default to the identity.
pub trait ChargeModel {
    /// One charge per charge site, in site order.
    fn virtual_charges(&mut self, system: &AtomicSystem) -> Result<Vec<f64>, CalculatorError>;

    fn add_virtual_sites(
        &self,
        positions: Vec<Point3<f64>>,
    ) -> Result<Vec<Point3<f64>>, CalculatorError> {
        Ok(positions)
    }

    /// Maps forces on charge sites back onto the real atoms that carry them.
    fn redistribute_forces(
        &self,
        forces: Vec<Vector3<f64>>,
    ) -> Result<Vec<Vector3<f64>>, CalculatorError> {
        Ok(forces)
    }
}

pub trait Calculator {
    fn name(&self) -> &str;

    fn calculate(&mut self, system: &AtomicSystem) -> Result<Evaluation, CalculatorError>;

    fn potential_energy(&mut self, system: &AtomicSystem) -> Result<f64, CalculatorError> {
        Ok(self.calculate(system)?.energy)
    }

    fn forces(&mut self, system: &AtomicSystem) -> Result<Vec<Vector3<f64>>, CalculatorError> {
        Ok(self.calculate(system)?.forces)
    }

    fn embedder(&mut self) -> Option<&mut dyn PointChargeEmbedder> {
        None
    }

    fn charge_model(&mut self) -> Option<&mut dyn ChargeModel> {
        None
    }
}
