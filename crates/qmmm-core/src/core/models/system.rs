use super::cell::{Cell, PeriodicBox};
use crate::core::utils::geometry;
use nalgebra::{Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SystemError {
    #[error("Cell is not orthorhombic; only diagonal cells are supported")]
    NonOrthorhombicCell,

    #[error("Periodic axis {axis} has non-positive length {length}")]
    NonPositiveCellLength { axis: usize, length: f64 },

    #[error("Atom index {index} is out of range for a system of {len} atoms")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Expected {expected} positions, got {found}")]
    PositionCountMismatch { expected: usize, found: usize },

    #[error("Expected {expected} charges, got {found}")]
    ChargeCountMismatch { expected: usize, found: usize },

    #[error("Got {positions} positions but {numbers} atomic numbers")]
    InconsistentArrays { positions: usize, numbers: usize },

    #[error("Cannot center an empty system")]
    EmptySystem,

    #[error("Vacuum padding must be a non-negative number, got {0}")]
    InvalidVacuum(f64),
}

/// A position constraint carried by an [`AtomicSystem`].
///
/// Constraints are never sliced into subsystems; they stay on the system they were
/// attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Atoms whose positions are held fixed by the integrator.
    FixAtoms(Vec<usize>),
}

/// An ordered collection of atoms with a simulation cell and per-axis periodicity.
///
/// Each atom has a position, an atomic number and a charge (zero unless set). This is the
/// minimal container the QM/MM calculators need: slicing by index set, vacuum centering
/// and position updates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AtomicSystem {
    positions: Vec<Point3<f64>>,
    numbers: Vec<u8>,
    charges: Vec<f64>,
    cell: Cell,
    pbc: [bool; 3],
    constraints: Vec<Constraint>,
}

impl AtomicSystem {
    /// Creates a non-periodic system with a zero cell and zero charges.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::InconsistentArrays`] if the two arrays differ in length.
    pub fn new(numbers: Vec<u8>, positions: Vec<Point3<f64>>) -> Result<Self, SystemError> {
        if numbers.len() != positions.len() {
            return Err(SystemError::InconsistentArrays {
                positions: positions.len(),
                numbers: numbers.len(),
            });
        }
        Ok(Self {
            charges: vec![0.0; numbers.len()],
            positions,
            numbers,
            cell: Cell::default(),
            pbc: [false; 3],
            constraints: Vec::new(),
        })
    }

    pub fn with_cell(mut self, cell: Cell) -> Self {
        self.cell = cell;
        self
    }

    pub fn with_pbc(mut self, pbc: [bool; 3]) -> Self {
        self.pbc = pbc;
        self
    }

    pub fn with_charges(mut self, charges: Vec<f64>) -> Result<Self, SystemError> {
        if charges.len() != self.len() {
            return Err(SystemError::ChargeCountMismatch {
                expected: self.len(),
                found: charges.len(),
            });
        }
        self.charges = charges;
        Ok(self)
    }

    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Replaces all positions.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::PositionCountMismatch`] if the number of positions differs
    /// from the number of atoms.
    pub fn set_positions(&mut self, positions: &[Point3<f64>]) -> Result<(), SystemError> {
        if positions.len() != self.len() {
            return Err(SystemError::PositionCountMismatch {
                expected: self.len(),
                found: positions.len(),
            });
        }
        self.positions.copy_from_slice(positions);
        Ok(())
    }

    pub fn numbers(&self) -> &[u8] {
        &self.numbers
    }

    pub fn charges(&self) -> &[f64] {
        &self.charges
    }

    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    pub fn pbc(&self) -> [bool; 3] {
        self.pbc
    }

    pub fn set_pbc(&mut self, pbc: [bool; 3]) {
        self.pbc = pbc;
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Builds the validated wrapping box for this system's cell and periodicity.
    pub fn periodic_box(&self) -> Result<PeriodicBox, SystemError> {
        PeriodicBox::new(self.cell.lengths()?, self.pbc)
    }

    /// Copies the positions of the given atoms, in the given order.
    pub fn gather_positions(&self, indices: &[usize]) -> Result<Vec<Point3<f64>>, SystemError> {
        indices
            .iter()
            .map(|&index| {
                self.positions
                    .get(index)
                    .copied()
                    .ok_or(SystemError::IndexOutOfRange {
                        index,
                        len: self.len(),
                    })
            })
            .collect()
    }

    /// Creates a new system holding copies of the selected atoms.
    ///
    /// Positions, atomic numbers, charges, cell and periodicity are copied. Constraints
    /// are left behind on `self`, since their indices refer to the parent system.
    pub fn select(&self, indices: &[usize]) -> Result<AtomicSystem, SystemError> {
        let positions = self.gather_positions(indices)?;
        Ok(Self {
            positions,
            numbers: indices.iter().map(|&i| self.numbers[i]).collect(),
            charges: indices.iter().map(|&i| self.charges[i]).collect(),
            cell: self.cell,
            pbc: self.pbc,
            constraints: Vec::new(),
        })
    }

    pub fn centroid(&self) -> Option<Point3<f64>> {
        geometry::centroid(&self.positions)
    }

    pub fn translate(&mut self, shift: &Vector3<f64>) {
        for position in &mut self.positions {
            *position += *shift;
        }
    }

    /// Resizes the cell to the atoms' bounding box plus `vacuum` on every side and moves
    /// the atoms to the middle of it.
    ///
    /// The resulting cell is always orthorhombic, whatever the previous cell was.
    pub fn center_in_vacuum(&mut self, vacuum: f64) -> Result<(), SystemError> {
        if vacuum.is_nan() || vacuum < 0.0 {
            return Err(SystemError::InvalidVacuum(vacuum));
        }
        let first = self.positions.first().ok_or(SystemError::EmptySystem)?;
        let (lower, upper) = self.positions.iter().fold(
            (first.coords, first.coords),
            |(lower, upper), p| (lower.inf(&p.coords), upper.sup(&p.coords)),
        );
        let lengths = (upper - lower).add_scalar(2.0 * vacuum);
        let shift = lengths * 0.5 - (lower + upper) * 0.5;
        self.translate(&shift);
        self.cell = Cell::orthorhombic(lengths);
        Ok(())
    }
}
