use super::error::QmmmError;
use crate::core::forcefield::term::EnergyBreakdown;
use crate::core::models::selection::{Partition, Selection};
use crate::core::models::system::{AtomicSystem, SystemError};
use nalgebra::{Point3, Vector3};

/// Energy, full-system forces and per-term energies of one QM/MM evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct QmmmResult {
    pub energy: f64,
    pub forces: Vec<Vector3<f64>>,
    pub breakdown: EnergyBreakdown,
}

/// Normalizes the vacuum setting: zero means no vacuum box.
pub(crate) fn active_vacuum(vacuum: Option<f64>) -> Result<Option<f64>, QmmmError> {
    match vacuum {
        None => Ok(None),
        Some(v) if v.is_nan() || v < 0.0 => Err(QmmmError::Configuration(format!(
            "vacuum must be a non-negative number, got {v}"
        ))),
        Some(v) if v == 0.0 => Ok(None),
        Some(v) => Ok(Some(v)),
    }
}

/// The QM subsystem and the partition it was cut from.
#[derive(Debug, Clone)]
pub(crate) struct QmRegion {
    pub partition: Partition,
    pub system: AtomicSystem,
    /// Centroid of the QM atoms inside their vacuum box, when one is used.
    pub center: Option<Point3<f64>>,
}

impl QmRegion {
    /// Resolves the selection against `full` and builds the QM subsystem.
    ///
    /// The QM copy is never periodic. With a vacuum, it is moved into its own box and its
    /// centroid recorded.
    pub fn build(
        full: &AtomicSystem,
        selection: &Selection,
        vacuum: Option<f64>,
    ) -> Result<Self, QmmmError> {
        let vacuum = active_vacuum(vacuum)?;
        let partition = selection.resolve(full.len())?;
        full.periodic_box()?;

        let mut system = full.select(partition.qm_indices())?;
        system.set_pbc([false; 3]);

        let center = match vacuum {
            Some(vacuum) => {
                system.center_in_vacuum(vacuum)?;
                system.centroid()
            }
            None => None,
        };

        Ok(Self {
            partition,
            system,
            center,
        })
    }

    pub fn mm_system(&self, full: &AtomicSystem) -> Result<AtomicSystem, QmmmError> {
        Ok(full.select(self.partition.mm_indices())?)
    }

    /// Diagonal of the QM cell if the region lives in a vacuum box.
    pub fn qm_cell(&self) -> Option<Vector3<f64>> {
        self.center.map(|_| self.system.cell().matrix().diagonal())
    }

    /// Copies the current QM positions from `full` and re-centers them in the vacuum box.
    ///
    /// Returns the shift applied to the QM atoms, zero without vacuum.
    pub fn sync(&mut self, full: &AtomicSystem) -> Result<Vector3<f64>, QmmmError> {
        check_atom_count(&self.partition, full)?;
        let positions = full.gather_positions(self.partition.qm_indices())?;
        self.system.set_positions(&positions)?;

        let Some(center) = self.center else {
            return Ok(Vector3::zeros());
        };
        let shift = self
            .system
            .centroid()
            .map_or_else(Vector3::zeros, |current| center - current);
        self.system.translate(&shift);
        Ok(shift)
    }
}

pub(crate) fn check_atom_count(
    partition: &Partition,
    full: &AtomicSystem,
) -> Result<(), QmmmError> {
    if full.len() != partition.n_atoms() {
        return Err(SystemError::PositionCountMismatch {
            expected: partition.n_atoms(),
            found: full.len(),
        }
        .into());
    }
    Ok(())
}
