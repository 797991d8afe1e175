use super::{Interaction, InteractionError, InteractionResult};
use crate::core::forcefield::params::{AtomicLjTable, CombinedLj, combine_lorentz_berthelot};
use crate::core::forcefield::potentials;
use crate::core::models::system::AtomicSystem;
use crate::core::utils::geometry;
use nalgebra::{Point3, Vector3};

/// Molecule-wise Lennard-Jones interaction between rigid QM and MM molecules.
///
/// Per-atom parameters for one QM molecule and one MM molecule are combined with the
/// Lorentz-Berthelot rule. Both regions must consist of whole molecules laid out
/// consecutively. Each QM/MM molecule pair is switched off smoothly as the distance between
/// their first atoms goes from `cutoff - width` to `cutoff`.
#[derive(Debug, Clone, PartialEq)]
pub struct LjInteractionsGeneral {
    combined: CombinedLj,
    qm_molecule_size: usize,
    mm_molecule_size: usize,
    cutoff: f64,
    width: f64,
}

struct Switch {
    r00: Vector3<f64>,
    d00: f64,
    t: f64,
    dt: f64,
}

impl LjInteractionsGeneral {
    pub fn new(
        qm: &AtomicLjTable,
        mm: &AtomicLjTable,
        qm_molecule_size: usize,
        mm_molecule_size: usize,
    ) -> Result<Self, InteractionError> {
        check_table_shape("QM", qm, qm_molecule_size)?;
        check_table_shape("MM", mm, mm_molecule_size)?;
        let combined =
            combine_lorentz_berthelot(qm.sigma(), qm.epsilon(), mm.sigma(), mm.epsilon())?;
        Ok(Self {
            combined,
            qm_molecule_size,
            mm_molecule_size,
            cutoff: f64::INFINITY,
            width: 1.0,
        })
    }

    /// Enables the smooth cutoff. `width` must lie in `(0, cutoff]`.
    pub fn with_cutoff(mut self, cutoff: f64, width: f64) -> Result<Self, InteractionError> {
        let valid = cutoff > 0.0 && width > 0.0 && width.is_finite() && width <= cutoff;
        if !valid {
            return Err(InteractionError::InvalidSwitch { cutoff, width });
        }
        self.cutoff = cutoff;
        self.width = width;
        Ok(self)
    }

    pub fn combined(&self) -> &CombinedLj {
        &self.combined
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    fn switch_for(&self, qm_anchor: &Point3<f64>, mm_molecule: &[Point3<f64>]) -> Switch {
        let r00 = mm_molecule[0] - qm_anchor;
        let d00 = r00.norm();
        let (t, dt) = potentials::cutoff_switch(d00, self.cutoff, self.width);
        Switch { r00, d00, t, dt }
    }
}

fn check_table_shape(
    side: &'static str,
    table: &AtomicLjTable,
    molecule_size: usize,
) -> Result<(), InteractionError> {
    if table.len() != molecule_size {
        return Err(InteractionError::TableShape {
            side,
            found: table.len(),
            molecule_size,
        });
    }
    Ok(())
}

fn check_whole_molecules(
    region: &'static str,
    atoms: usize,
    molecule_size: usize,
) -> Result<(), InteractionError> {
    if atoms % molecule_size != 0 {
        return Err(InteractionError::IncompleteMolecule {
            region,
            atoms,
            molecule_size,
        });
    }
    Ok(())
}

impl Interaction for LjInteractionsGeneral {
    fn name(&self) -> &str {
        "LJ-general"
    }

    fn calculate(
        &self,
        qm: &AtomicSystem,
        mm: &AtomicSystem,
        shift: &Vector3<f64>,
    ) -> Result<InteractionResult, InteractionError> {
        let (apm1, apm2) = (self.qm_molecule_size, self.mm_molecule_size);
        check_whole_molecules("QM", qm.len(), apm1)?;
        check_whole_molecules("MM", mm.len(), apm2)?;

        let qm_center = Point3::from(qm.cell().lengths()? / 2.0);
        let mm_positions =
            geometry::wrap_molecules(mm.positions(), apm2, shift, &qm_center, &mm.periodic_box()?);

        let mut result = InteractionResult::zeros(qm.len(), mm.len());

        for (q, qm_molecule) in qm.positions().chunks_exact(apm1).enumerate() {
            let first_qm = q * apm1;
            let switches: Vec<Switch> = mm_positions
                .chunks_exact(apm2)
                .map(|mm_molecule| self.switch_for(&qm_molecule[0], mm_molecule))
                .collect();

            for (qa, r_qa) in qm_molecule.iter().enumerate() {
                if self.combined.epsilon.row(qa).iter().all(|&e| e == 0.0) {
                    continue;
                }
                for (m, (mm_molecule, switch)) in
                    mm_positions.chunks_exact(apm2).zip(&switches).enumerate()
                {
                    if switch.t == 0.0 && switch.dt == 0.0 {
                        continue;
                    }
                    let mut molecule_energy = 0.0;
                    for (ma, r_ma) in mm_molecule.iter().enumerate() {
                        let r = r_ma - r_qa;
                        let d2 = r.norm_squared();
                        if d2 <= 0.0 {
                            return Err(InteractionError::ZeroDistance {
                                qm_index: first_qm + qa,
                                mm_index: m * apm2 + ma,
                            });
                        }
                        let (energy, force_scale) = potentials::lennard_jones_12_6(
                            d2,
                            self.combined.sigma[(qa, ma)],
                            self.combined.epsilon[(qa, ma)],
                        );
                        molecule_energy += energy;
                        let f = r * (force_scale * switch.t);
                        result.mm_forces[m * apm2 + ma] += f;
                        result.qm_forces[first_qm + qa] -= f;
                    }
                    result.energy += molecule_energy * switch.t;

                    if switch.dt != 0.0 {
                        // Switch derivative acts along the first-atom separation only.
                        let f00 = switch.r00 * (-molecule_energy * switch.dt / switch.d00);
                        result.qm_forces[first_qm] -= f00;
                        result.mm_forces[m * apm2] += f00;
                    }
                }
            }
        }
        Ok(result)
    }
}
