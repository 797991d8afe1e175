use super::{Interaction, InteractionError, InteractionResult};
use crate::core::forcefield::params::{LjSpeciesTable, ParamError};
use crate::core::forcefield::potentials;
use crate::core::models::system::AtomicSystem;
use nalgebra::Vector3;
use std::collections::BTreeSet;

/// Lennard-Jones QM↔MM interaction with final parameters per species pair.
///
/// Pairs absent from the table do not interact. MM displacements are wrapped to the
/// minimum image of the MM cell.
#[derive(Debug, Clone, PartialEq)]
pub struct LjInteractions {
    table: LjSpeciesTable,
}

impl LjInteractions {
    pub fn new(table: LjSpeciesTable) -> Self {
        Self { table }
    }

    /// Builds the engine from element-symbol pairs mapped to `(epsilon, sigma)`.
    ///
    /// ```ignore
    /// let lj = LjInteractions::from_symbols([(("O", "O"), (0.1521, 3.1507))])?;
    /// ```
    pub fn from_symbols<'a, I>(entries: I) -> Result<Self, ParamError>
    where
        I: IntoIterator<Item = ((&'a str, &'a str), (f64, f64))>,
    {
        Ok(Self::new(LjSpeciesTable::from_symbols(entries)?))
    }

    pub fn table(&self) -> &LjSpeciesTable {
        &self.table
    }
}

impl Interaction for LjInteractions {
    fn name(&self) -> &str {
        "LJ"
    }

    fn calculate(
        &self,
        qm: &AtomicSystem,
        mm: &AtomicSystem,
        shift: &Vector3<f64>,
    ) -> Result<InteractionResult, InteractionError> {
        let periodic_box = mm.periodic_box()?;
        let mut result = InteractionResult::zeros(qm.len(), mm.len());
        let species: BTreeSet<u8> = mm.numbers().iter().copied().collect();

        for (i, (&r1, &z1)) in qm.positions().iter().zip(qm.numbers()).enumerate() {
            for &z2 in &species {
                let Some(param) = self.table.get(z1, z2) else {
                    continue;
                };
                for (j, (&r2, _)) in mm
                    .positions()
                    .iter()
                    .zip(mm.numbers())
                    .enumerate()
                    .filter(|(_, (_, z))| **z == z2)
                {
                    let d = periodic_box.minimum_image((r2 + *shift) - r1);
                    let d2 = d.norm_squared();
                    if d2 <= 0.0 {
                        return Err(InteractionError::ZeroDistance {
                            qm_index: i,
                            mm_index: j,
                        });
                    }
                    let (energy, force_scale) =
                        potentials::lennard_jones_12_6(d2, param.sigma, param.epsilon);
                    let f = d * force_scale;
                    result.energy += energy;
                    result.qm_forces[i] -= f;
                    result.mm_forces[j] += f;
                }
            }
        }
        Ok(result)
    }
}
