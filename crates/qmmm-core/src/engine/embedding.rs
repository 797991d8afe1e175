use super::error::QmmmError;
use crate::core::calculator::{Calculator, ChargeModel, EmbeddingParameters, PointChargePotential};
use crate::core::models::system::AtomicSystem;
use crate::core::utils::geometry;
use nalgebra::{Point3, Vector3};
use std::fmt;
use tracing::debug;

const DEFAULT_MOLECULE_SIZE: usize = 3;

struct Bound {
    potential: Box<dyn PointChargePotential>,
    virtual_molecule_size: usize,
}

/// Electrostatic embedding of the MM charges in the QM calculation.
///
/// The MM region is treated as consecutive rigid molecules of `molecule_size` atoms. Each
/// step the molecules are wrapped, whole, into the periodic image closest to the center of
/// the QM box and handed to the QM calculator's point-charge potential. The forces the QM
/// density exerts on the charges are mapped back onto the real MM atoms.
pub struct Embedding {
    molecule_size: usize,
    parameters: EmbeddingParameters,
    bound: Option<Bound>,
}

impl Default for Embedding {
    fn default() -> Self {
        Self::new(DEFAULT_MOLECULE_SIZE)
    }
}

impl fmt::Debug for Embedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Embedding")
            .field("molecule_size", &self.molecule_size)
            .field("parameters", &self.parameters)
            .field("virtual_molecule_size", &self.virtual_molecule_size())
            .finish()
    }
}

impl fmt::Display for Embedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Embedding(molecule_size={})", self.molecule_size)
    }
}

impl Embedding {
    pub fn new(molecule_size: usize) -> Self {
        Self {
            molecule_size,
            parameters: EmbeddingParameters::default(),
            bound: None,
        }
    }

    pub fn with_parameters(mut self, parameters: EmbeddingParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn molecule_size(&self) -> usize {
        self.molecule_size
    }

    pub fn parameters(&self) -> &EmbeddingParameters {
        &self.parameters
    }

    /// Charge sites per MM molecule, known once initialized.
    pub fn virtual_molecule_size(&self) -> Option<usize> {
        self.bound.as_ref().map(|b| b.virtual_molecule_size)
    }

    pub fn is_initialized(&self) -> bool {
        self.bound.is_some()
    }

    /// Fetches the MM charges and registers them with the QM calculator.
    ///
    /// With counter-ions the number of charge sites need not be a multiple of the number of
    /// MM atoms; `virtual_molecule_size` is then only an approximation.
    pub fn initialize(
        &mut self,
        mm: &AtomicSystem,
        qm_calc: &mut dyn Calculator,
        mm_calc: &mut dyn Calculator,
    ) -> Result<(), QmmmError> {
        if self.molecule_size == 0 {
            return Err(QmmmError::Configuration(
                "embedding molecule size must be positive".to_string(),
            ));
        }
        if mm.is_empty() {
            return Err(QmmmError::Configuration(
                "embedding requires a non-empty MM region".to_string(),
            ));
        }
        if mm.len() % self.molecule_size != 0 {
            return Err(QmmmError::Configuration(format!(
                "MM region has {} atoms, which is not a multiple of the embedding molecule size {}",
                mm.len(),
                self.molecule_size
            )));
        }

        let charges = charge_model(mm_calc)?.virtual_charges(mm)?;

        let qm_name = qm_calc.name().to_string();
        let embedder = qm_calc.embedder().ok_or(QmmmError::MissingCapability {
            calculator: qm_name,
            capability: "point-charge embedding",
        })?;
        let potential = embedder.embed(&charges, &self.parameters)?;

        let virtual_molecule_size = self.molecule_size * charges.len() / mm.len();
        debug!(
            charges = charges.len(),
            virtual_molecule_size, "Point-charge embedding initialized."
        );
        self.bound = Some(Bound {
            potential,
            virtual_molecule_size,
        });
        Ok(())
    }

    /// Moves the point charges to the current MM positions, shifted like the QM atoms.
    pub fn update(
        &mut self,
        qm: &AtomicSystem,
        mm: &AtomicSystem,
        mm_calc: &mut dyn Calculator,
        shift: &Vector3<f64>,
    ) -> Result<(), QmmmError> {
        let bound = self.bound.as_mut().ok_or(QmmmError::NotInitialized {
            component: "Embedding",
        })?;

        let qm_center = Point3::from(qm.cell().lengths()? / 2.0);
        let positions = geometry::wrap_molecules(
            mm.positions(),
            self.molecule_size,
            shift,
            &qm_center,
            &mm.periodic_box()?,
        );

        let centers: Vec<Point3<f64>> = geometry::molecule_centers(&positions, self.molecule_size)
            .into_iter()
            .flat_map(|c| std::iter::repeat_n(c, bound.virtual_molecule_size))
            .collect();

        let sites = charge_model(mm_calc)?.add_virtual_sites(positions)?;

        if self.parameters.long_range_cutoff.is_some() {
            bound.potential.set_positions(&sites, Some(&centers))?;
        } else {
            bound.potential.set_positions(&sites, None)?;
        }
        Ok(())
    }

    /// Forces from the QM region on the real MM atoms.
    pub fn mm_forces(
        &mut self,
        mm_calc: &mut dyn Calculator,
    ) -> Result<Vec<Vector3<f64>>, QmmmError> {
        let bound = self.bound.as_mut().ok_or(QmmmError::NotInitialized {
            component: "Embedding",
        })?;
        let site_forces = bound.potential.forces()?;
        Ok(charge_model(mm_calc)?.redistribute_forces(site_forces)?)
    }
}

fn charge_model(mm_calc: &mut dyn Calculator) -> Result<&mut dyn ChargeModel, QmmmError> {
    let name = mm_calc.name().to_string();
    mm_calc.charge_model().ok_or(QmmmError::MissingCapability {
        calculator: name,
        capability: "charge model",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::cell::Cell;
    use crate::engine::test_utils::{ChargedMm, EmbeddingQm, MockCalculator, water_box};

    const TOLERANCE: f64 = 1e-10;

    fn mm_waters(n: usize) -> AtomicSystem {
        let full = water_box(n);
        let indices: Vec<usize> = (3..full.len()).collect();
        full.select(&indices).unwrap()
    }

    fn calculators() -> (EmbeddingQm, ChargedMm) {
        (
            EmbeddingQm::new(
                MockCalculator::constant("qm", 0.0),
                Vector3::new(0.0, 0.0, 1.0),
            ),
            ChargedMm::new(MockCalculator::constant("mm", 0.0)),
        )
    }

    #[test]
    fn default_embedding_uses_three_atom_molecules() {
        let embedding = Embedding::default();
        assert_eq!(embedding.molecule_size(), 3);
        assert_eq!(embedding.to_string(), "Embedding(molecule_size=3)");
        assert!(!embedding.is_initialized());
    }

    #[test]
    fn initialize_passes_charges_and_parameters_to_qm() {
        let (mut qm, mut mm_calc) = calculators();
        let field = qm.field();
        let mm = mm_waters(2);
        let parameters = EmbeddingParameters {
            long_range_cutoff: Some(12.0),
            ..Default::default()
        };
        let mut embedding = Embedding::default().with_parameters(parameters.clone());

        embedding.initialize(&mm, &mut qm, &mut mm_calc).unwrap();

        assert_eq!(field.borrow().charges, mm.charges());
        assert_eq!(field.borrow().parameters, parameters);
        assert_eq!(embedding.virtual_molecule_size(), Some(3));
    }

    #[test]
    fn counter_ion_charges_round_down_virtual_molecule_size() {
        let (mut qm, mm_calc) = calculators();
        let mut mm_calc = mm_calc.with_extra_charges(2);
        let mut embedding = Embedding::default();

        embedding
            .initialize(&mm_waters(2), &mut qm, &mut mm_calc)
            .unwrap();

        // 3 * 8 charges / 6 atoms
        assert_eq!(embedding.virtual_molecule_size(), Some(4));
    }

    #[test]
    fn initialize_requires_both_capabilities() {
        let (mut qm, mut mm_calc) = calculators();
        let mut plain = MockCalculator::constant("plain", 0.0);
        let mm = mm_waters(1);

        let result = Embedding::default().initialize(&mm, &mut qm, &mut plain);
        assert!(matches!(
            result,
            Err(QmmmError::MissingCapability { capability: "charge model", .. })
        ));

        let result = Embedding::default().initialize(&mm, &mut plain, &mut mm_calc);
        assert!(matches!(
            result,
            Err(QmmmError::MissingCapability {
                capability: "point-charge embedding",
                ..
            })
        ));
    }

    #[test]
    fn initialize_rejects_empty_or_partial_mm_region() {
        let (mut qm, mut mm_calc) = calculators();
        let empty = AtomicSystem::default();
        assert!(matches!(
            Embedding::default().initialize(&empty, &mut qm, &mut mm_calc),
            Err(QmmmError::Configuration(_))
        ));
        assert!(matches!(
            Embedding::new(4).initialize(&mm_waters(1), &mut qm, &mut mm_calc),
            Err(QmmmError::Configuration(_))
        ));
    }

    #[test]
    fn update_before_initialize_fails() {
        let (_, mut mm_calc) = calculators();
        let mm = mm_waters(1);
        let mut embedding = Embedding::default();
        assert!(matches!(
            embedding.update(&mm, &mm, &mut mm_calc, &Vector3::zeros()),
            Err(QmmmError::NotInitialized { .. })
        ));
        assert!(matches!(
            embedding.mm_forces(&mut mm_calc),
            Err(QmmmError::NotInitialized { .. })
        ));
    }

    #[test]
    fn update_wraps_whole_molecules_next_to_qm_center() {
        let (mut qm_calc, mut mm_calc) = calculators();
        let field = qm_calc.field();
        let qm = AtomicSystem::new(vec![8], vec![Point3::new(4.0, 4.0, 4.0)])
            .unwrap()
            .with_cell(Cell::orthorhombic(Vector3::new(8.0, 8.0, 8.0)));
        let mut mm = mm_waters(2).with_cell(Cell::orthorhombic(Vector3::new(
            12.0, 12.0, 12.0,
        )));
        mm.set_pbc([true, true, true]);
        let mut embedding = Embedding::default().with_parameters(EmbeddingParameters {
            long_range_cutoff: Some(6.0),
            ..Default::default()
        });
        embedding.initialize(&mm, &mut qm_calc, &mut mm_calc).unwrap();

        let shift = Vector3::new(1.5, 2.0, 2.0);
        embedding
            .update(&qm, &mm, &mut mm_calc, &shift)
            .unwrap();

        let field = field.borrow();
        assert_eq!(field.positions.len(), mm.len());
        for (wrapped, original) in field
            .positions
            .chunks_exact(3)
            .zip(mm.positions().chunks_exact(3))
        {
            // Intramolecular geometry survives wrapping.
            for k in 1..3 {
                let before = original[k] - original[0];
                let after = wrapped[k] - wrapped[0];
                assert!((before - after).norm() < TOLERANCE);
            }
            // The anchor atom ends up within half a cell of the QM box center.
            let d = wrapped[0] - Point3::new(4.0, 4.0, 4.0);
            assert!(d.iter().all(|c| c.abs() <= 6.0 + TOLERANCE));
            // Offsets are whole cell lengths after the shift.
            let offset = wrapped[0] - (original[0] + shift);
            for c in offset.iter() {
                assert!(((c / 12.0).round() * 12.0 - c).abs() < TOLERANCE);
            }
        }

        let centers = field.centers.as_ref().unwrap();
        assert_eq!(centers.len(), 6);
        assert_eq!(centers[0], centers[2]);
    }

    #[test]
    fn update_without_long_range_cutoff_sends_no_centers() {
        let (mut qm_calc, mut mm_calc) = calculators();
        let field = qm_calc.field();
        let mm = mm_waters(1);
        let mut embedding = Embedding::default();
        embedding.initialize(&mm, &mut qm_calc, &mut mm_calc).unwrap();

        embedding
            .update(&mm, &mm, &mut mm_calc, &Vector3::zeros())
            .unwrap();

        assert!(field.borrow().centers.is_none());
        assert_eq!(field.borrow().positions, mm.positions());
    }

    #[test]
    fn mm_forces_are_redistributed_by_the_charge_model() {
        let (mut qm_calc, mut mm_calc) = calculators();
        let mm = mm_waters(1);
        let mut embedding = Embedding::default();
        embedding.initialize(&mm, &mut qm_calc, &mut mm_calc).unwrap();
        embedding
            .update(&mm, &mm, &mut mm_calc, &Vector3::zeros())
            .unwrap();

        let forces = embedding.mm_forces(&mut mm_calc).unwrap();

        // Site force is q * z, doubled by redistribution.
        assert_eq!(forces.len(), 3);
        assert!((forces[0].z - 2.0 * -0.834).abs() < TOLERANCE);
        assert!((forces[1].z - 2.0 * 0.417).abs() < TOLERANCE);
    }
}
