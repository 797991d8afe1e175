use super::embedding::Embedding;
use super::error::QmmmError;
use super::report::{Report, Reporter};
use super::state::{QmRegion, QmmmResult};
use super::subtractive::evaluate_checked;
use crate::core::calculator::{Calculator, CalculatorError, Evaluation};
use crate::core::forcefield::interactions::Interaction;
use crate::core::forcefield::term::EnergyBreakdown;
use crate::core::models::selection::Selection;
use crate::core::models::system::AtomicSystem;
use nalgebra::Vector3;
use tracing::{debug, info};

struct Partitioned {
    region: QmRegion,
    mm: AtomicSystem,
}

/// Explicit-interaction QM/MM coupling.
///
/// ```text
/// E = E_QM(R_qm) + E_MM(R_mm) + E_I(R_qm, R_mm)
/// ```
///
/// Each region is evaluated on its own. The coupling is the sum of the [`Interaction`]
/// engine and, unless disabled, the electrostatic [`Embedding`] of the MM charges in the QM
/// calculation.
pub struct ExplicitInteractionQmmm {
    selection: Selection,
    qm_calc: Box<dyn Calculator>,
    mm_calc: Box<dyn Calculator>,
    interaction: Box<dyn Interaction>,
    vacuum: Option<f64>,
    embedding: Option<Embedding>,
    reporter: Reporter,
    name: String,
    state: Option<Partitioned>,
}

impl ExplicitInteractionQmmm {
    /// Uses the default [`Embedding`] of three-atom MM molecules.
    pub fn new(
        selection: impl Into<Selection>,
        qm_calc: Box<dyn Calculator>,
        mm_calc: Box<dyn Calculator>,
        interaction: Box<dyn Interaction>,
    ) -> Self {
        let name = format!(
            "{}+{}+{}",
            qm_calc.name(),
            interaction.name(),
            mm_calc.name()
        );
        Self {
            selection: selection.into(),
            qm_calc,
            mm_calc,
            interaction,
            vacuum: None,
            embedding: Some(Embedding::default()),
            reporter: Reporter::new(),
            name,
            state: None,
        }
    }

    pub fn with_vacuum(mut self, vacuum: f64) -> Self {
        self.vacuum = Some(vacuum);
        self
    }

    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Mechanical embedding only: no point charges are passed to the QM calculator.
    pub fn without_embedding(mut self) -> Self {
        self.embedding = None;
        self
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn embedding(&self) -> Option<&Embedding> {
        self.embedding.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn evaluate(&mut self, system: &AtomicSystem) -> Result<QmmmResult, QmmmError> {
        let mut state = match self.state.take() {
            Some(state) => state,
            None => self.initialize(system)?,
        };
        let result = self.step(&mut state, system);
        self.state = Some(state);
        result
    }

    fn initialize(&mut self, system: &AtomicSystem) -> Result<Partitioned, QmmmError> {
        let region = QmRegion::build(system, &self.selection, self.vacuum)?;
        let mm = region.mm_system(system)?;

        if let Some(embedding) = self.embedding.as_mut() {
            embedding.initialize(&mm, self.qm_calc.as_mut(), self.mm_calc.as_mut())?;
        }

        info!(
            qm_atoms = region.system.len(),
            mm_atoms = mm.len(),
            "Initialized explicit-interaction QM/MM calculator '{}'.",
            self.name
        );
        self.reporter.report(Report::Partitioned {
            qm_atoms: region.system.len(),
            mm_atoms: mm.len(),
            qm_cell: region.qm_cell(),
        });
        let description = match &self.embedding {
            Some(embedding) => embedding.to_string(),
            None => "None".to_string(),
        };
        self.reporter.report(Report::Embedding(description));

        Ok(Partitioned { region, mm })
    }

    fn step(
        &mut self,
        state: &mut Partitioned,
        system: &AtomicSystem,
    ) -> Result<QmmmResult, QmmmError> {
        let mm_positions = system.gather_positions(state.region.partition.mm_indices())?;
        let shift = state.region.sync(system)?;
        state.mm.set_positions(&mm_positions)?;
        let (qm, mm) = (&state.region.system, &state.mm);

        if let Some(embedding) = self.embedding.as_mut() {
            embedding.update(qm, mm, self.mm_calc.as_mut(), &shift)?;
        }

        let interaction = self.interaction.calculate(qm, mm, &shift)?;
        interaction.check_force_counts(qm.len(), mm.len())?;
        let qm_eval = evaluate_checked(self.qm_calc.as_mut(), qm, qm.len())?;
        let mm_eval = evaluate_checked(self.mm_calc.as_mut(), mm, mm.len())?;

        let mut mm_forces = mm_eval.forces;
        if let Some(embedding) = self.embedding.as_mut() {
            let back_reaction = embedding.mm_forces(self.mm_calc.as_mut())?;
            if back_reaction.len() != mm.len() {
                return Err(CalculatorError::ForceCount {
                    name: self.mm_calc.name().to_string(),
                    expected: mm.len(),
                    found: back_reaction.len(),
                }
                .into());
            }
            for (f, b) in mm_forces.iter_mut().zip(&back_reaction) {
                *f += b;
            }
        }

        let mut forces = vec![Vector3::zeros(); system.len()];
        let partition = &state.region.partition;
        for ((&index, f), fi) in partition
            .qm_indices()
            .iter()
            .zip(&qm_eval.forces)
            .zip(&interaction.qm_forces)
        {
            forces[index] = f + fi;
        }
        for ((&index, f), fi) in partition
            .mm_indices()
            .iter()
            .zip(&mm_forces)
            .zip(&interaction.mm_forces)
        {
            forces[index] = f + fi;
        }

        let breakdown = EnergyBreakdown::Explicit {
            interaction: interaction.energy,
            qm: qm_eval.energy,
            mm: mm_eval.energy,
        };
        debug!("{breakdown}");
        self.reporter.report(Report::Energies(breakdown));

        Ok(QmmmResult {
            energy: breakdown.total(),
            forces,
            breakdown,
        })
    }
}

impl Calculator for ExplicitInteractionQmmm {
    fn name(&self) -> &str {
        &self.name
    }

    fn calculate(&mut self, system: &AtomicSystem) -> Result<Evaluation, CalculatorError> {
        let result = self
            .evaluate(system)
            .map_err(|e| CalculatorError::Backend(Box::new(e)))?;
        Ok(Evaluation::new(result.energy, result.forces))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::interactions::InteractionResult;
    use crate::core::forcefield::interactions::lj::LjInteractions;
    use crate::core::forcefield::interactions::InteractionError;
    use crate::engine::test_utils::{ChargedMm, EmbeddingQm, MockCalculator, water_box};
    use nalgebra::Point3;
    use std::sync::{Arc, Mutex};

    const TOLERANCE: f64 = 1e-10;

    /// Fixed interaction energy with a distinct force on every atom of each region.
    struct FixedInteraction;

    impl Interaction for FixedInteraction {
        fn name(&self) -> &str {
            "fixed"
        }

        fn calculate(
            &self,
            qm: &AtomicSystem,
            mm: &AtomicSystem,
            _shift: &Vector3<f64>,
        ) -> Result<InteractionResult, InteractionError> {
            Ok(InteractionResult {
                energy: -0.25,
                qm_forces: vec![Vector3::new(0.1, 0.0, 0.0); qm.len()],
                mm_forces: vec![Vector3::new(0.0, 0.2, 0.0); mm.len()],
            })
        }
    }

    fn embedded_scheme() -> (ExplicitInteractionQmmm, crate::engine::test_utils::Seen) {
        let qm = EmbeddingQm::new(
            MockCalculator::uniform("qm", 1.5, Vector3::new(1.0, 0.0, 0.0)),
            Vector3::new(0.0, 0.0, 1.0),
        );
        let mm_inner = MockCalculator::uniform("mm", 3.0, Vector3::new(0.0, 0.0, -1.0));
        let seen_mm = mm_inner.seen();
        let qmmm = ExplicitInteractionQmmm::new(
            0..3,
            Box::new(qm),
            Box::new(ChargedMm::new(mm_inner)),
            Box::new(FixedInteraction),
        );
        (qmmm, seen_mm)
    }

    #[test]
    fn energy_is_the_plain_sum_of_three_terms() {
        let (mut qmmm, _) = embedded_scheme();
        let result = qmmm.evaluate(&water_box(2)).unwrap();
        assert!((result.energy - (-0.25 + 1.5 + 3.0)).abs() < 1e-12);
        assert_eq!(
            result.breakdown,
            EnergyBreakdown::Explicit {
                interaction: -0.25,
                qm: 1.5,
                mm: 3.0
            }
        );
    }

    #[test]
    fn forces_are_assembled_per_region_with_embedding_back_reaction() {
        let (mut qmmm, _) = embedded_scheme();
        let system = water_box(1);
        let forces = qmmm.evaluate(&system).unwrap().forces;

        for f in &forces[0..3] {
            assert!((f - Vector3::new(1.1, 0.0, 0.0)).norm() < TOLERANCE);
        }
        // Own force, interaction force, and the doubled site force q * z.
        let charges = system.charges();
        for (i, f) in forces.iter().enumerate().skip(3) {
            let expected = Vector3::new(0.0, 0.2, -1.0 + 2.0 * charges[i]);
            assert!((f - expected).norm() < TOLERANCE);
        }
    }

    #[test]
    fn without_embedding_runs_plain_calculators() {
        let mut qmmm = ExplicitInteractionQmmm::new(
            vec![0, 1, 2],
            Box::new(MockCalculator::uniform("qm", 1.0, Vector3::zeros())),
            Box::new(MockCalculator::uniform("mm", 2.0, Vector3::new(0.0, 0.0, -1.0))),
            Box::new(FixedInteraction),
        )
        .without_embedding();
        assert!(qmmm.embedding().is_none());

        let result = qmmm.evaluate(&water_box(1)).unwrap();

        assert!((result.energy - 2.75).abs() < 1e-12);
        assert!((result.forces[4] - Vector3::new(0.0, 0.2, -1.0)).norm() < TOLERANCE);
    }

    #[test]
    fn default_embedding_needs_capable_calculators() {
        let mut qmmm = ExplicitInteractionQmmm::new(
            0..3,
            Box::new(MockCalculator::constant("qm", 0.0)),
            Box::new(MockCalculator::constant("mm", 0.0)),
            Box::new(FixedInteraction),
        );
        assert!(matches!(
            qmmm.evaluate(&water_box(1)),
            Err(QmmmError::MissingCapability { .. })
        ));
        assert!(!qmmm.is_initialized());
    }

    #[test]
    fn custom_embedding_molecule_size_is_validated_against_mm_region() {
        let (qmmm, _) = embedded_scheme();
        let mut qmmm = qmmm.with_embedding(Embedding::new(2));
        assert_eq!(qmmm.embedding().map(Embedding::molecule_size), Some(2));

        assert!(matches!(
            qmmm.evaluate(&water_box(1)),
            Err(QmmmError::Configuration(msg)) if msg.contains("embedding molecule size 2")
        ));
    }

    /// Returns no QM forces at all.
    struct TruncatedInteraction;

    impl Interaction for TruncatedInteraction {
        fn name(&self) -> &str {
            "truncated"
        }

        fn calculate(
            &self,
            _qm: &AtomicSystem,
            mm: &AtomicSystem,
            _shift: &Vector3<f64>,
        ) -> Result<InteractionResult, InteractionError> {
            Ok(InteractionResult {
                energy: 0.0,
                qm_forces: Vec::new(),
                mm_forces: vec![Vector3::zeros(); mm.len()],
            })
        }
    }

    #[test]
    fn interaction_with_wrong_force_count_is_rejected() {
        let mut qmmm = ExplicitInteractionQmmm::new(
            0..3,
            Box::new(MockCalculator::uniform("qm", 0.0, Vector3::new(1.0, 0.0, 0.0))),
            Box::new(MockCalculator::constant("mm", 0.0)),
            Box::new(TruncatedInteraction),
        )
        .without_embedding();

        assert!(matches!(
            qmmm.evaluate(&water_box(1)),
            Err(QmmmError::Interaction {
                source: InteractionError::ForceCount {
                    region: "QM",
                    expected: 3,
                    found: 0
                }
            })
        ));
    }

    #[test]
    fn name_joins_qm_interaction_and_mm() {
        let (qmmm, _) = embedded_scheme();
        assert_eq!(qmmm.name(), "qm+fixed+mm");
    }

    #[test]
    fn mm_calculator_sees_current_mm_positions() {
        let (mut qmmm, seen_mm) = embedded_scheme();
        let mut system = water_box(1);
        qmmm.evaluate(&system).unwrap();

        let moved: Vec<Point3<f64>> = system
            .positions()
            .iter()
            .map(|p| p + Vector3::new(0.5, 0.0, 0.0))
            .collect();
        system.set_positions(&moved).unwrap();
        qmmm.evaluate(&system).unwrap();

        assert_eq!(seen_mm.borrow().len(), 2);
        assert_eq!(seen_mm.borrow()[1], system.positions()[3..]);
    }

    #[test]
    fn vacuum_keeps_qm_centroid_fixed_and_reports_setup() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let qm_inner = MockCalculator::constant("qm", 0.0);
        let seen_qm = qm_inner.seen();
        let mut qmmm = ExplicitInteractionQmmm::new(
            0..3,
            Box::new(EmbeddingQm::new(qm_inner, Vector3::zeros())),
            Box::new(ChargedMm::new(MockCalculator::constant("mm", 0.0))),
            Box::new(FixedInteraction),
        )
        .with_vacuum(5.0)
        .with_reporter(Reporter::with_callback(Box::new(move |r: &Report| {
            sink.lock().unwrap().push(r.to_string());
        })));

        let mut system = water_box(2);
        for step in 0..3 {
            let moved: Vec<Point3<f64>> = system
                .positions()
                .iter()
                .map(|p| p + Vector3::new(0.7 * step as f64, -0.3, 1.1))
                .collect();
            system.set_positions(&moved).unwrap();
            qmmm.evaluate(&system).unwrap();
        }

        let seen = seen_qm.borrow();
        let reference = crate::core::utils::geometry::centroid(&seen[0]).unwrap();
        for positions in seen.iter() {
            let c = crate::core::utils::geometry::centroid(positions).unwrap();
            assert!((c - reference).norm() < TOLERANCE);
        }

        let events = events.lock().unwrap();
        assert!(events[0].contains("size of QM-cell after centering"));
        assert_eq!(events[1], "Embedding: Embedding(molecule_size=3)");
        assert!(events[2].starts_with("Energies: "));
        assert_eq!(events.len(), 2 + 3);
    }

    #[test]
    fn lennard_jones_pair_end_to_end() {
        let system = AtomicSystem::new(
            vec![18, 18],
            vec![Point3::origin(), Point3::new(2.0, 0.0, 0.0)],
        )
        .unwrap();
        let lj = LjInteractions::from_symbols([(("Ar", "Ar"), (1.0, 1.0))]).unwrap();
        let mut qmmm = ExplicitInteractionQmmm::new(
            vec![0],
            Box::new(MockCalculator::constant("qm", 0.0)),
            Box::new(MockCalculator::constant("mm", 0.0)),
            Box::new(lj),
        )
        .without_embedding();

        let result = qmmm.evaluate(&system).unwrap();

        assert!((result.energy - (-0.0615234375)).abs() < 1e-12);
        assert!(result.forces[0].x > 0.0);
        assert!((result.forces[0] + result.forces[1]).norm() < 1e-12);
    }

    #[test]
    fn interaction_errors_abort_the_evaluation() {
        let system = AtomicSystem::new(
            vec![18, 18],
            vec![Point3::new(1.0, 1.0, 1.0), Point3::new(1.0, 1.0, 1.0)],
        )
        .unwrap();
        let lj = LjInteractions::from_symbols([(("Ar", "Ar"), (1.0, 1.0))]).unwrap();
        let mut qmmm = ExplicitInteractionQmmm::new(
            vec![1],
            Box::new(MockCalculator::constant("qm", 0.0)),
            Box::new(MockCalculator::constant("mm", 0.0)),
            Box::new(lj),
        )
        .without_embedding();

        assert!(matches!(
            qmmm.evaluate(&system),
            Err(QmmmError::Interaction {
                source: InteractionError::ZeroDistance {
                    qm_index: 0,
                    mm_index: 0
                }
            })
        ));
    }
}
