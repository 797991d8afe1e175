use super::error::QmmmError;
use super::report::{Report, Reporter};
use super::state::{QmRegion, QmmmResult};
use crate::core::calculator::{Calculator, CalculatorError, Evaluation};
use crate::core::forcefield::term::EnergyBreakdown;
use crate::core::models::selection::Selection;
use crate::core::models::system::AtomicSystem;
use crate::core::utils::geometry;
use tracing::{debug, info};

/// Subtractive QM/MM coupling.
///
/// ```text
/// E = E_QM(R_qm) - E_MM(R_qm) + E_MM(R_all)
/// ```
///
/// The region calculator evaluates the QM atoms alone so that its contribution cancels the
/// classical description of the QM region inside the full-system term.
pub struct SubtractiveQmmm {
    selection: Selection,
    qm_calc: Box<dyn Calculator>,
    mm_region_calc: Box<dyn Calculator>,
    mm_full_calc: Box<dyn Calculator>,
    vacuum: Option<f64>,
    reporter: Reporter,
    name: String,
    region: Option<QmRegion>,
}

impl SubtractiveQmmm {
    /// `mm_region_calc` is applied to the QM atoms, `mm_full_calc` to the whole system.
    pub fn new(
        selection: impl Into<Selection>,
        qm_calc: Box<dyn Calculator>,
        mm_region_calc: Box<dyn Calculator>,
        mm_full_calc: Box<dyn Calculator>,
    ) -> Self {
        let name = format!(
            "{}-{}+{}",
            qm_calc.name(),
            mm_region_calc.name(),
            mm_full_calc.name()
        );
        Self {
            selection: selection.into(),
            qm_calc,
            mm_region_calc,
            mm_full_calc,
            vacuum: None,
            reporter: Reporter::new(),
            name,
            region: None,
        }
    }

    /// Places the QM atoms in their own box with `vacuum` of padding on every side.
    pub fn with_vacuum(mut self, vacuum: f64) -> Self {
        self.vacuum = Some(vacuum);
        self
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.region.is_some()
    }

    pub fn evaluate(&mut self, system: &AtomicSystem) -> Result<QmmmResult, QmmmError> {
        let mut region = match self.region.take() {
            Some(region) => region,
            None => self.initialize(system)?,
        };
        let result = self.step(&mut region, system);
        self.region = Some(region);
        result
    }

    fn initialize(&self, system: &AtomicSystem) -> Result<QmRegion, QmmmError> {
        let region = QmRegion::build(system, &self.selection, self.vacuum)?;
        info!(
            qm_atoms = region.partition.qm_indices().len(),
            mm_atoms = region.partition.mm_indices().len(),
            "Initialized subtractive QM/MM calculator '{}'.",
            self.name
        );
        self.reporter.report(Report::Partitioned {
            qm_atoms: region.partition.qm_indices().len(),
            mm_atoms: region.partition.mm_indices().len(),
            qm_cell: region.qm_cell(),
        });
        Ok(region)
    }

    fn step(
        &mut self,
        region: &mut QmRegion,
        system: &AtomicSystem,
    ) -> Result<QmmmResult, QmmmError> {
        region.sync(system)?;
        let n_qm = region.system.len();

        let qm = evaluate_checked(self.qm_calc.as_mut(), &region.system, n_qm)?;
        let full = evaluate_checked(self.mm_full_calc.as_mut(), system, system.len())?;

        let mut qm_forces = qm.forces;
        if region.center.is_some() {
            geometry::remove_mean(&mut qm_forces);
        }

        let mm_region = evaluate_checked(self.mm_region_calc.as_mut(), &region.system, n_qm)?;

        let mut forces = full.forces;
        for ((&index, f_qm), f_mm) in region
            .partition
            .qm_indices()
            .iter()
            .zip(&qm_forces)
            .zip(&mm_region.forces)
        {
            forces[index] += f_qm - f_mm;
        }

        let breakdown = EnergyBreakdown::Subtractive {
            qm: qm.energy,
            mm_region: mm_region.energy,
            mm_full: full.energy,
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

pub(crate) fn evaluate_checked(
    calc: &mut dyn Calculator,
    system: &AtomicSystem,
    n_atoms: usize,
) -> Result<Evaluation, CalculatorError> {
    calc.calculate(system)?.checked(calc.name(), n_atoms)
}

impl Calculator for SubtractiveQmmm {
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
