use crate::core::calculator::{
    Calculator, CalculatorError, ChargeModel, EmbeddingParameters, Evaluation,
    PointChargeEmbedder, PointChargePotential,
};
use crate::core::models::system::AtomicSystem;
use nalgebra::{Point3, Vector3};
use std::cell::RefCell;
use std::rc::Rc;

pub type Seen = Rc<RefCell<Vec<Vec<Point3<f64>>>>>;

type Respond = Box<dyn FnMut(&AtomicSystem) -> Result<Evaluation, CalculatorError>>;

/// Calculator driven by a closure that records every system it is asked to evaluate.
pub struct MockCalculator {
    name: &'static str,
    respond: Respond,
    seen: Seen,
}

impl MockCalculator {
    pub fn new(
        name: &'static str,
        respond: impl FnMut(&AtomicSystem) -> Result<Evaluation, CalculatorError> + 'static,
    ) -> Self {
        Self {
            name,
            respond: Box::new(respond),
            seen: Seen::default(),
        }
    }

    /// Constant energy, zero forces.
    pub fn constant(name: &'static str, energy: f64) -> Self {
        Self::new(name, move |system| {
            Ok(Evaluation::new(energy, vec![Vector3::zeros(); system.len()]))
        })
    }

    /// Constant energy, the same force on every atom.
    pub fn uniform(name: &'static str, energy: f64, force: Vector3<f64>) -> Self {
        Self::new(name, move |system| {
            Ok(Evaluation::new(energy, vec![force; system.len()]))
        })
    }

    pub fn failing(name: &'static str) -> Self {
        Self::new(name, move |_| {
            Err(CalculatorError::Failed {
                name: name.to_string(),
                message: "solver did not converge".to_string(),
            })
        })
    }

    pub fn seen(&self) -> Seen {
        Rc::clone(&self.seen)
    }
}

impl Calculator for MockCalculator {
    fn name(&self) -> &str {
        self.name
    }

    fn calculate(&mut self, system: &AtomicSystem) -> Result<Evaluation, CalculatorError> {
        self.seen.borrow_mut().push(system.positions().to_vec());
        (self.respond)(system)
    }
}

/// What the QM side has been told about the external charges.
#[derive(Debug, Default)]
pub struct Field {
    pub charges: Vec<f64>,
    pub parameters: EmbeddingParameters,
    pub positions: Vec<Point3<f64>>,
    pub centers: Option<Vec<Point3<f64>>>,
}

/// QM mock that accepts point charges. Each charge site feels `charge * force_per_charge`.
pub struct EmbeddingQm {
    inner: MockCalculator,
    field: Rc<RefCell<Field>>,
    force_per_charge: Vector3<f64>,
}

impl EmbeddingQm {
    pub fn new(inner: MockCalculator, force_per_charge: Vector3<f64>) -> Self {
        Self {
            inner,
            field: Rc::default(),
            force_per_charge,
        }
    }

    pub fn field(&self) -> Rc<RefCell<Field>> {
        Rc::clone(&self.field)
    }
}

impl Calculator for EmbeddingQm {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn calculate(&mut self, system: &AtomicSystem) -> Result<Evaluation, CalculatorError> {
        self.inner.calculate(system)
    }

    fn embedder(&mut self) -> Option<&mut dyn PointChargeEmbedder> {
        Some(self)
    }
}

impl PointChargeEmbedder for EmbeddingQm {
    fn embed(
        &mut self,
        charges: &[f64],
        parameters: &EmbeddingParameters,
    ) -> Result<Box<dyn PointChargePotential>, CalculatorError> {
        {
            let mut field = self.field.borrow_mut();
            field.charges = charges.to_vec();
            field.parameters = parameters.clone();
        }
        Ok(Box::new(MockPotential {
            field: Rc::clone(&self.field),
            force_per_charge: self.force_per_charge,
        }))
    }
}

struct MockPotential {
    field: Rc<RefCell<Field>>,
    force_per_charge: Vector3<f64>,
}

impl PointChargePotential for MockPotential {
    fn set_positions(
        &mut self,
        positions: &[Point3<f64>],
        molecule_centers: Option<&[Point3<f64>]>,
    ) -> Result<(), CalculatorError> {
        let mut field = self.field.borrow_mut();
        field.positions = positions.to_vec();
        field.centers = molecule_centers.map(<[_]>::to_vec);
        Ok(())
    }

    fn forces(&mut self) -> Result<Vec<Vector3<f64>>, CalculatorError> {
        let field = self.field.borrow();
        Ok(field
            .charges
            .iter()
            .take(field.positions.len())
            .map(|q| self.force_per_charge * *q)
            .collect())
    }
}

/// MM mock whose charges come from the system. Redistribution doubles the site forces so
/// tests can tell that it ran.
pub struct ChargedMm {
    inner: MockCalculator,
    extra_charges: usize,
}

impl ChargedMm {
    pub fn new(inner: MockCalculator) -> Self {
        Self {
            inner,
            extra_charges: 0,
        }
    }

    /// Appends `count` unit counter-charges after the atomic charges.
    pub fn with_extra_charges(mut self, count: usize) -> Self {
        self.extra_charges = count;
        self
    }
}

impl Calculator for ChargedMm {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn calculate(&mut self, system: &AtomicSystem) -> Result<Evaluation, CalculatorError> {
        self.inner.calculate(system)
    }

    fn charge_model(&mut self) -> Option<&mut dyn ChargeModel> {
        Some(self)
    }
}

impl ChargeModel for ChargedMm {
    fn virtual_charges(&mut self, system: &AtomicSystem) -> Result<Vec<f64>, CalculatorError> {
        let mut charges = system.charges().to_vec();
        charges.extend(std::iter::repeat_n(-1.0, self.extra_charges));
        Ok(charges)
    }

    fn redistribute_forces(
        &self,
        forces: Vec<Vector3<f64>>,
    ) -> Result<Vec<Vector3<f64>>, CalculatorError> {
        Ok(forces.into_iter().map(|f| f * 2.0).collect())
    }
}

/// One water molecule followed by `n_mm` more, spaced 4 Å apart along x.
pub fn water_box(n_mm: usize) -> AtomicSystem {
    let mut numbers = Vec::new();
    let mut positions = Vec::new();
    let mut charges = Vec::new();
    for m in 0..(1 + n_mm) {
        let origin = Vector3::new(1.0 + 4.0 * m as f64, 2.0, 2.0);
        numbers.extend([8, 1, 1]);
        positions.extend([
            Point3::from(origin),
            Point3::from(origin + Vector3::new(0.96, 0.0, 0.0)),
            Point3::from(origin + Vector3::new(-0.24, 0.93, 0.0)),
        ]);
        charges.extend([-0.834, 0.417, 0.417]);
    }
    AtomicSystem::new(numbers, positions)
        .and_then(|s| s.with_charges(charges))
        .unwrap()
}
