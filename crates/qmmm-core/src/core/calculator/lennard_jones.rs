use super::{Calculator, CalculatorError, Evaluation};
use crate::core::forcefield::potentials;
use crate::core::models::system::AtomicSystem;

const DEFAULT_CUTOFF_IN_SIGMA: f64 = 3.0;

/// Single-species Lennard-Jones pair potential over all atoms of a system.
///
/// The energy is shifted so that a pair contributes zero at the cutoff; forces are the
/// plain 12-6 forces inside the cutoff and zero beyond it. Periodic axes use the minimum
/// image, so the cutoff should not exceed half the shortest periodic cell length.
#[derive(Debug, Clone, PartialEq)]
pub struct LennardJones {
    sigma: f64,
    epsilon: f64,
    cutoff: f64,
    energy_shift: f64,
}

impl LennardJones {
    /// Creates the potential with a cutoff of three σ.
    pub fn new(sigma: f64, epsilon: f64) -> Self {
        Self::with_cutoff(sigma, epsilon, DEFAULT_CUTOFF_IN_SIGMA * sigma)
    }

    /// An infinite `cutoff` gives the unshifted, untruncated potential.
    pub fn with_cutoff(sigma: f64, epsilon: f64, cutoff: f64) -> Self {
        let energy_shift = if cutoff.is_finite() {
            potentials::lennard_jones_12_6(cutoff * cutoff, sigma, epsilon).0
        } else {
            0.0
        };
        Self {
            sigma,
            epsilon,
            cutoff,
            energy_shift,
        }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }
}

impl Calculator for LennardJones {
    fn name(&self) -> &str {
        "lj"
    }

    fn calculate(&mut self, system: &AtomicSystem) -> Result<Evaluation, CalculatorError> {
        let periodic_box = system.periodic_box()?;
        let positions = system.positions();
        let cutoff2 = self.cutoff * self.cutoff;
        let mut result = Evaluation::zeros(system.len());

        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                let d = periodic_box.minimum_image(positions[j] - positions[i]);
                let d2 = d.norm_squared();
                if d2 >= cutoff2 {
                    continue;
                }
                if d2 <= 0.0 {
                    return Err(CalculatorError::Failed {
                        name: self.name().to_string(),
                        message: format!("atoms {i} and {j} are at zero separation"),
                    });
                }
                let (energy, force_scale) =
                    potentials::lennard_jones_12_6(d2, self.sigma, self.epsilon);
                let f = d * force_scale;
                result.energy += energy - self.energy_shift;
                result.forces[i] -= f;
                result.forces[j] += f;
            }
        }
        Ok(result)
    }
}
