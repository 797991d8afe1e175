use crate::core::forcefield::term::EnergyBreakdown;
use nalgebra::Vector3;
use std::fmt;

/// Events emitted by the QM/MM calculators while they run.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// The system was split into QM and MM regions. `qm_cell` is set when the QM region was
    /// moved into its own vacuum box.
    Partitioned {
        qm_atoms: usize,
        mm_atoms: usize,
        qm_cell: Option<Vector3<f64>>,
    },
    /// Description of the embedding bound at initialization.
    Embedding(String),
    /// Per-term energies of one evaluation.
    Energies(EnergyBreakdown),
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Partitioned {
                qm_atoms,
                mm_atoms,
                qm_cell,
            } => {
                write!(f, "Partitioned {qm_atoms} QM and {mm_atoms} MM atoms")?;
                if let Some(cell) = qm_cell {
                    write!(
                        f,
                        "; size of QM-cell after centering: [{:.3} {:.3} {:.3}]",
                        cell.x, cell.y, cell.z
                    )?;
                }
                Ok(())
            }
            Report::Embedding(description) => write!(f, "Embedding: {description}"),
            Report::Energies(breakdown) => write!(f, "{breakdown}"),
        }
    }
}

pub type ReportCallback = Box<dyn Fn(&Report) + Send + Sync>;

#[derive(Default)]
pub struct Reporter {
    callback: Option<ReportCallback>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ReportCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Report) {
        if let Some(cb) = &self.callback {
            cb(&event);
        }
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
