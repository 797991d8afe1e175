use std::fmt;

/// Energy terms of one coupled QM/MM evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnergyBreakdown {
    /// `E = E_QM(qm) - E_MM(qm) + E_MM(all)`.
    Subtractive {
        qm: f64,
        mm_region: f64,
        mm_full: f64,
    },
    /// `E = E_I(qm, mm) + E_QM(qm) + E_MM(mm)`.
    Explicit { interaction: f64, qm: f64, mm: f64 },
}

impl EnergyBreakdown {
    #[inline]
    pub fn total(&self) -> f64 {
        match *self {
            EnergyBreakdown::Subtractive {
                qm,
                mm_region,
                mm_full,
            } => qm - mm_region + mm_full,
            EnergyBreakdown::Explicit {
                interaction,
                qm,
                mm,
            } => interaction + qm + mm,
        }
    }
}

impl fmt::Display for EnergyBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            EnergyBreakdown::Subtractive {
                qm,
                mm_region,
                mm_full,
            } => write!(
                f,
                "Energies: {:12.3} {:+12.3} {:+12.3} = {:12.3}",
                qm,
                -mm_region,
                mm_full,
                self.total()
            ),
            EnergyBreakdown::Explicit {
                interaction,
                qm,
                mm,
            } => write!(
                f,
                "Energies: {:12.3} {:+12.3} {:+12.3} = {:12.3}",
                interaction,
                qm,
                mm,
                self.total()
            ),
        }
    }
}
