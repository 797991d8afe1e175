use crate::core::calculator::lennard_jones::LennardJones;
use crate::core::forcefield::interactions::Interaction;
use crate::core::forcefield::interactions::lj::LjInteractions;
use crate::core::forcefield::interactions::lj_general::LjInteractionsGeneral;
use crate::core::models::system::AtomicSystem;
use crate::engine::config::{EvaluationConfig, InteractionConfig, LjCalculatorConfig, Scheme};
use crate::engine::error::QmmmError;
use crate::engine::explicit::ExplicitInteractionQmmm;
use crate::engine::report::Reporter;
use crate::engine::state::QmmmResult;
use crate::engine::subtractive::SubtractiveQmmm;
use tracing::{info, instrument};

/// Runs one QM/MM evaluation of `system` as described by `config`.
///
/// Both the QM and the MM role are filled by built-in Lennard-Jones calculators. The
/// explicit scheme runs with mechanical embedding only, since these calculators carry no
/// point-charge capability.
#[instrument(skip_all, name = "evaluation_workflow")]
pub fn run(
    system: &AtomicSystem,
    config: &EvaluationConfig,
    reporter: Reporter,
) -> Result<QmmmResult, QmmmError> {
    info!(
        "Starting {} QM/MM evaluation of {} atoms.",
        config.scheme,
        system.len()
    );

    let qm_calc = build_calculator(&config.qm_calculator);
    let mm_calc = build_calculator(&config.mm_calculator);

    let result = match config.scheme {
        Scheme::Subtractive => {
            let mut qmmm = SubtractiveQmmm::new(
                config.selection.clone(),
                Box::new(qm_calc),
                Box::new(mm_calc.clone()),
                Box::new(mm_calc),
            )
            .with_reporter(reporter);
            if let Some(vacuum) = config.vacuum {
                qmmm = qmmm.with_vacuum(vacuum);
            }
            qmmm.evaluate(system)?
        }
        Scheme::Explicit => {
            let interaction = config.interaction.as_ref().ok_or_else(|| {
                QmmmError::Configuration("explicit scheme requires an interaction".to_string())
            })?;
            let mut qmmm = ExplicitInteractionQmmm::new(
                config.selection.clone(),
                Box::new(qm_calc),
                Box::new(mm_calc),
                build_interaction(interaction)?,
            )
            .without_embedding()
            .with_reporter(reporter);
            if let Some(vacuum) = config.vacuum {
                qmmm = qmmm.with_vacuum(vacuum);
            }
            qmmm.evaluate(system)?
        }
    };

    info!("Evaluation complete. Total energy: {:.6}", result.energy);
    Ok(result)
}

fn build_calculator(config: &LjCalculatorConfig) -> LennardJones {
    match config.cutoff {
        Some(cutoff) => LennardJones::with_cutoff(config.sigma, config.epsilon, cutoff),
        None => LennardJones::new(config.sigma, config.epsilon),
    }
}

fn build_interaction(config: &InteractionConfig) -> Result<Box<dyn Interaction>, QmmmError> {
    match config {
        InteractionConfig::SpeciesTable(table) => {
            Ok(Box::new(LjInteractions::new(table.clone())))
        }
        InteractionConfig::General {
            qm,
            mm,
            qm_molecule_size,
            mm_molecule_size,
            cutoff,
            width,
        } => {
            let mut lj =
                LjInteractionsGeneral::new(qm, mm, *qm_molecule_size, *mm_molecule_size)?;
            if let Some(cutoff) = cutoff {
                lj = lj.with_cutoff(*cutoff, *width)?;
            }
            Ok(Box::new(lj))
        }
    }
}
