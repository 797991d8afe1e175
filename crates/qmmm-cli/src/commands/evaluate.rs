use crate::cli::EvaluateArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use crate::structure;
use qmmm::core::models::elements;
use qmmm::core::models::system::AtomicSystem;
use qmmm::engine::report::{Report, Reporter};
use qmmm::engine::state::QmmmResult;
use qmmm::workflows;
use std::fmt::Write;
use tracing::{debug, info};

pub fn run(args: EvaluateArgs) -> Result<()> {
    let partial_config = PartialRunConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let final_config = partial_config.merge_with_cli(&args)?;
    debug!("Final configuration: {:?}", &final_config);

    info!("Loading input structure from {:?}", &args.structure);
    let system = structure::load_structure(&args.structure)?;

    let reporter = Reporter::with_callback(Box::new(|report: &Report| match report {
        Report::Energies(_) => debug!("{}", report),
        _ => info!("{}", report),
    }));

    println!("Starting {} QM/MM evaluation...", final_config.scheme);
    let result = workflows::evaluate::run(&system, &final_config, reporter)?;

    print!("{}", format_result(&system, &result));
    Ok(())
}

fn format_result(system: &AtomicSystem, result: &QmmmResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", result.breakdown);
    let _ = writeln!(out, "Total energy: {:.6}", result.energy);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:>5} {:<3} {:>14} {:>14} {:>14}",
        "Atom", "El", "Fx", "Fy", "Fz"
    );
    for (index, (number, force)) in system.numbers().iter().zip(&result.forces).enumerate() {
        let _ = writeln!(
            out,
            "{:>5} {:<3} {:>14.6} {:>14.6} {:>14.6}",
            index,
            elements::symbol(*number).unwrap_or("?"),
            force.x,
            force.y,
            force.z
        );
    }
    out
}
