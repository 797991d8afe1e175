//! # QM/MM Core Library
//!
//! Hybrid Quantum-Mechanics/Molecular-Mechanics energy and force evaluation. The library
//! composes independently computed quantum and classical results into a single energy/force
//! pair for a combined atomic system.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`AtomicSystem`, `Selection`,
//!   `PeriodicBox`), the calculator capability traits, Lennard-Jones potentials, parameter
//!   tables and the pairwise QM/MM interaction engines.
//!
//! - **[`engine`]: The Coupling Layer.** Stateful calculators that own the QM/MM partition:
//!   the subtractive scheme (`SubtractiveQmmm`), the explicit-interaction scheme
//!   (`ExplicitInteractionQmmm`) and the point-charge `Embedding`.
//!
//! - **[`workflows`]: The Public API.** Builds a complete calculator from an
//!   `EvaluationConfig` and runs a single-point evaluation.

pub mod core;
pub mod engine;
pub mod workflows;
