//! # Workflows Module
//!
//! High-level entry points that assemble a complete QM/MM calculator from an
//! [`EvaluationConfig`](crate::engine::config::EvaluationConfig) and run it.
//!
//! - **Evaluation Workflow** ([`evaluate`]) - Single-point energy and forces of a system with
//!   built-in Lennard-Jones calculators in the QM and MM roles.

pub mod evaluate;
