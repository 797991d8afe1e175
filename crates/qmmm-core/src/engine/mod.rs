//! # Engine Module
//!
//! Stateful QM/MM calculators that couple a quantum and a classical [`Calculator`].
//!
//! ## Overview
//!
//! Both schemes partition the full system on their first evaluation and keep the QM (and,
//! for the explicit scheme, MM) subsystem for their whole lifetime. Every later evaluation
//! only copies positions into those subsystems, delegates to the calculators, and combines
//! the results with the scheme's coupling formula.
//!
//! ## Architecture
//!
//! - **Subtractive Scheme** ([`subtractive`]) - `E_QM(qm) - E_MM(qm) + E_MM(all)`
//! - **Explicit Scheme** ([`explicit`]) - `E_QM(qm) + E_MM(mm) + E_I(qm, mm)` with an
//!   interaction engine and optional electrostatic embedding
//! - **Embedding** ([`embedding`]) - Point charges from the MM region inside the QM calculation
//! - **Configuration** ([`config`]) - Validated settings for the evaluation workflow
//! - **Reporting** ([`report`]) - Setup and per-step energy events
//! - **Error Handling** ([`error`]) - The combined error type of a QM/MM evaluation
//!
//! [`Calculator`]: crate::core::calculator::Calculator

pub mod config;
pub mod embedding;
pub mod error;
pub mod explicit;
pub mod report;
pub mod state;
pub mod subtractive;

#[cfg(test)]
pub(crate) mod test_utils;
