//! # springnet Core Library
//!
//! A mechanics engine for two-dimensional, disordered triangular networks of Hookean
//! springs driven by oscillatory or quasi-static shear, with optional force-dipole
//! motors and thermal fluctuations.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Lattice geometry and periodic (Lees–Edwards) indexing,
//!   the disorder generator, the `Network` state, the force/stress engine, the elastic
//!   energy functional, and CSV output.
//!
//! - **[`engine`]: The Logic Core.** Stateful numerical machinery: the motor Markov
//!   process, the overdamped integrator, the conjugate-gradient minimizer, the
//!   non-affinity metric, configuration, errors and progress reporting.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built on the layers below:
//!   a driven oscillation run and a static energy-minimization run.

pub mod core;
pub mod engine;
pub mod workflows;
