//! # Engine Module
//!
//! Stateful numerical machinery that drives a [`Network`](crate::core::lattice::network::Network)
//! through time or down its energy landscape.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Validated run parameters and their builders
//! - **Scheduling** ([`schedule`], [`context`]) - Time step, frame cadence and the driving
//!   strain rate shared by one run
//! - **Motors** ([`motors`]) - Per-bond two-state Markov process of force-dipole motors
//! - **Integration** ([`integrator`]) - Overdamped Langevin stepping under affine flow
//! - **Minimization** ([`minimizer`]) - Polak–Ribière conjugate gradient with a
//!   derivative-based line search
//! - **Diagnostics** ([`nonaffinity`]) - Deviation of positions and velocities from the
//!   affine field
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Divergence, convergence and configuration failures

pub mod config;
pub mod context;
pub mod error;
pub mod integrator;
pub mod minimizer;
pub mod motors;
pub mod nonaffinity;
pub mod progress;
pub mod schedule;
