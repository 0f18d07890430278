//! # Mechanics Module
//!
//! Hookean bond mechanics of the spring network.
//!
//! - [`potentials`] - Scalar Hookean energy and force-magnitude kernels
//! - [`forces`] - Per-bond force vectors, net nodal forces and the shear stress
//! - [`energy`] - The total elastic energy as a function of a flat coordinate buffer,
//!   together with its analytic gradient

pub mod energy;
pub mod forces;
pub mod potentials;
