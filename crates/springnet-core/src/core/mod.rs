//! # Core Module
//!
//! Stateless building blocks of the network mechanics engine.
//!
//! - **Lattice** ([`lattice`]) - Triangular lattice geometry, periodic neighbour lookup with
//!   strain-dependent image shifts, bond disorder, and the `Network` state
//! - **Mechanics** ([`mechanics`]) - Hookean bond forces, shear stress, elastic energy and
//!   its analytic gradient
//! - **Output** ([`io`]) - CSV writers for positions, stress, energy and non-affinity

pub mod io;
pub mod lattice;
pub mod mechanics;
