//! # Workflows Module
//!
//! Top-level entry points that run a complete simulation from a validated configuration.
//!
//! ## Architecture
//!
//! - **Oscillation Workflow** ([`oscillate`]) - Overdamped dynamics of a network under
//!   sinusoidal shear, optionally with motors and thermal noise, streaming frames to a sink
//! - **Minimization Workflow** ([`minimize`]) - Conjugate-gradient relaxation of a
//!   statically sheared network and the resulting shear moduli
//!
//! Both workflows draw all randomness from a single generator seeded from the
//! configuration, so a fixed seed reproduces a run exactly.

pub mod minimize;
pub mod oscillate;

use rand::SeedableRng;
use rand::rngs::StdRng;

pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
