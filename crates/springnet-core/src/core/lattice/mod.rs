//! # Lattice Module
//!
//! Discretized state of the spring network.
//!
//! The network is an `N × N` triangular lattice stored row-major as a flat buffer of
//! interleaved `(x, y)` coordinates. Every node owns three forward bonds (East, North,
//! NorthWest); the three backward bonds (West, South, SouthEast) are the forward bonds of
//! neighbouring nodes. Boundaries are periodic in both directions, and the top/bottom wrap
//! carries a horizontal offset proportional to the current shear (a Lees–Edwards boundary).
//!
//! - [`geometry`] - Indexing, neighbour lookup, boundary flags and periodic image shifts
//! - [`shear`] - The accumulated affine boundary displacement and its strain conversion
//! - [`disorder`] - Random bond presence drawn from a bond probability
//! - [`network`] - Node positions together with the immutable stiffness field

pub mod disorder;
pub mod geometry;
pub mod network;
pub mod shear;
