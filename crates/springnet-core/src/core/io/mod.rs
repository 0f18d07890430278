//! # Output Module
//!
//! CSV printers for simulation results.
//!
//! - [`records`] - Serializable rows for stress, energy and non-affinity series
//! - [`printers`] - Writers for position snapshots and the time series
//!
//! Printers are generic over [`std::io::Write`]; the caller decides whether a file is
//! truncated or appended to.

pub mod printers;
pub mod records;

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
