use serde::Serialize;

/// One row of the stress series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StressSample {
    pub stress: f64,
    pub strain: f64,
    pub time: f64,
}

/// One row of the energy log, appended once per minimized configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyRecord {
    pub energy: f64,
    pub probability: f64,
    pub strain: f64,
}

/// One row of the non-affinity series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NonaffinitySample {
    pub time: f64,
    pub affine_offset: f64,
    pub nonaffinity: f64,
    pub strain_rate: f64,
    pub velocity_nonaffinity: f64,
}

/// Metadata written at the top of a position snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotHeader {
    pub size: usize,
    pub strain: f64,
    pub modulus: f64,
    pub probability: f64,
}

/// One node of a position snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct NodeRecord {
    pub row: usize,
    pub col: usize,
    pub x: f64,
    pub y: f64,
    pub s0: f64,
    pub s1: f64,
    pub s2: f64,
}
