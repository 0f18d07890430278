use super::potentials::hooke_tension;
use crate::core::lattice::disorder::BROKEN_STIFFNESS;
use crate::core::lattice::geometry::{BondDirection, LatticeGeometry, Neighbor};
use crate::core::lattice::network::Network;
use crate::core::lattice::shear::ShearState;
use nalgebra::Vector2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Optional short-distance cutoff on bond forces.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ForceCutoff {
    #[default]
    Disabled,
    /// Bonds shorter than this distance contribute no force.
    MinDistance(f64),
}

impl ForceCutoff {
    #[inline]
    fn suppresses(&self, dist: f64) -> bool {
        match *self {
            ForceCutoff::Disabled => false,
            ForceCutoff::MinDistance(min) => dist < min,
        }
    }
}

/// Extra tension applied along individual bonds on top of the Hookean response.
pub trait ActiveForces: Sync {
    fn bond_force(&self, node: usize, direction: BondDirection) -> f64;
}

/// Force acting on the owning node of every forward bond, `[East, North, NorthWest]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BondForces {
    forces: Vec<[Vector2<f64>; 3]>,
}

impl BondForces {
    pub fn zeros(node_count: usize) -> Self {
        Self {
            forces: vec![[Vector2::zeros(); 3]; node_count],
        }
    }

    #[inline]
    pub fn get(&self, node: usize, direction: BondDirection) -> Vector2<f64> {
        self.forces[node][direction.slot()]
    }

    pub fn node_count(&self) -> usize {
        self.forces.len()
    }

    /// Total force on node `(row, col)`: its own three bonds minus the bonds it is the far
    /// end of.
    pub fn net_force(&self, geometry: &LatticeGeometry, row: usize, col: usize) -> Vector2<f64> {
        let own = &self.forces[geometry.index(row, col)];
        let mut total = own[0] + own[1] + own[2];
        for neighbor in [Neighbor::West, Neighbor::South, Neighbor::SouthEast] {
            let (owner, direction) = geometry.bond_owner(row, col, neighbor);
            total -= self.forces[owner][direction.slot()];
        }
        total
    }

    /// Net force on every node, flattened as interleaved `(x, y)` pairs.
    pub fn net_forces(&self, geometry: &LatticeGeometry) -> Vec<f64> {
        let mut net = vec![0.0; geometry.dof()];
        for (i, chunk) in net.chunks_exact_mut(2).enumerate() {
            let (row, col) = geometry.coords(i);
            let f = self.net_force(geometry, row, col);
            chunk[0] = f.x;
            chunk[1] = f.y;
        }
        net
    }
}

fn node_bond_forces(
    network: &Network,
    shear: &ShearState,
    motors: Option<&dyn ActiveForces>,
    cutoff: ForceCutoff,
    node: usize,
) -> [Vector2<f64>; 3] {
    let geometry = network.geometry();
    let (row, col) = geometry.coords(node);
    let flags = geometry.boundary(row, col);
    let rest_length = geometry.rest_length();

    BondDirection::ALL.map(|direction| {
        let stiffness = network.stiffness().get(node, direction);
        let delta = network.bond_vector(row, col, flags, direction.forward(), shear);
        let dist = delta.norm();
        if cutoff.suppresses(dist) {
            return Vector2::zeros();
        }
        let mut tension = if stiffness.abs() < BROKEN_STIFFNESS {
            0.0
        } else {
            hooke_tension(dist, stiffness, rest_length)
        };
        if let Some(motors) = motors {
            tension += motors.bond_force(node, direction);
        }
        let (sin, cos) = delta.y.atan2(delta.x).sin_cos();
        Vector2::new(tension * cos, tension * sin)
    })
}

/// Computes the force on the owning node of every bond from one snapshot of positions.
pub fn compute_bond_forces(
    network: &Network,
    shear: &ShearState,
    motors: Option<&dyn ActiveForces>,
    cutoff: ForceCutoff,
) -> BondForces {
    let node_count = network.geometry().node_count();

    #[cfg(not(feature = "parallel"))]
    let iterator = 0..node_count;

    #[cfg(feature = "parallel")]
    let iterator = (0..node_count).into_par_iter();

    let forces = iterator
        .map(|node| node_bond_forces(network, shear, motors, cutoff, node))
        .collect();

    BondForces { forces }
}

/// Shear stress of the cell, `Σ F_x Δy / A` over every bond, with `A` the cell area.
///
/// When `viscosity` is given, the solvent contribution `η γ̇` is added.
pub fn compute_stress(
    forces: &BondForces,
    network: &Network,
    shear: &ShearState,
    strain_rate: f64,
    viscosity: Option<f64>,
) -> f64 {
    let geometry = network.geometry();
    let mut virial = 0.0;
    for node in 0..geometry.node_count() {
        let (row, col) = geometry.coords(node);
        let flags = geometry.boundary(row, col);
        for direction in BondDirection::ALL {
            let delta = network.bond_vector(row, col, flags, direction.forward(), shear);
            virial += forces.get(node, direction).x * delta.y;
        }
    }
    let elastic = virial / geometry.cell_area();
    match viscosity {
        Some(eta) => elastic + eta * strain_rate,
        None => elastic,
    }
}
