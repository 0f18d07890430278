use super::potentials::{hooke_energy, hooke_tension};
use crate::core::lattice::disorder::BondStiffness;
use crate::core::lattice::geometry::{BondDirection, LatticeGeometry, Neighbor};
use crate::core::lattice::network::Network;
use crate::core::lattice::shear::ShearState;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Total elastic energy of the network as a function of a flat coordinate buffer.
///
/// The stiffness field and the shear state are fixed; only the node positions vary. This is
/// the functional the conjugate-gradient minimizer descends.
#[derive(Debug, Clone, Copy)]
pub struct ElasticEnergy<'a> {
    geometry: &'a LatticeGeometry,
    stiffness: &'a BondStiffness,
    shear: ShearState,
}

impl<'a> ElasticEnergy<'a> {
    pub fn new(
        geometry: &'a LatticeGeometry,
        stiffness: &'a BondStiffness,
        shear: ShearState,
    ) -> Self {
        Self {
            geometry,
            stiffness,
            shear,
        }
    }

    pub fn for_network(network: &'a Network, shear: ShearState) -> Self {
        Self::new(network.geometry(), network.stiffness(), shear)
    }

    pub fn geometry(&self) -> &LatticeGeometry {
        self.geometry
    }

    pub fn shear(&self) -> ShearState {
        self.shear
    }

    fn node_energy(&self, positions: &[f64], node: usize) -> f64 {
        let (row, col) = self.geometry.coords(node);
        let flags = self.geometry.boundary(row, col);
        let rest_length = self.geometry.rest_length();
        BondDirection::ALL
            .iter()
            .map(|&direction| {
                let k = self.stiffness.get(node, direction);
                let delta = self.geometry.bond_vector(
                    positions,
                    row,
                    col,
                    flags,
                    direction.forward(),
                    &self.shear,
                );
                hooke_energy(delta.norm(), k, rest_length)
            })
            .sum()
    }

    /// `Σ k (|Δ| - L)² / (2 L)` over every bond.
    pub fn value(&self, positions: &[f64]) -> f64 {
        debug_assert_eq!(positions.len(), self.geometry.dof());
        let node_count = self.geometry.node_count();

        #[cfg(not(feature = "parallel"))]
        let iterator = 0..node_count;

        #[cfg(feature = "parallel")]
        let iterator = (0..node_count).into_par_iter();

        iterator.map(|node| self.node_energy(positions, node)).sum()
    }

    /// Writes `∂E/∂x` into `gradient`.
    ///
    /// Each node gathers the contributions of all six bonds it touches, so nodes can be
    /// processed independently.
    pub fn gradient(&self, positions: &[f64], gradient: &mut [f64]) {
        debug_assert_eq!(positions.len(), self.geometry.dof());
        debug_assert_eq!(gradient.len(), self.geometry.dof());
        let rest_length = self.geometry.rest_length();

        let fill = |(node, out): (usize, &mut [f64])| {
            let (row, col) = self.geometry.coords(node);
            let flags = self.geometry.boundary(row, col);
            let (mut gx, mut gy) = (0.0, 0.0);
            for neighbor in Neighbor::ALL {
                let (owner, direction) = self.geometry.bond_owner(row, col, neighbor);
                let k = self.stiffness.get(owner, direction);
                if k == 0.0 {
                    continue;
                }
                let delta =
                    self.geometry
                        .bond_vector(positions, row, col, flags, neighbor, &self.shear);
                let dist = delta.norm();
                if dist == 0.0 {
                    continue;
                }
                let scale = hooke_tension(dist, k, rest_length) / dist;
                gx -= scale * delta.x;
                gy -= scale * delta.y;
            }
            out[0] = gx;
            out[1] = gy;
        };

        #[cfg(not(feature = "parallel"))]
        gradient.chunks_exact_mut(2).enumerate().for_each(fill);

        #[cfg(feature = "parallel")]
        gradient.par_chunks_exact_mut(2).enumerate().for_each(fill);
    }
}

/// Elastic energy of a network in its current configuration.
pub fn elastic_energy(network: &Network, shear: &ShearState) -> f64 {
    ElasticEnergy::for_network(network, *shear).value(network.positions().as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mechanics::forces::{ForceCutoff, compute_bond_forces};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn perturbed_network(size: usize, probability: f64, seed: u64) -> (Network, ShearState) {
        let geometry = LatticeGeometry::new(size, 1.0);
        let mut rng = StdRng::seed_from_u64(seed);
        let stiffness = BondStiffness::generate(&geometry, probability, 1.0, &mut rng);
        let shear = ShearState::from_strain(0.03, &geometry);
        let mut network = Network::affinely_sheared(geometry, stiffness, &shear);
        for v in network.positions_mut().iter_mut() {
            *v += rng.gen_range(-0.05..0.05);
        }
        (network, shear)
    }

    #[test]
    fn rest_lattice_has_zero_energy() {
        let geometry = LatticeGeometry::new(8, 1.0);
        let network = Network::new(geometry, BondStiffness::uniform(&geometry, 1.0));
        assert!(elastic_energy(&network, &ShearState::unstrained()).abs() < 1e-20);
    }

    #[test]
    fn affine_energy_matches_per_bond_sum() {
        let geometry = LatticeGeometry::new(5, 1.0);
        let shear = ShearState::from_strain(0.1, &geometry);
        let network =
            Network::affinely_sheared(geometry, BondStiffness::uniform(&geometry, 1.0), &shear);

        let h = geometry.row_height();
        let dx = 0.1 * h;
        let north = ((0.5 + dx).powi(2) + h * h).sqrt();
        let north_west = ((-0.5 + dx).powi(2) + h * h).sqrt();
        let per_node = hooke_energy(north, 1.0, 1.0) + hooke_energy(north_west, 1.0, 1.0);
        let expected = 25.0 * per_node;

        assert!((elastic_energy(&network, &shear) - expected).abs() < 1e-12);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let (network, shear) = perturbed_network(4, 0.7, 5);
        let energy = ElasticEnergy::for_network(&network, shear);
        let x = network.positions().as_slice().to_vec();
        let mut analytic = vec![0.0; x.len()];
        energy.gradient(&x, &mut analytic);

        let h = 1e-6;
        for i in 0..x.len() {
            let mut plus = x.clone();
            let mut minus = x.clone();
            plus[i] += h;
            minus[i] -= h;
            let numeric = (energy.value(&plus) - energy.value(&minus)) / (2.0 * h);
            assert!(
                (numeric - analytic[i]).abs() < 1e-6,
                "component {i}: numeric {numeric}, analytic {}",
                analytic[i]
            );
        }
    }

    #[test]
    fn gradient_is_negated_net_force() {
        let (network, shear) = perturbed_network(5, 1.0, 9);
        let energy = ElasticEnergy::for_network(&network, shear);
        let mut gradient = vec![0.0; network.geometry().dof()];
        energy.gradient(network.positions().as_slice(), &mut gradient);

        let forces = compute_bond_forces(&network, &shear, None, ForceCutoff::Disabled);
        let net = forces.net_forces(network.geometry());
        for (g, f) in gradient.iter().zip(net.iter()) {
            assert!((g + f).abs() < 1e-12);
        }
    }

    #[test]
    fn gradient_sums_to_zero_over_the_cell() {
        let (network, shear) = perturbed_network(6, 0.8, 21);
        let energy = ElasticEnergy::for_network(&network, shear);
        let mut gradient = vec![0.0; network.geometry().dof()];
        energy.gradient(network.positions().as_slice(), &mut gradient);
        let sx: f64 = gradient.iter().step_by(2).sum();
        let sy: f64 = gradient.iter().skip(1).step_by(2).sum();
        assert!(sx.abs() < 1e-12 && sy.abs() < 1e-12);
    }
}
