use super::integrator::affine_velocity;
use crate::core::lattice::geometry::LatticeGeometry;
use crate::core::lattice::network::Network;
use crate::core::lattice::shear::{STRAIN_EPSILON, ShearState};

/// Mean squared deviation of the nodes from their affine positions, per unit strain squared.
///
/// `Σ |r - r_affine|² / (N² γ²)`. An unstrained cell has no affine reference to deviate from
/// and yields exactly `0`.
pub fn nonaffinity(network: &Network, shear: &ShearState) -> f64 {
    if shear.affine_offset().abs() < STRAIN_EPSILON {
        return 0.0;
    }
    let geometry = network.geometry();
    let mut total = 0.0;
    for row in 0..geometry.size() {
        for col in 0..geometry.size() {
            let deviation = network.position(row, col) - geometry.affine_position(row, col, shear);
            total += deviation.norm_squared();
        }
    }
    let strain = shear.strain(geometry);
    total / (geometry.node_count() as f64 * strain * strain)
}

/// Squared deviation of the last step's node velocities from the affine flow field.
///
/// `displacements` holds the per-node displacement of one step of length `dt`. The sum is
/// left unnormalized.
pub fn velocity_nonaffinity(
    displacements: &[f64],
    geometry: &LatticeGeometry,
    strain_rate: f64,
    dt: f64,
) -> f64 {
    debug_assert_eq!(displacements.len(), geometry.dof());
    displacements
        .chunks_exact(2)
        .enumerate()
        .map(|(node, d)| {
            let (row, _) = geometry.coords(node);
            let vx = d[0] / dt - affine_velocity(geometry, strain_rate, row);
            let vy = d[1] / dt;
            vx * vx + vy * vy
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lattice::disorder::BondStiffness;

    fn sheared_network(size: usize, strain: f64) -> (Network, ShearState) {
        let geometry = LatticeGeometry::new(size, 1.0);
        let shear = ShearState::from_strain(strain, &geometry);
        let network =
            Network::affinely_sheared(geometry, BondStiffness::uniform(&geometry, 1.0), &shear);
        (network, shear)
    }

    #[test]
    fn affine_configuration_has_zero_nonaffinity() {
        let (network, shear) = sheared_network(6, 0.05);
        assert!(nonaffinity(&network, &shear) < 1e-20);
    }

    #[test]
    fn unstrained_cell_reports_exactly_zero() {
        let (mut network, shear) = sheared_network(4, 0.0);
        network.positions_mut()[3] += 0.2;
        assert_eq!(nonaffinity(&network, &shear), 0.0);
    }

    #[test]
    fn single_node_deviation_is_normalized_by_strain() {
        let (mut network, shear) = sheared_network(4, 0.1);
        let geometry = *network.geometry();
        let node = geometry.index(2, 3);
        network.positions_mut()[2 * node] += 0.03;
        network.positions_mut()[2 * node + 1] -= 0.04;
        let expected = 0.0025 / (16.0 * 0.01);
        assert!((nonaffinity(&network, &shear) - expected).abs() < 1e-12);
    }

    #[test]
    fn affine_displacements_have_zero_velocity_nonaffinity() {
        let geometry = LatticeGeometry::new(5, 1.0);
        let (rate, dt) = (0.4, 0.01);
        let mut displacements = vec![0.0; geometry.dof()];
        for node in 0..geometry.node_count() {
            let (row, _) = geometry.coords(node);
            displacements[2 * node] = affine_velocity(&geometry, rate, row) * dt;
        }
        assert!(velocity_nonaffinity(&displacements, &geometry, rate, dt) < 1e-24);
    }

    #[test]
    fn velocity_nonaffinity_sums_squared_excess_velocity() {
        let geometry = LatticeGeometry::new(3, 1.0);
        let mut displacements = vec![0.0; geometry.dof()];
        displacements[0] = 0.02;
        displacements[7] = 0.01;
        let value = velocity_nonaffinity(&displacements, &geometry, 0.0, 0.1);
        assert!((value - (0.04 + 0.01)).abs() < 1e-15);
    }
}
