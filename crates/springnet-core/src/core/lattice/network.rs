use super::disorder::BondStiffness;
use super::geometry::{BoundaryFlags, LatticeGeometry, Neighbor};
use super::shear::ShearState;
use nalgebra::{DVector, Vector2};

/// Node positions of the lattice together with its stiffness field.
///
/// Positions are stored as a flat buffer of interleaved `(x, y)` pairs, row-major, so the
/// buffer can be handed to the minimizer as a single vector.
#[derive(Debug, Clone)]
pub struct Network {
    geometry: LatticeGeometry,
    stiffness: BondStiffness,
    positions: DVector<f64>,
}

impl Network {
    /// Builds a network with every node at its rest position.
    pub fn new(geometry: LatticeGeometry, stiffness: BondStiffness) -> Self {
        Self::affinely_sheared(geometry, stiffness, &ShearState::unstrained())
    }

    /// Builds a network whose nodes sit at their affinely sheared positions.
    pub fn affinely_sheared(
        geometry: LatticeGeometry,
        stiffness: BondStiffness,
        shear: &ShearState,
    ) -> Self {
        debug_assert_eq!(stiffness.node_count(), geometry.node_count());
        let mut positions = DVector::zeros(geometry.dof());
        for row in 0..geometry.size() {
            for col in 0..geometry.size() {
                let i = geometry.index(row, col);
                let p = geometry.affine_position(row, col, shear);
                positions[2 * i] = p.x;
                positions[2 * i + 1] = p.y;
            }
        }
        Self {
            geometry,
            stiffness,
            positions,
        }
    }

    /// Wraps an existing coordinate buffer. Returns `None` when its length is not `2 N²`.
    pub fn with_positions(
        geometry: LatticeGeometry,
        stiffness: BondStiffness,
        positions: DVector<f64>,
    ) -> Option<Self> {
        (positions.len() == geometry.dof()).then_some(Self {
            geometry,
            stiffness,
            positions,
        })
    }

    #[inline]
    pub fn geometry(&self) -> &LatticeGeometry {
        &self.geometry
    }

    #[inline]
    pub fn stiffness(&self) -> &BondStiffness {
        &self.stiffness
    }

    #[inline]
    pub fn positions(&self) -> &DVector<f64> {
        &self.positions
    }

    #[inline]
    pub fn positions_mut(&mut self) -> &mut DVector<f64> {
        &mut self.positions
    }

    /// Replaces the coordinate buffer wholesale, e.g. with a minimizer's result.
    pub fn set_positions(&mut self, positions: DVector<f64>) {
        assert_eq!(
            positions.len(),
            self.geometry.dof(),
            "position buffer length must be 2 N²"
        );
        self.positions = positions;
    }

    #[inline]
    pub fn position(&self, row: usize, col: usize) -> Vector2<f64> {
        self.geometry
            .node_position(self.positions.as_slice(), self.geometry.index(row, col))
    }

    #[inline]
    pub fn bond_vector(
        &self,
        row: usize,
        col: usize,
        flags: BoundaryFlags,
        neighbor: Neighbor,
        shear: &ShearState,
    ) -> Vector2<f64> {
        self.geometry
            .bond_vector(self.positions.as_slice(), row, col, flags, neighbor, shear)
    }

    /// Index of the first node with a NaN coordinate, if any.
    pub fn first_nan_node(&self) -> Option<usize> {
        self.positions.iter().position(|v| v.is_nan()).map(|i| i / 2)
    }
}
