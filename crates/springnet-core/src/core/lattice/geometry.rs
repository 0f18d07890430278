use super::shear::ShearState;
use nalgebra::Vector2;

/// `√3 / 2`, the row spacing of a unit triangular lattice.
pub const HALF_SQRT_3: f64 = 0.866_025_403_784_438_6;

/// One of the three bonds owned by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondDirection {
    /// Bond to `(row, col + 1)`.
    East,
    /// Bond to `(row + 1, col)`.
    North,
    /// Bond to `(row + 1, col - 1)`.
    NorthWest,
}

impl BondDirection {
    pub const ALL: [BondDirection; 3] = [
        BondDirection::East,
        BondDirection::North,
        BondDirection::NorthWest,
    ];

    /// Slot of this direction in per-node `[_; 3]` arrays.
    #[inline]
    pub const fn slot(self) -> usize {
        match self {
            BondDirection::East => 0,
            BondDirection::North => 1,
            BondDirection::NorthWest => 2,
        }
    }

    #[inline]
    pub const fn from_slot(slot: usize) -> Option<Self> {
        match slot {
            0 => Some(BondDirection::East),
            1 => Some(BondDirection::North),
            2 => Some(BondDirection::NorthWest),
            _ => None,
        }
    }

    /// The stencil entry that reaches the far end of this bond.
    #[inline]
    pub const fn forward(self) -> Neighbor {
        match self {
            BondDirection::East => Neighbor::East,
            BondDirection::North => Neighbor::North,
            BondDirection::NorthWest => Neighbor::NorthWest,
        }
    }

    /// The stencil entry that reaches this bond's owner from its far end.
    #[inline]
    pub const fn backward(self) -> Neighbor {
        match self {
            BondDirection::East => Neighbor::West,
            BondDirection::North => Neighbor::South,
            BondDirection::NorthWest => Neighbor::SouthEast,
        }
    }
}

/// The six-neighbour stencil of a triangular lattice node.
///
/// The first three entries are the node's own (forward) bonds; the last three are the
/// forward bonds of the West, South and SouthEast neighbours seen from the other end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Neighbor {
    East,
    North,
    NorthWest,
    West,
    South,
    SouthEast,
}

impl Neighbor {
    pub const ALL: [Neighbor; 6] = [
        Neighbor::East,
        Neighbor::North,
        Neighbor::NorthWest,
        Neighbor::West,
        Neighbor::South,
        Neighbor::SouthEast,
    ];

    /// `(Δrow, Δcol)` before periodic wrapping.
    #[inline]
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Neighbor::East => (0, 1),
            Neighbor::North => (1, 0),
            Neighbor::NorthWest => (1, -1),
            Neighbor::West => (0, -1),
            Neighbor::South => (-1, 0),
            Neighbor::SouthEast => (-1, 1),
        }
    }

    /// The bond direction this stencil entry travels along, and whether the node at the
    /// centre of the stencil owns that bond.
    #[inline]
    pub const fn bond(self) -> (BondDirection, bool) {
        match self {
            Neighbor::East => (BondDirection::East, true),
            Neighbor::North => (BondDirection::North, true),
            Neighbor::NorthWest => (BondDirection::NorthWest, true),
            Neighbor::West => (BondDirection::East, false),
            Neighbor::South => (BondDirection::North, false),
            Neighbor::SouthEast => (BondDirection::NorthWest, false),
        }
    }
}

/// Which periodic boundaries a node sits on.
///
/// Computed once per node and passed explicitly to the shift calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundaryFlags {
    pub is_top: bool,
    pub is_bottom: bool,
    pub is_left: bool,
    pub is_right: bool,
}

/// Shape of the periodic triangular lattice.
///
/// Nodes are addressed by `(row, col)` with `0 <= row, col < N`, flattened row-major.
/// The rest position of node `(row, col)` is `x = L (col + row / 2)`, `y = L √3/2 row`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeGeometry {
    size: usize,
    rest_length: f64,
}

impl LatticeGeometry {
    /// Creates the geometry of an `size × size` lattice with bond rest length `rest_length`.
    ///
    /// # Panics
    ///
    /// Panics if `size < 2`; the periodic stencil and the mid-row reference need at least
    /// two rows.
    pub fn new(size: usize, rest_length: f64) -> Self {
        assert!(size >= 2, "lattice size must be at least 2, got {size}");
        Self { size, rest_length }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn rest_length(&self) -> f64 {
        self.rest_length
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.size * self.size
    }

    /// Length of the flat coordinate buffer, `2 N²`.
    #[inline]
    pub fn dof(&self) -> usize {
        2 * self.node_count()
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.size && col < self.size);
        row * self.size + col
    }

    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index / self.size, index % self.size)
    }

    /// Wraps signed lattice coordinates back into the cell.
    #[inline]
    pub fn wrap(&self, row: isize, col: isize) -> (usize, usize) {
        let n = self.size as isize;
        (row.rem_euclid(n) as usize, col.rem_euclid(n) as usize)
    }

    #[inline]
    pub fn neighbor(&self, row: usize, col: usize, neighbor: Neighbor) -> (usize, usize) {
        let (dr, dc) = neighbor.offset();
        self.wrap(row as isize + dr, col as isize + dc)
    }

    /// Node index and slot of the bond that `neighbor` travels along from `(row, col)`.
    #[inline]
    pub fn bond_owner(&self, row: usize, col: usize, neighbor: Neighbor) -> (usize, BondDirection) {
        let (direction, owned) = neighbor.bond();
        if owned {
            (self.index(row, col), direction)
        } else {
            let (r, c) = self.neighbor(row, col, neighbor);
            (self.index(r, c), direction)
        }
    }

    #[inline]
    pub fn boundary(&self, row: usize, col: usize) -> BoundaryFlags {
        let last = self.size - 1;
        BoundaryFlags {
            is_top: row == last,
            is_bottom: row == 0,
            is_left: col == 0,
            is_right: col == last,
        }
    }

    /// Vertical spacing between rows, `L √3/2`.
    #[inline]
    pub fn row_height(&self) -> f64 {
        self.rest_length * HALF_SQRT_3
    }

    /// Row index of mid-height, `(N - 1) / 2`.
    #[inline]
    pub fn mid_row(&self) -> f64 {
        (self.size as f64 - 1.0) / 2.0
    }

    #[inline]
    pub fn cell_width(&self) -> f64 {
        self.size as f64 * self.rest_length
    }

    #[inline]
    pub fn cell_height(&self) -> f64 {
        self.size as f64 * self.row_height()
    }

    /// Area of the periodic cell, `√3/2 N² L²`.
    #[inline]
    pub fn cell_area(&self) -> f64 {
        self.cell_width() * self.cell_height()
    }

    #[inline]
    pub fn rest_position(&self, row: usize, col: usize) -> Vector2<f64> {
        Vector2::new(
            self.rest_length * (col as f64 + row as f64 / 2.0),
            self.row_height() * row as f64,
        )
    }

    /// Affine x-displacement of `row` under `shear`, relative to mid-height.
    #[inline]
    pub fn affine_displacement(&self, row: usize, shear: &ShearState) -> f64 {
        shear.affine_offset() * (row as f64 - self.mid_row()) / self.mid_row()
    }

    #[inline]
    pub fn affine_position(&self, row: usize, col: usize, shear: &ShearState) -> Vector2<f64> {
        self.rest_position(row, col) + Vector2::new(self.affine_displacement(row, shear), 0.0)
    }

    /// Horizontal offset of the periodic image of the bottom row seen from the top row.
    ///
    /// Equal to `N L / 2 (1 + √3 γ)` for engineering strain `γ`.
    #[inline]
    pub fn vertical_wrap_offset(&self, shear: &ShearState) -> f64 {
        let n = self.size as f64;
        n * self.rest_length / 2.0 + (2.0 + 2.0 / (n - 1.0)) * shear.affine_offset()
    }

    /// Shift to add to the wrapped neighbour's position to obtain its periodic image.
    pub fn image_shift(
        &self,
        flags: BoundaryFlags,
        neighbor: Neighbor,
        shear: &ShearState,
    ) -> Vector2<f64> {
        let width = self.cell_width();
        let height = self.cell_height();
        let mut shift = Vector2::zeros();

        match neighbor {
            Neighbor::East => {
                if flags.is_right {
                    shift.x += width;
                }
            }
            Neighbor::North => {
                if flags.is_top {
                    shift.x += self.vertical_wrap_offset(shear);
                    shift.y += height;
                }
            }
            Neighbor::NorthWest => {
                if flags.is_top {
                    shift.x += self.vertical_wrap_offset(shear);
                    shift.y += height;
                }
                if flags.is_left {
                    shift.x -= width;
                }
            }
            Neighbor::West => {
                if flags.is_left {
                    shift.x -= width;
                }
            }
            Neighbor::South => {
                if flags.is_bottom {
                    shift.x -= self.vertical_wrap_offset(shear);
                    shift.y -= height;
                }
            }
            Neighbor::SouthEast => {
                if flags.is_bottom {
                    shift.x -= self.vertical_wrap_offset(shear);
                    shift.y -= height;
                }
                if flags.is_right {
                    shift.x += width;
                }
            }
        }

        shift
    }

    /// Reads node `index` out of a flat `(x, y)` buffer.
    #[inline]
    pub fn node_position(&self, positions: &[f64], index: usize) -> Vector2<f64> {
        Vector2::new(positions[2 * index], positions[2 * index + 1])
    }

    /// Vector from node `(row, col)` to the periodic image of its `neighbor`.
    #[inline]
    pub fn bond_vector(
        &self,
        positions: &[f64],
        row: usize,
        col: usize,
        flags: BoundaryFlags,
        neighbor: Neighbor,
        shear: &ShearState,
    ) -> Vector2<f64> {
        let (nr, nc) = self.neighbor(row, col, neighbor);
        let here = self.node_position(positions, self.index(row, col));
        let there = self.node_position(positions, self.index(nr, nc));
        there + self.image_shift(flags, neighbor, shear) - here
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn unwrapped_rest_position(geometry: &LatticeGeometry, row: isize, col: isize) -> Vector2<f64> {
        let l = geometry.rest_length();
        Vector2::new(
            l * (col as f64 + row as f64 / 2.0),
            geometry.row_height() * row as f64,
        )
    }

    fn rest_buffer(geometry: &LatticeGeometry) -> Vec<f64> {
        let mut buffer = vec![0.0; geometry.dof()];
        for row in 0..geometry.size() {
            for col in 0..geometry.size() {
                let p = geometry.rest_position(row, col);
                let idx = geometry.index(row, col);
                buffer[2 * idx] = p.x;
                buffer[2 * idx + 1] = p.y;
            }
        }
        buffer
    }

    #[test]
    fn index_and_coords_are_inverse() {
        let geometry = LatticeGeometry::new(7, 1.0);
        for idx in 0..geometry.node_count() {
            let (row, col) = geometry.coords(idx);
            assert_eq!(geometry.index(row, col), idx);
        }
        assert_eq!(geometry.index(2, 3), 17);
    }

    #[test]
    fn wrap_handles_negative_and_overflowing_coordinates() {
        let geometry = LatticeGeometry::new(4, 1.0);
        assert_eq!(geometry.wrap(-1, 0), (3, 0));
        assert_eq!(geometry.wrap(4, -1), (0, 3));
        assert_eq!(geometry.wrap(2, 5), (2, 1));
    }

    #[test]
    fn neighbor_wraps_at_every_edge() {
        let geometry = LatticeGeometry::new(4, 1.0);
        assert_eq!(geometry.neighbor(1, 3, Neighbor::East), (1, 0));
        assert_eq!(geometry.neighbor(3, 2, Neighbor::North), (0, 2));
        assert_eq!(geometry.neighbor(3, 0, Neighbor::NorthWest), (0, 3));
        assert_eq!(geometry.neighbor(2, 0, Neighbor::West), (2, 3));
        assert_eq!(geometry.neighbor(0, 1, Neighbor::South), (3, 1));
        assert_eq!(geometry.neighbor(0, 3, Neighbor::SouthEast), (3, 0));
    }

    #[test]
    fn backward_bonds_are_owned_by_the_neighbor() {
        let geometry = LatticeGeometry::new(5, 1.0);
        assert_eq!(
            geometry.bond_owner(2, 2, Neighbor::North),
            (geometry.index(2, 2), BondDirection::North)
        );
        assert_eq!(
            geometry.bond_owner(2, 0, Neighbor::West),
            (geometry.index(2, 4), BondDirection::East)
        );
        assert_eq!(
            geometry.bond_owner(0, 4, Neighbor::SouthEast),
            (geometry.index(4, 0), BondDirection::NorthWest)
        );
    }

    #[test]
    fn forward_and_backward_stencil_entries_cancel() {
        for direction in BondDirection::ALL {
            let (fr, fc) = direction.forward().offset();
            let (br, bc) = direction.backward().offset();
            assert_eq!((fr + br, fc + bc), (0, 0));
            assert_eq!(BondDirection::from_slot(direction.slot()), Some(direction));
        }
    }

    #[test]
    fn boundary_flags_mark_only_edge_nodes() {
        let geometry = LatticeGeometry::new(4, 1.0);
        assert_eq!(geometry.boundary(1, 2), BoundaryFlags::default());
        let corner = geometry.boundary(3, 0);
        assert!(corner.is_top && corner.is_left && !corner.is_bottom && !corner.is_right);
    }

    #[test]
    fn periodic_image_matches_unwrapped_rest_position_at_zero_strain() {
        let geometry = LatticeGeometry::new(5, 1.3);
        let positions = rest_buffer(&geometry);
        let shear = ShearState::unstrained();

        for row in 0..geometry.size() {
            for col in 0..geometry.size() {
                let flags = geometry.boundary(row, col);
                for neighbor in Neighbor::ALL {
                    let (nr, nc) = geometry.neighbor(row, col, neighbor);
                    let image = geometry.node_position(&positions, geometry.index(nr, nc))
                        + geometry.image_shift(flags, neighbor, &shear);
                    let (dr, dc) = neighbor.offset();
                    let expected =
                        unwrapped_rest_position(&geometry, row as isize + dr, col as isize + dc);
                    assert!(
                        (image - expected).norm() < TOLERANCE,
                        "node ({row}, {col}) neighbour {neighbor:?}: {image:?} != {expected:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn every_rest_bond_has_rest_length_at_zero_strain() {
        let geometry = LatticeGeometry::new(4, 1.0);
        let positions = rest_buffer(&geometry);
        let shear = ShearState::unstrained();
        for row in 0..4 {
            for col in 0..4 {
                let flags = geometry.boundary(row, col);
                for neighbor in Neighbor::ALL {
                    let bond = geometry.bond_vector(&positions, row, col, flags, neighbor, &shear);
                    assert!((bond.norm() - 1.0).abs() < TOLERANCE);
                }
            }
        }
    }

    #[test]
    fn interior_nodes_never_shift() {
        let geometry = LatticeGeometry::new(6, 1.0);
        let shear = ShearState::from_strain(0.2, &geometry);
        let flags = geometry.boundary(2, 3);
        for neighbor in Neighbor::ALL {
            assert_eq!(geometry.image_shift(flags, neighbor, &shear), Vector2::zeros());
        }
    }

    #[test]
    fn top_wrap_shift_matches_engineering_strain_form() {
        let geometry = LatticeGeometry::new(8, 1.0);
        let strain = 0.05;
        let shear = ShearState::from_strain(strain, &geometry);
        let flags = geometry.boundary(7, 3);
        let shift = geometry.image_shift(flags, Neighbor::North, &shear);
        let n = 8.0;
        assert!((shift.x - n / 2.0 * (1.0 + 3f64.sqrt() * strain)).abs() < TOLERANCE);
        assert!((shift.y - n * HALF_SQRT_3).abs() < TOLERANCE);
    }

    #[test]
    fn bottom_wrap_shift_mirrors_top_wrap_shift() {
        let geometry = LatticeGeometry::new(6, 1.0);
        let shear = ShearState::from_affine_offset(0.4);
        let top = geometry.image_shift(geometry.boundary(5, 0), Neighbor::NorthWest, &shear);
        let bottom = geometry.image_shift(geometry.boundary(0, 5), Neighbor::SouthEast, &shear);
        assert!((top + bottom).norm() < TOLERANCE);
    }

    #[test]
    fn affinely_sheared_bonds_are_consistent_across_the_top_boundary() {
        let geometry = LatticeGeometry::new(6, 1.0);
        let shear = ShearState::from_strain(0.1, &geometry);
        let mut positions = vec![0.0; geometry.dof()];
        for row in 0..6 {
            for col in 0..6 {
                let p = geometry.affine_position(row, col, &shear);
                let idx = geometry.index(row, col);
                positions[2 * idx] = p.x;
                positions[2 * idx + 1] = p.y;
            }
        }
        let interior = geometry.bond_vector(
            &positions,
            2,
            2,
            geometry.boundary(2, 2),
            Neighbor::North,
            &shear,
        );
        let across = geometry.bond_vector(
            &positions,
            5,
            2,
            geometry.boundary(5, 2),
            Neighbor::North,
            &shear,
        );
        assert!((interior - across).norm() < TOLERANCE);
    }

    #[test]
    #[should_panic]
    fn single_node_lattice_is_rejected() {
        let _ = LatticeGeometry::new(1, 1.0);
    }
}
