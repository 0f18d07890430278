use super::geometry::LatticeGeometry;

/// Magnitudes below this are treated as an unstrained cell.
pub const STRAIN_EPSILON: f64 = 1e-15;

/// The shear state of the periodic cell.
///
/// The state is the accumulated affine boundary displacement: how far the top row of the
/// lattice has been carried along `x`, relative to mid-height, by the affine shear flow.
/// Row `r` of an affinely deformed lattice sits at `affine_offset * (r - mid) / mid`, with
/// `mid = (N - 1) / 2`. The engineering shear strain follows from the row spacing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShearState {
    affine_offset: f64,
}

impl ShearState {
    pub fn unstrained() -> Self {
        Self::default()
    }

    pub fn from_affine_offset(affine_offset: f64) -> Self {
        Self { affine_offset }
    }

    /// Builds the shear state that corresponds to an engineering shear strain `strain`.
    pub fn from_strain(strain: f64, geometry: &LatticeGeometry) -> Self {
        Self {
            affine_offset: strain * geometry.row_height() * geometry.mid_row(),
        }
    }

    #[inline]
    pub fn affine_offset(&self) -> f64 {
        self.affine_offset
    }

    /// Engineering shear strain `γ` of the cell.
    #[inline]
    pub fn strain(&self, geometry: &LatticeGeometry) -> f64 {
        self.affine_offset / (geometry.row_height() * geometry.mid_row())
    }

    /// Moves the top boundary by `displacement` (the bottom moves by the opposite amount).
    #[inline]
    pub fn advance(&mut self, displacement: f64) {
        self.affine_offset += displacement;
    }

    #[inline]
    pub fn is_unstrained(&self) -> bool {
        self.affine_offset.abs() < STRAIN_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strain_round_trips_through_affine_offset() {
        let geometry = LatticeGeometry::new(10, 1.0);
        let shear = ShearState::from_strain(0.03, &geometry);
        assert!((shear.strain(&geometry) - 0.03).abs() < 1e-14);
    }

    #[test]
    fn affine_offset_is_half_the_sheared_height_times_strain() {
        let geometry = LatticeGeometry::new(5, 2.0);
        let shear = ShearState::from_strain(0.1, &geometry);
        let expected = 0.1 * 2.0 * 3f64.sqrt() / 2.0 * 2.0;
        assert!((shear.affine_offset() - expected).abs() < 1e-12);
    }

    #[test]
    fn advance_accumulates_displacement() {
        let mut shear = ShearState::unstrained();
        assert!(shear.is_unstrained());
        shear.advance(0.25);
        shear.advance(-0.05);
        assert!((shear.affine_offset() - 0.2).abs() < 1e-15);
        assert!(!shear.is_unstrained());
    }
}
