use super::geometry::{BondDirection, LatticeGeometry};
use rand::Rng;
use tracing::debug;

/// Stiffness magnitudes below this are treated as a missing spring.
pub const BROKEN_STIFFNESS: f64 = 1e-15;

/// Draws the three forward-bond stiffnesses of one node.
///
/// Each bond is independently present (stiffness `modulus`) with probability `probability`
/// and absent (stiffness `0`) otherwise. A probability outside `[0, 1]` saturates to
/// all-absent or all-present.
pub fn generate_bond_stiffnesses(probability: f64, modulus: f64, rng: &mut impl Rng) -> [f64; 3] {
    std::array::from_fn(|_| {
        if rng.gen_range(0.0..1.0) < probability {
            modulus
        } else {
            0.0
        }
    })
}

/// The immutable stiffness field of the network: three forward-bond stiffnesses per node.
#[derive(Debug, Clone, PartialEq)]
pub struct BondStiffness {
    springs: Vec<[f64; 3]>,
}

impl BondStiffness {
    /// Draws a disordered stiffness field for `geometry`.
    pub fn generate(
        geometry: &LatticeGeometry,
        probability: f64,
        modulus: f64,
        rng: &mut impl Rng,
    ) -> Self {
        let springs: Vec<[f64; 3]> = (0..geometry.node_count())
            .map(|_| generate_bond_stiffnesses(probability, modulus, rng))
            .collect();
        let field = Self { springs };
        debug!(
            probability,
            intact_fraction = field.intact_fraction(),
            "Generated bond stiffness field."
        );
        field
    }

    /// A fully connected field with every bond at `modulus`.
    pub fn uniform(geometry: &LatticeGeometry, modulus: f64) -> Self {
        Self {
            springs: vec![[modulus; 3]; geometry.node_count()],
        }
    }

    pub fn from_springs(springs: Vec<[f64; 3]>) -> Self {
        Self { springs }
    }

    #[inline]
    pub fn get(&self, node: usize, direction: BondDirection) -> f64 {
        self.springs[node][direction.slot()]
    }

    #[inline]
    pub fn node(&self, node: usize) -> &[f64; 3] {
        &self.springs[node]
    }

    #[inline]
    pub fn is_intact(&self, node: usize, direction: BondDirection) -> bool {
        self.get(node, direction).abs() >= BROKEN_STIFFNESS
    }

    pub fn node_count(&self) -> usize {
        self.springs.len()
    }

    pub fn intact_fraction(&self) -> f64 {
        if self.springs.is_empty() {
            return 0.0;
        }
        let intact = self
            .springs
            .iter()
            .flat_map(|s| s.iter())
            .filter(|k| k.abs() >= BROKEN_STIFFNESS)
            .count();
        intact as f64 / (3 * self.springs.len()) as f64
    }

    pub fn as_slice(&self) -> &[[f64; 3]] {
        &self.springs
    }
}
