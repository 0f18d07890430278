/// Elastic energy of a Hookean bond of stiffness `stiffness` stretched to `dist`.
///
/// The stiffness is scaled by the rest length, so the energy reads `k (d - L)² / (2 L)`.
#[inline]
pub fn hooke_energy(dist: f64, stiffness: f64, rest_length: f64) -> f64 {
    let stretch = dist - rest_length;
    0.5 * stiffness * stretch * stretch / rest_length
}

/// Tension carried by the bond, `k (d - L) / L`.
///
/// Positive values pull the two ends together. This is also `dE/dd` of [`hooke_energy`].
#[inline]
pub fn hooke_tension(dist: f64, stiffness: f64, rest_length: f64) -> f64 {
    stiffness * (dist - rest_length) / rest_length
}
