//! φ-driven size normalization for markers, edges, and surfaces.

/// Linearly map φ values into `[min_size, max_size]`: the minimum φ maps to
/// `min_size`, the maximum to `max_size`. When all φ values are equal
/// (including a single element) every output is the midpoint, which guards
/// against a zero φ range.
///
/// Output is order-preserving: `result[i]` corresponds to `phis[i]`.
pub fn normalize_sizes(min_size: f64, max_size: f64, phis: &[f64]) -> Vec<f64> {
    if phis.is_empty() {
        return Vec::new();
    }
    let min_phi = phis.iter().copied().fold(f64::INFINITY, f64::min);
    let max_phi = phis.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max_phi == min_phi {
        return vec![(min_size + max_size) / 2.0; phis.len()];
    }
    phis.iter()
        .map(|phi| min_size + ((phi - min_phi) * (max_size - min_size)) / (max_phi - min_phi))
        .collect()
}
