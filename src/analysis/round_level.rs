pub const DEFAULT_ROUND_LEVELS: [f64; 3] = [1000.0, 500.0, 100.0];

/// Fraction of a granularity the price may sit away from its round value.
pub const ROUND_TOLERANCE: f64 = 0.1;

/// Snap `price` to the first granularity (coarsest first) whose nearest
/// multiple lies within [`ROUND_TOLERANCE`] of that granularity.
pub fn find_round_level(price: Option<f64>, granularities: &[f64]) -> Option<f64> {
    let price = price.filter(|p| !p.is_nan())?;
    granularities
        .iter()
        .copied()
        .filter(|g| *g > 0.0)
        .find_map(|g| {
            let rounded = (price / g).round() * g;
            ((price - rounded).abs() < g * ROUND_TOLERANCE).then_some(rounded)
        })
}
