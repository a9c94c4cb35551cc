// Aggregation Logic
// Combines indicator sub-scores into the overall AI probability

use crate::models::Indicator;

use super::error::DetectionError;

/// Weighted mean of indicator scores, rounded to 2 decimals and clamped to [0, 100]
pub fn aggregate_indicators(indicators: &[Indicator]) -> Result<f64, DetectionError> {
    let total_weight: f64 = indicators.iter().map(|i| i.weight).sum();
    if !total_weight.is_finite() || total_weight <= 0.0 {
        return Err(DetectionError::DegenerateInput(format!(
            "indicator weights sum to {} over {} indicators",
            total_weight,
            indicators.len()
        )));
    }

    let weighted: f64 = indicators.iter().map(|i| i.score * i.weight).sum();
    let probability = round2(weighted / total_weight);

    Ok(probability.clamp(0.0, 100.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
