use super::engine::run_projection;
use super::types::{Inputs, ScenarioResult};

pub const DEFAULT_RETURN_DELTAS: [f64; 3] = [-5.0, 0.0, 5.0];

pub fn run_sensitivity(inputs: &Inputs, deltas: &[f64]) -> Vec<ScenarioResult> {
    deltas
        .iter()
        .map(|&delta| {
            let mut variant = inputs.clone();
            variant.annual_return_rate = (inputs.annual_return_rate + delta).max(0.0);

            let records = run_projection(&variant);
            let final_capital = records
                .last()
                .map(|r| r.closing_capital)
                .unwrap_or(variant.initial_capital);

            ScenarioResult {
                label: scenario_label(delta).to_string(),
                annual_return_rate: variant.annual_return_rate,
                return_delta: delta,
                final_capital,
            }
        })
        .collect()
}

fn scenario_label(delta: f64) -> &'static str {
    if delta < 0.0 {
        "pessimistic"
    } else if delta > 0.0 {
        "optimistic"
    } else {
        "base"
    }
}
