use super::engine::MonthlyRates;
use super::types::{GoalOutcome, Inputs};

// Hard ceiling on the forward search; flat parameters can never reach an
// above-initial target, so the loop must be bounded to terminate.
pub const GOAL_MONTHS_CAP: u32 = 600;

pub fn solve_months_to_target(
    inputs: &Inputs,
    target_capital: f64,
    max_months: u32,
) -> GoalOutcome {
    let rates = MonthlyRates::from_inputs(inputs);
    let mut capital = inputs.initial_capital;
    let mut months = 0;

    while capital < target_capital && months < max_months {
        months += 1;
        capital = rates
            .accrue(capital, inputs.monthly_contribution)
            .closing_capital;
    }

    GoalOutcome {
        reached: capital >= target_capital,
        months,
        final_capital: capital,
    }
}
