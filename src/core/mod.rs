mod engine;
mod scenario;
mod solver;
mod types;

pub use engine::{run_projection, summarize_projection};
pub use scenario::{DEFAULT_RETURN_DELTAS, run_sensitivity};
pub use solver::{GOAL_MONTHS_CAP, solve_months_to_target};
pub use types::{GoalOutcome, Inputs, MonthRecord, ProjectionSummary, ScenarioResult};
