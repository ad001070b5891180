use serde::Serialize;

#[derive(Debug, Clone)]
pub struct Inputs {
    pub initial_capital: f64,
    pub monthly_contribution: f64,
    pub annual_return_rate: f64,
    pub annual_dividend_rate: f64,
    pub withholding_rate: f64,
    pub horizon_months: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRecord {
    pub month: u32,
    pub opening_capital: f64,
    pub contribution: f64,
    pub net_dividends: f64,
    pub growth: f64,
    pub closing_capital: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub total_invested: f64,
    pub final_capital: f64,
    pub gain: f64,
    pub total_return_pct: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalOutcome {
    pub reached: bool,
    pub months: u32,
    pub final_capital: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub label: String,
    pub annual_return_rate: f64,
    pub return_delta: f64,
    pub final_capital: f64,
}
