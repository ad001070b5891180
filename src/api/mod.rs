use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    DEFAULT_RETURN_DELTAS, GOAL_MONTHS_CAP, GoalOutcome, Inputs, MonthRecord, ProjectionSummary,
    ScenarioResult, run_projection, run_sensitivity, solve_months_to_target, summarize_projection,
};

const DEFAULT_TARGET_CAPITAL: f64 = 100_000.0;
const MAX_HORIZON_MONTHS: u32 = 1_200;

#[derive(Parser, Debug)]
#[command(
    name = "drip",
    about = "Monthly compounding simulator for contribution plans with dividend reinvestment"
)]
struct Cli {
    #[arg(long, default_value_t = 10_000.0, help = "Starting capital in USD")]
    initial_capital: f64,
    #[arg(
        long,
        default_value_t = 500.0,
        help = "Contribution added at the start of every month"
    )]
    monthly_contribution: f64,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Expected annual price appreciation in percent, e.g. 10"
    )]
    annual_return_rate: f64,
    #[arg(long, default_value_t = 2.0, help = "Annual dividend yield in percent")]
    annual_dividend_rate: f64,
    #[arg(
        long,
        default_value_t = 30.0,
        help = "Dividend withholding tax in percent (30 for non-residents, 15 under treaty)"
    )]
    withholding_rate: f64,
    #[arg(long, default_value_t = 60, help = "Projection horizon in months")]
    horizon_months: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    initial_capital: Option<f64>,
    monthly_contribution: Option<f64>,
    annual_return_rate: Option<f64>,
    annual_dividend_rate: Option<f64>,
    withholding_rate: Option<f64>,
    horizon_months: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GoalPayload {
    initial_capital: Option<f64>,
    monthly_contribution: Option<f64>,
    annual_return_rate: Option<f64>,
    annual_dividend_rate: Option<f64>,
    withholding_rate: Option<f64>,
    target_capital: Option<f64>,
    max_months: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SensitivityPayload {
    initial_capital: Option<f64>,
    monthly_contribution: Option<f64>,
    annual_return_rate: Option<f64>,
    annual_dividend_rate: Option<f64>,
    withholding_rate: Option<f64>,
    horizon_months: Option<u32>,
    deltas: Option<Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ComparePayload {
    initial_capital: Option<f64>,
    monthly_contribution: Option<f64>,
    withholding_rate: Option<f64>,
    horizon_months: Option<u32>,
    instruments: Option<Vec<InstrumentPayload>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstrumentPayload {
    name: String,
    annual_return_rate: f64,
    annual_dividend_rate: f64,
    #[serde(default = "default_true")]
    active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug)]
struct GoalRequest {
    inputs: Inputs,
    target_capital: f64,
    max_months: u32,
}

#[derive(Debug)]
struct SensitivityRequest {
    inputs: Inputs,
    deltas: Vec<f64>,
}

#[derive(Debug, Clone)]
struct CompareInstrument {
    name: String,
    annual_return_rate: f64,
    annual_dividend_rate: f64,
}

#[derive(Debug)]
struct CompareRequest {
    inputs: Inputs,
    instruments: Vec<CompareInstrument>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    total_invested: f64,
    final_capital: f64,
    gain: f64,
    total_return_pct: f64,
    months: Vec<MonthRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoalResponse {
    reached: bool,
    months: u32,
    years: u32,
    remaining_months: u32,
    target_capital: f64,
    final_capital: f64,
    total_invested: f64,
    projected_gain: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioEntry {
    label: String,
    return_delta: f64,
    annual_return_rate: f64,
    final_capital: f64,
    gain: f64,
    delta_vs_base: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SensitivityResponse {
    total_invested: f64,
    base_final_capital: f64,
    scenarios: Vec<ScenarioEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareEntry {
    name: String,
    annual_return_rate: f64,
    annual_dividend_rate: f64,
    final_capital: f64,
    gain: f64,
    closing_capitals: Vec<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    total_invested: f64,
    instruments: Vec<CompareEntry>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<Inputs, String> {
    if !cli.initial_capital.is_finite() || cli.initial_capital < 0.0 {
        return Err("--initial-capital must be >= 0".to_string());
    }

    if !cli.monthly_contribution.is_finite() || cli.monthly_contribution < 0.0 {
        return Err("--monthly-contribution must be >= 0".to_string());
    }

    if !cli.annual_return_rate.is_finite() || cli.annual_return_rate < 0.0 {
        return Err("--annual-return-rate must be >= 0".to_string());
    }

    if !cli.annual_dividend_rate.is_finite() || cli.annual_dividend_rate < 0.0 {
        return Err("--annual-dividend-rate must be >= 0".to_string());
    }

    if !cli.withholding_rate.is_finite() || !(0.0..=100.0).contains(&cli.withholding_rate) {
        return Err("--withholding-rate must be between 0 and 100".to_string());
    }

    if !(1..=MAX_HORIZON_MONTHS).contains(&cli.horizon_months) {
        return Err(format!(
            "--horizon-months must be between 1 and {MAX_HORIZON_MONTHS}"
        ));
    }

    Ok(Inputs {
        initial_capital: cli.initial_capital,
        monthly_contribution: cli.monthly_contribution,
        annual_return_rate: cli.annual_return_rate,
        annual_dividend_rate: cli.annual_dividend_rate,
        withholding_rate: cli.withholding_rate,
        horizon_months: cli.horizon_months,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/goal", get(goal_get_handler).post(goal_post_handler))
        .route("/api/sensitivity", post(sensitivity_post_handler))
        .route("/api/compare", post(compare_post_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("drip HTTP API listening on http://{addr}");
    info!("local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let inputs = match simulate_inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return bad_request(&msg),
    };

    let records = run_projection(&inputs);
    let summary = summarize_projection(&inputs, &records);
    json_response(StatusCode::OK, build_simulate_response(summary, records))
}

async fn goal_get_handler(Query(payload): Query<GoalPayload>) -> Response {
    goal_handler_impl(payload)
}

async fn goal_post_handler(Json(payload): Json<GoalPayload>) -> Response {
    goal_handler_impl(payload)
}

fn goal_handler_impl(payload: GoalPayload) -> Response {
    let request = match goal_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return bad_request(&msg),
    };

    let outcome = solve_months_to_target(&request.inputs, request.target_capital, request.max_months);
    json_response(
        StatusCode::OK,
        build_goal_response(&request.inputs, request.target_capital, outcome),
    )
}

async fn sensitivity_post_handler(Json(payload): Json<SensitivityPayload>) -> Response {
    let request = match sensitivity_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return bad_request(&msg),
    };

    json_response(
        StatusCode::OK,
        build_sensitivity_response(&request.inputs, &request.deltas),
    )
}

async fn compare_post_handler(Json(payload): Json<ComparePayload>) -> Response {
    let request = match compare_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return bad_request(&msg),
    };

    json_response(
        StatusCode::OK,
        build_compare_response(&request.inputs, &request.instruments),
    )
}

fn bad_request(msg: &str) -> Response {
    warn!("rejected request: {msg}");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn simulate_inputs_from_payload(payload: SimulatePayload) -> Result<Inputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_capital {
        cli.initial_capital = v;
    }
    if let Some(v) = payload.monthly_contribution {
        cli.monthly_contribution = v;
    }
    if let Some(v) = payload.annual_return_rate {
        cli.annual_return_rate = v;
    }
    if let Some(v) = payload.annual_dividend_rate {
        cli.annual_dividend_rate = v;
    }
    if let Some(v) = payload.withholding_rate {
        cli.withholding_rate = v;
    }
    if let Some(v) = payload.horizon_months {
        cli.horizon_months = v;
    }

    build_inputs(cli)
}

fn goal_request_from_payload(payload: GoalPayload) -> Result<GoalRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_capital {
        cli.initial_capital = v;
    }
    if let Some(v) = payload.monthly_contribution {
        cli.monthly_contribution = v;
    }
    if let Some(v) = payload.annual_return_rate {
        cli.annual_return_rate = v;
    }
    if let Some(v) = payload.annual_dividend_rate {
        cli.annual_dividend_rate = v;
    }
    if let Some(v) = payload.withholding_rate {
        cli.withholding_rate = v;
    }

    let inputs = build_inputs(cli)?;

    let target_capital = payload.target_capital.unwrap_or(DEFAULT_TARGET_CAPITAL);
    if !target_capital.is_finite() || target_capital < 0.0 {
        return Err("targetCapital must be >= 0".to_string());
    }

    let max_months = payload.max_months.unwrap_or(GOAL_MONTHS_CAP);
    if !(1..=GOAL_MONTHS_CAP).contains(&max_months) {
        return Err(format!("maxMonths must be between 1 and {GOAL_MONTHS_CAP}"));
    }

    Ok(GoalRequest {
        inputs,
        target_capital,
        max_months,
    })
}

fn sensitivity_request_from_payload(payload: SensitivityPayload) -> Result<SensitivityRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_capital {
        cli.initial_capital = v;
    }
    if let Some(v) = payload.monthly_contribution {
        cli.monthly_contribution = v;
    }
    if let Some(v) = payload.annual_return_rate {
        cli.annual_return_rate = v;
    }
    if let Some(v) = payload.annual_dividend_rate {
        cli.annual_dividend_rate = v;
    }
    if let Some(v) = payload.withholding_rate {
        cli.withholding_rate = v;
    }
    if let Some(v) = payload.horizon_months {
        cli.horizon_months = v;
    }

    let inputs = build_inputs(cli)?;

    let deltas = payload
        .deltas
        .unwrap_or_else(|| DEFAULT_RETURN_DELTAS.to_vec());
    if deltas.is_empty() {
        return Err("deltas must not be empty".to_string());
    }
    if deltas.iter().any(|d| !d.is_finite()) {
        return Err("deltas must be finite".to_string());
    }

    Ok(SensitivityRequest { inputs, deltas })
}

fn compare_request_from_payload(payload: ComparePayload) -> Result<CompareRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_capital {
        cli.initial_capital = v;
    }
    if let Some(v) = payload.monthly_contribution {
        cli.monthly_contribution = v;
    }
    if let Some(v) = payload.withholding_rate {
        cli.withholding_rate = v;
    }
    if let Some(v) = payload.horizon_months {
        cli.horizon_months = v;
    }

    let inputs = build_inputs(cli)?;

    let instruments: Vec<CompareInstrument> = payload
        .instruments
        .unwrap_or_else(default_instruments)
        .into_iter()
        .filter(|instrument| instrument.active)
        .map(|instrument| CompareInstrument {
            name: instrument.name,
            annual_return_rate: instrument.annual_return_rate,
            annual_dividend_rate: instrument.annual_dividend_rate,
        })
        .collect();

    if instruments.is_empty() {
        return Err("at least one active instrument is required".to_string());
    }

    for instrument in &instruments {
        if instrument.name.trim().is_empty() {
            return Err("instrument name must not be empty".to_string());
        }
        if !instrument.annual_return_rate.is_finite() || instrument.annual_return_rate < 0.0 {
            return Err(format!(
                "instrument {}: annualReturnRate must be >= 0",
                instrument.name
            ));
        }
        if !instrument.annual_dividend_rate.is_finite() || instrument.annual_dividend_rate < 0.0 {
            return Err(format!(
                "instrument {}: annualDividendRate must be >= 0",
                instrument.name
            ));
        }
    }

    Ok(CompareRequest { inputs, instruments })
}

fn default_cli_for_api() -> Cli {
    Cli {
        initial_capital: 10_000.0,
        monthly_contribution: 500.0,
        annual_return_rate: 10.0,
        annual_dividend_rate: 2.0,
        withholding_rate: 30.0,
        horizon_months: 60,
    }
}

fn default_instruments() -> Vec<InstrumentPayload> {
    [
        ("SPY (S&P 500)", 10.0, 1.5),
        ("VOO (S&P 500)", 10.0, 1.4),
        ("QQQ (Nasdaq)", 15.0, 0.6),
        ("SCHD (Dividend)", 11.0, 3.5),
    ]
    .into_iter()
    .map(|(name, annual_return_rate, annual_dividend_rate)| InstrumentPayload {
        name: name.to_string(),
        annual_return_rate,
        annual_dividend_rate,
        active: true,
    })
    .collect()
}

fn build_simulate_response(summary: ProjectionSummary, months: Vec<MonthRecord>) -> SimulateResponse {
    SimulateResponse {
        total_invested: summary.total_invested,
        final_capital: summary.final_capital,
        gain: summary.gain,
        total_return_pct: summary.total_return_pct,
        months,
    }
}

fn build_goal_response(inputs: &Inputs, target_capital: f64, outcome: GoalOutcome) -> GoalResponse {
    let total_invested =
        inputs.initial_capital + inputs.monthly_contribution * outcome.months as f64;

    GoalResponse {
        reached: outcome.reached,
        months: outcome.months,
        years: outcome.months / 12,
        remaining_months: outcome.months % 12,
        target_capital,
        final_capital: outcome.final_capital,
        total_invested,
        projected_gain: target_capital - total_invested,
    }
}

fn build_sensitivity_response(inputs: &Inputs, deltas: &[f64]) -> SensitivityResponse {
    let records = run_projection(inputs);
    let summary = summarize_projection(inputs, &records);

    let scenarios = run_sensitivity(inputs, deltas)
        .into_iter()
        .map(|scenario| {
            let ScenarioResult {
                label,
                annual_return_rate,
                return_delta,
                final_capital,
            } = scenario;

            ScenarioEntry {
                label,
                return_delta,
                annual_return_rate,
                final_capital,
                gain: final_capital - summary.total_invested,
                delta_vs_base: final_capital - summary.final_capital,
            }
        })
        .collect();

    SensitivityResponse {
        total_invested: summary.total_invested,
        base_final_capital: summary.final_capital,
        scenarios,
    }
}

fn build_compare_response(inputs: &Inputs, instruments: &[CompareInstrument]) -> CompareResponse {
    let total_invested =
        inputs.initial_capital + inputs.monthly_contribution * inputs.horizon_months as f64;

    let instruments = instruments
        .iter()
        .map(|instrument| {
            let mut variant = inputs.clone();
            variant.annual_return_rate = instrument.annual_return_rate;
            variant.annual_dividend_rate = instrument.annual_dividend_rate;

            let records = run_projection(&variant);
            let final_capital = records
                .last()
                .map(|r| r.closing_capital)
                .unwrap_or(variant.initial_capital);

            CompareEntry {
                name: instrument.name.clone(),
                annual_return_rate: instrument.annual_return_rate,
                annual_dividend_rate: instrument.annual_dividend_rate,
                final_capital,
                gain: final_capital - total_invested,
                closing_capitals: records.iter().map(|r| r.closing_capital).collect(),
            }
        })
        .collect();

    CompareResponse {
        total_invested,
        instruments,
    }
}

#[cfg(test)]
fn simulate_inputs_from_json(json: &str) -> Result<Inputs, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    simulate_inputs_from_payload(payload)
}

#[cfg(test)]
fn goal_request_from_json(json: &str) -> Result<GoalRequest, String> {
    let payload = serde_json::from_str::<GoalPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    goal_request_from_payload(payload)
}

#[cfg(test)]
fn compare_request_from_json(json: &str) -> Result<CompareRequest, String> {
    let payload = serde_json::from_str::<ComparePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    compare_request_from_payload(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn build_inputs_accepts_the_canonical_defaults() {
        let inputs = build_inputs(sample_cli()).expect("valid inputs");

        assert_approx(inputs.initial_capital, 10_000.0);
        assert_approx(inputs.monthly_contribution, 500.0);
        assert_approx(inputs.annual_return_rate, 10.0);
        assert_approx(inputs.annual_dividend_rate, 2.0);
        assert_approx(inputs.withholding_rate, 30.0);
        assert_eq!(inputs.horizon_months, 60);
    }

    #[test]
    fn build_inputs_rejects_negative_initial_capital() {
        let mut cli = sample_cli();
        cli.initial_capital = -1.0;

        let err = build_inputs(cli).expect_err("must reject negative capital");
        assert!(err.contains("--initial-capital"));
    }

    #[test]
    fn build_inputs_rejects_non_finite_return_rate() {
        let mut cli = sample_cli();
        cli.annual_return_rate = f64::NAN;

        let err = build_inputs(cli).expect_err("must reject NaN rate");
        assert!(err.contains("--annual-return-rate"));
    }

    #[test]
    fn build_inputs_rejects_out_of_range_withholding() {
        let mut cli = sample_cli();
        cli.withholding_rate = 150.0;

        let err = build_inputs(cli).expect_err("must reject withholding above 100");
        assert!(err.contains("--withholding-rate"));
    }

    #[test]
    fn build_inputs_rejects_zero_horizon() {
        let mut cli = sample_cli();
        cli.horizon_months = 0;

        let err = build_inputs(cli).expect_err("must reject a zero horizon");
        assert!(err.contains("--horizon-months"));
    }

    #[test]
    fn build_inputs_rejects_horizon_above_the_serving_bound() {
        let mut cli = sample_cli();
        cli.horizon_months = MAX_HORIZON_MONTHS + 1;

        let err = build_inputs(cli).expect_err("must reject an oversized horizon");
        assert!(err.contains("--horizon-months"));
    }

    #[test]
    fn simulate_inputs_from_json_parses_web_keys() {
        let json = r#"{
          "initialCapital": 20000,
          "monthlyContribution": 250,
          "annualReturnRate": 8,
          "annualDividendRate": 1.5,
          "withholdingRate": 15,
          "horizonMonths": 120
        }"#;
        let inputs = simulate_inputs_from_json(json).expect("json should parse");

        assert_approx(inputs.initial_capital, 20_000.0);
        assert_approx(inputs.monthly_contribution, 250.0);
        assert_approx(inputs.annual_return_rate, 8.0);
        assert_approx(inputs.annual_dividend_rate, 1.5);
        assert_approx(inputs.withholding_rate, 15.0);
        assert_eq!(inputs.horizon_months, 120);
    }

    #[test]
    fn simulate_inputs_from_json_keeps_defaults_for_missing_keys() {
        let inputs = simulate_inputs_from_json(r#"{"initialCapital": 1}"#).expect("json parses");

        assert_approx(inputs.initial_capital, 1.0);
        assert_approx(inputs.monthly_contribution, 500.0);
        assert_eq!(inputs.horizon_months, 60);
    }

    #[test]
    fn simulate_response_serialization_contains_expected_fields() {
        let inputs = build_inputs(sample_cli()).expect("valid inputs");
        let records = run_projection(&inputs);
        let summary = summarize_projection(&inputs, &records);
        let response = build_simulate_response(summary, records);

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"totalInvested\""));
        assert!(json.contains("\"finalCapital\""));
        assert!(json.contains("\"gain\""));
        assert!(json.contains("\"totalReturnPct\""));
        assert!(json.contains("\"months\""));
        assert!(json.contains("\"openingCapital\""));
        assert!(json.contains("\"netDividends\""));
        assert!(json.contains("\"closingCapital\""));
    }

    #[test]
    fn goal_request_defaults_target_and_cap() {
        let request = goal_request_from_payload(GoalPayload::default()).expect("valid request");

        assert_approx(request.target_capital, DEFAULT_TARGET_CAPITAL);
        assert_eq!(request.max_months, GOAL_MONTHS_CAP);
    }

    #[test]
    fn goal_request_rejects_max_months_outside_the_cap() {
        let err = goal_request_from_payload(GoalPayload {
            max_months: Some(0),
            ..GoalPayload::default()
        })
        .expect_err("must reject zero maxMonths");
        assert!(err.contains("maxMonths"));

        let err = goal_request_from_payload(GoalPayload {
            max_months: Some(GOAL_MONTHS_CAP + 1),
            ..GoalPayload::default()
        })
        .expect_err("must reject maxMonths above the ceiling");
        assert!(err.contains("maxMonths"));
    }

    #[test]
    fn goal_request_from_json_parses_web_keys() {
        let json = r#"{
          "initialCapital": 50000,
          "monthlyContribution": 1000,
          "targetCapital": 250000,
          "maxMonths": 480
        }"#;
        let request = goal_request_from_json(json).expect("json should parse");

        assert_approx(request.inputs.initial_capital, 50_000.0);
        assert_approx(request.inputs.monthly_contribution, 1_000.0);
        assert_approx(request.target_capital, 250_000.0);
        assert_eq!(request.max_months, 480);
    }

    #[test]
    fn goal_response_breaks_months_into_years() {
        let inputs = build_inputs(sample_cli()).expect("valid inputs");
        let outcome = GoalOutcome {
            reached: true,
            months: 27,
            final_capital: 101_234.0,
        };

        let response = build_goal_response(&inputs, 100_000.0, outcome);
        assert!(response.reached);
        assert_eq!(response.months, 27);
        assert_eq!(response.years, 2);
        assert_eq!(response.remaining_months, 3);
        assert_approx(response.total_invested, 10_000.0 + 500.0 * 27.0);
        assert_approx(response.projected_gain, 100_000.0 - 23_500.0);
        assert_approx(response.final_capital, 101_234.0);
    }

    #[test]
    fn goal_flow_reports_an_already_met_target() {
        let request = goal_request_from_payload(GoalPayload {
            target_capital: Some(5_000.0),
            ..GoalPayload::default()
        })
        .expect("valid request");

        let outcome =
            solve_months_to_target(&request.inputs, request.target_capital, request.max_months);
        let response = build_goal_response(&request.inputs, request.target_capital, outcome);

        assert!(response.reached);
        assert_eq!(response.months, 0);
        assert_approx(response.total_invested, 10_000.0);
    }

    #[test]
    fn sensitivity_request_defaults_to_canonical_deltas() {
        let request = sensitivity_request_from_payload(SensitivityPayload::default())
            .expect("valid request");

        assert_eq!(request.deltas, DEFAULT_RETURN_DELTAS.to_vec());
    }

    #[test]
    fn sensitivity_request_rejects_empty_deltas() {
        let err = sensitivity_request_from_payload(SensitivityPayload {
            deltas: Some(Vec::new()),
            ..SensitivityPayload::default()
        })
        .expect_err("must reject an empty delta list");
        assert!(err.contains("deltas"));
    }

    #[test]
    fn sensitivity_request_rejects_non_finite_deltas() {
        let err = sensitivity_request_from_payload(SensitivityPayload {
            deltas: Some(vec![0.0, f64::INFINITY]),
            ..SensitivityPayload::default()
        })
        .expect_err("must reject non-finite deltas");
        assert!(err.contains("deltas"));
    }

    #[test]
    fn sensitivity_response_measures_gain_against_the_base_run() {
        let inputs = build_inputs(sample_cli()).expect("valid inputs");
        let response = build_sensitivity_response(&inputs, &DEFAULT_RETURN_DELTAS);

        assert_eq!(response.scenarios.len(), 3);
        let base = &response.scenarios[1];
        assert_eq!(base.label, "base");
        assert_approx(base.delta_vs_base, 0.0);
        assert_approx(base.final_capital, response.base_final_capital);
        for scenario in &response.scenarios {
            assert_approx(
                scenario.gain,
                scenario.final_capital - response.total_invested,
            );
        }
        assert!(response.scenarios[0].delta_vs_base < 0.0);
        assert!(response.scenarios[2].delta_vs_base > 0.0);
    }

    #[test]
    fn compare_request_defaults_to_the_stock_instrument_set() {
        let request = compare_request_from_payload(ComparePayload::default())
            .expect("valid request");

        assert_eq!(request.instruments.len(), 4);
        assert!(request.instruments[0].name.contains("SPY"));
        assert!(request.instruments[3].name.contains("SCHD"));
    }

    #[test]
    fn compare_request_from_json_skips_inactive_instruments() {
        let json = r#"{
          "horizonMonths": 24,
          "instruments": [
            {"name": "AAA", "annualReturnRate": 7, "annualDividendRate": 1},
            {"name": "BBB", "annualReturnRate": 9, "annualDividendRate": 2, "active": false}
          ]
        }"#;
        let request = compare_request_from_json(json).expect("json should parse");

        assert_eq!(request.inputs.horizon_months, 24);
        assert_eq!(request.instruments.len(), 1);
        assert_eq!(request.instruments[0].name, "AAA");
    }

    #[test]
    fn compare_request_rejects_an_all_inactive_list() {
        let json = r#"{
          "instruments": [
            {"name": "AAA", "annualReturnRate": 7, "annualDividendRate": 1, "active": false}
          ]
        }"#;
        let err = compare_request_from_json(json).expect_err("must reject no active instruments");
        assert!(err.contains("active instrument"));
    }

    #[test]
    fn compare_request_rejects_a_negative_instrument_rate() {
        let json = r#"{
          "instruments": [
            {"name": "AAA", "annualReturnRate": -7, "annualDividendRate": 1}
          ]
        }"#;
        let err = compare_request_from_json(json).expect_err("must reject negative rates");
        assert!(err.contains("AAA"));
    }

    #[test]
    fn compare_response_series_covers_the_whole_horizon() {
        let request = compare_request_from_payload(ComparePayload::default())
            .expect("valid request");
        let response = build_compare_response(&request.inputs, &request.instruments);

        assert_approx(response.total_invested, 10_000.0 + 500.0 * 60.0);
        assert_eq!(response.instruments.len(), 4);
        for entry in &response.instruments {
            assert_eq!(entry.closing_capitals.len(), 60);
            assert_approx(
                entry.gain,
                entry.final_capital - response.total_invested,
            );
            assert_approx(
                entry.final_capital,
                *entry.closing_capitals.last().expect("series is non-empty"),
            );
        }
    }
}
