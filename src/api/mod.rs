use std::net::SocketAddr;
use std::process::ExitCode;

use axum::{
    Router,
    extract::{Form, Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    BreakEvenResult, Checkpoint, Inputs, ParameterSet, RentSolveConfig,
    RentSolveResult, ReportMode, SimulationError, run_simulation_trace, solve_break_even_rent,
};

mod page;
mod report;

pub use report::{format_money, format_text};

const STYLES_CSS: &str = include_str!("../../web/styles.css");

const DEFAULT_DOWN_PAYMENT_PERCENT: f64 = 20.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliReportMode {
    Real,
    Nominal,
}

impl From<CliReportMode> for ReportMode {
    fn from(value: CliReportMode) -> Self {
        match value {
            CliReportMode::Real => ReportMode::Real,
            CliReportMode::Nominal => ReportMode::Nominal,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiReportMode {
    #[serde(alias = "Real", alias = "inflation-adjusted", alias = "inflationAdjusted")]
    Real,
    #[serde(alias = "Nominal")]
    Nominal,
}

impl From<ApiReportMode> for CliReportMode {
    fn from(value: ApiReportMode) -> Self {
        match value {
            ApiReportMode::Real => CliReportMode::Real,
            ApiReportMode::Nominal => CliReportMode::Nominal,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    home_price: Option<f64>,
    down_payment: Option<f64>,
    down_payment_percent: Option<f64>,
    mortgage_rate: Option<f64>,
    term_months: Option<u32>,
    appreciation_rate: Option<f64>,
    property_tax_rate: Option<f64>,
    insurance_rate: Option<f64>,
    maintenance_rate: Option<f64>,
    buy_closing_cost: Option<f64>,
    sell_closing_cost: Option<f64>,
    rent: Option<f64>,
    rent_growth_rate: Option<f64>,
    investment_return: Option<f64>,
    inflation_rate: Option<f64>,
    horizon_months: Option<u32>,
    report_mode: Option<ApiReportMode>,
    target_month: Option<u32>,
}

#[derive(Parser, Debug)]
#[command(
    name = "breakeven",
    about = "Rent vs buy: find the month where owning catches up with renting and investing",
    after_help = "Run `breakeven serve [port]` to start the web form instead."
)]
struct Cli {
    #[arg(long, default_value_t = 400_000.0, help = "Purchase price in dollars")]
    home_price: f64,
    #[arg(
        long,
        conflicts_with = "down_payment_percent",
        help = "Down payment in dollars"
    )]
    down_payment: Option<f64>,
    #[arg(long, help = "Down payment as percent of price [default: 20]")]
    down_payment_percent: Option<f64>,
    #[arg(long, default_value_t = 6.0, help = "Fixed annual mortgage rate in percent")]
    mortgage_rate: f64,
    #[arg(long, default_value_t = 360, help = "Mortgage term in months")]
    term_months: u32,
    #[arg(long, default_value_t = 3.0, help = "Annual home appreciation in percent")]
    appreciation_rate: f64,
    #[arg(
        long,
        default_value_t = 1.2,
        help = "Annual property tax in percent of home value"
    )]
    property_tax_rate: f64,
    #[arg(
        long,
        default_value_t = 0.4,
        help = "Annual insurance in percent of home value"
    )]
    insurance_rate: f64,
    #[arg(
        long,
        default_value_t = 1.0,
        help = "Annual maintenance in percent of home value"
    )]
    maintenance_rate: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Buyer closing costs in percent of price"
    )]
    buy_closing_cost: f64,
    #[arg(
        long,
        default_value_t = 6.0,
        help = "Seller closing costs in percent of home value, applied to a hypothetical sale"
    )]
    sell_closing_cost: f64,
    #[arg(long, default_value_t = 2_000.0, help = "Starting monthly rent in dollars")]
    rent: f64,
    #[arg(long, default_value_t = 3.0, help = "Annual rent growth in percent")]
    rent_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Annual investment return in percent, for both renter and owner funds"
    )]
    investment_return: f64,
    #[arg(long, default_value_t = 2.5, help = "Annual inflation in percent")]
    inflation_rate: f64,
    #[arg(long, default_value_t = 360, help = "Simulation horizon in months")]
    horizon_months: u32,
    #[arg(
        long,
        value_enum,
        default_value_t = CliReportMode::Real,
        help = "Compare in real (inflation-adjusted) or nominal dollars"
    )]
    report_mode: CliReportMode,
    #[arg(
        long,
        help = "Also solve for the lowest starting rent that breaks even by this month"
    )]
    solve_rent_for_month: Option<u32>,
    #[arg(long, help = "Print the result as JSON")]
    json: bool,
}

#[derive(Debug)]
struct ApiRequest {
    params: ParameterSet,
    target_month: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RentSolveResponse {
    target_month: u32,
    feasible: bool,
    converged: bool,
    solved_rent: Option<f64>,
    achieved_break_even_month: Option<u32>,
    iterations: usize,
    message: String,
}

impl From<RentSolveResult> for RentSolveResponse {
    fn from(value: RentSolveResult) -> Self {
        Self {
            target_month: value.target_month,
            feasible: value.feasible,
            converged: value.converged,
            solved_rent: value.solved_rent,
            achieved_break_even_month: value.achieved_break_even_month,
            iterations: value.iterations.len(),
            message: value.message,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    report_mode: ReportMode,
    break_even: BreakEvenResult,
    break_even_month: Option<u32>,
    break_even_years: Option<f64>,
    horizon_months: u32,
    monthly_payment: f64,
    upfront_cash: f64,
    buyer_closing_cost: f64,
    checkpoints: Vec<Checkpoint>,
    rent_solve: Option<RentSolveResponse>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: &Cli) -> Result<Inputs, String> {
    if !cli.home_price.is_finite() || cli.home_price <= 0.0 {
        return Err("--home-price must be > 0".to_string());
    }

    let down_payment_fraction = match (cli.down_payment, cli.down_payment_percent) {
        (Some(_), Some(_)) => {
            return Err("use either --down-payment or --down-payment-percent, not both".to_string());
        }
        (Some(amount), None) => {
            if !amount.is_finite() || amount < 0.0 {
                return Err("--down-payment must be >= 0".to_string());
            }
            if amount > cli.home_price {
                return Err("--down-payment cannot exceed --home-price".to_string());
            }
            amount / cli.home_price
        }
        (None, percent) => {
            let percent = percent.unwrap_or(DEFAULT_DOWN_PAYMENT_PERCENT);
            if !(0.0..=100.0).contains(&percent) {
                return Err("--down-payment-percent must be between 0 and 100".to_string());
            }
            percent / 100.0
        }
    };

    for (name, pct) in [
        ("--buy-closing-cost", cli.buy_closing_cost),
        ("--sell-closing-cost", cli.sell_closing_cost),
    ] {
        if !(0.0..100.0).contains(&pct) {
            return Err(format!("{name} must be >= 0 and < 100"));
        }
    }

    Ok(Inputs {
        home_price: cli.home_price,
        down_payment_fraction,
        mortgage_rate: cli.mortgage_rate / 100.0,
        mortgage_term_months: cli.term_months,
        appreciation_rate: cli.appreciation_rate / 100.0,
        property_tax_rate: cli.property_tax_rate / 100.0,
        insurance_rate: cli.insurance_rate / 100.0,
        maintenance_rate: cli.maintenance_rate / 100.0,
        buyer_closing_cost_fraction: cli.buy_closing_cost / 100.0,
        seller_closing_cost_fraction: cli.sell_closing_cost / 100.0,
        starting_rent: cli.rent,
        rent_growth_rate: cli.rent_growth_rate / 100.0,
        investment_return_rate: cli.investment_return / 100.0,
        inflation_rate: cli.inflation_rate / 100.0,
        horizon_months: cli.horizon_months,
        report_mode: cli.report_mode.into(),
    })
}

fn flag_for_field(field: &str) -> &'static str {
    match field {
        "home_price" => "--home-price",
        "down_payment_fraction" => "--down-payment-percent",
        "mortgage_rate" => "--mortgage-rate",
        "mortgage_term_months" => "--term-months",
        "appreciation_rate" => "--appreciation-rate",
        "property_tax_rate" => "--property-tax-rate",
        "insurance_rate" => "--insurance-rate",
        "maintenance_rate" => "--maintenance-rate",
        "buyer_closing_cost_fraction" => "--buy-closing-cost",
        "seller_closing_cost_fraction" => "--sell-closing-cost",
        "starting_rent" => "--rent",
        "rent_growth_rate" => "--rent-growth-rate",
        "investment_return_rate" => "--investment-return",
        "inflation_rate" => "--inflation-rate",
        "horizon_months" => "--horizon-months",
        "target_month" => "--solve-rent-for-month",
        _ => "input",
    }
}

fn describe_error(err: SimulationError) -> String {
    match err {
        SimulationError::InvalidParameter { field, message } => {
            format!("{} {message}", flag_for_field(field))
        }
        other => other.to_string(),
    }
}

fn api_request_from_cli(cli: &Cli) -> Result<ApiRequest, String> {
    let inputs = build_inputs(cli)?;
    let params = ParameterSet::new(inputs).map_err(describe_error)?;
    if let Some(target) = cli.solve_rent_for_month {
        if target > params.horizon_months {
            return Err("--solve-rent-for-month must be <= --horizon-months".to_string());
        }
    }
    Ok(ApiRequest {
        params,
        target_month: cli.solve_rent_for_month,
    })
}

fn evaluate(request: &ApiRequest) -> Result<SimulateResponse, String> {
    let trace = run_simulation_trace(&request.params).map_err(describe_error)?;
    let rent_solve = match request.target_month {
        Some(target) => Some(
            solve_break_even_rent(request.params.inputs(), RentSolveConfig::for_target(target))
                .map_err(describe_error)?
                .into(),
        ),
        None => None,
    };

    let break_even_month = trace.result.break_even_month();
    Ok(SimulateResponse {
        report_mode: trace.report_mode,
        break_even: trace.result,
        break_even_month,
        break_even_years: break_even_month.map(|m| m as f64 / 12.0),
        horizon_months: request.params.horizon_months,
        monthly_payment: trace.monthly_payment,
        upfront_cash: trace.upfront_cash,
        buyer_closing_cost: trace.buyer_closing_cost,
        checkpoints: trace.checkpoints,
        rent_solve,
    })
}

/// Parses the command line, runs the simulation and prints the report.
pub fn run_cli() -> ExitCode {
    let cli = Cli::parse();
    let response = match api_request_from_cli(&cli).and_then(|request| evaluate(&request)) {
        Ok(response) => response,
        Err(msg) => {
            eprintln!("error: {msg}");
            eprintln!("Run with --help for usage.");
            return ExitCode::from(2);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&response) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: failed to serialize result: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", format_text(&response));
    }
    ExitCode::SUCCESS
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler).post(form_post_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "break-even web form listening");
    info!("local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(page::render_page(&form_defaults(), None)))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn form_post_handler(Form(fields): Form<Vec<(String, String)>>) -> Response {
    let outcome = payload_from_form(&fields)
        .and_then(api_request_from_payload)
        .and_then(|request| evaluate(&request));
    if let Err(msg) = &outcome {
        warn!(error = %msg, "form submission rejected");
    }

    let values = merge_form_values(form_defaults(), &fields);
    let html = page::render_page(&values, Some(outcome.as_ref().map_err(|e| e.as_str())));
    with_cache_control(Html(html))
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            warn!(error = %msg, "simulate request rejected");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    match evaluate(&request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => {
            warn!(error = %msg, "simulate request failed");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

/// Keys the form submits as whole numbers; everything else is a decimal.
const INTEGER_FORM_FIELDS: [&str; 3] = ["termMonths", "horizonMonths", "targetMonth"];

/// Turns urlencoded form pairs into the JSON payload shape. Blank fields are
/// treated as absent so the API defaults apply.
fn payload_from_form(fields: &[(String, String)]) -> Result<SimulatePayload, String> {
    let mut map = serde_json::Map::new();
    for (key, raw) in fields {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let value = if key == "reportMode" {
            serde_json::Value::String(raw.to_string())
        } else if INTEGER_FORM_FIELDS.contains(&key.as_str()) {
            let n = raw
                .parse::<u32>()
                .map_err(|_| format!("{key}: must be a whole number"))?;
            serde_json::Value::from(n)
        } else {
            let n = raw
                .parse::<f64>()
                .map_err(|_| format!("{key}: must be a number"))?;
            serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .ok_or_else(|| format!("{key}: must be a finite number"))?
        };
        map.insert(key.clone(), value);
    }
    serde_json::from_value(serde_json::Value::Object(map))
        .map_err(|e| format!("Invalid form submission: {e}"))
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.home_price {
        cli.home_price = v;
    }
    match (payload.down_payment, payload.down_payment_percent) {
        (Some(_), Some(_)) => {
            return Err("use either downPayment or downPaymentPercent, not both".to_string());
        }
        (Some(v), None) => {
            cli.down_payment = Some(v);
            cli.down_payment_percent = None;
        }
        (None, Some(v)) => {
            cli.down_payment = None;
            cli.down_payment_percent = Some(v);
        }
        (None, None) => {}
    }
    if let Some(v) = payload.mortgage_rate {
        cli.mortgage_rate = v;
    }
    if let Some(v) = payload.term_months {
        cli.term_months = v;
    }
    if let Some(v) = payload.appreciation_rate {
        cli.appreciation_rate = v;
    }
    if let Some(v) = payload.property_tax_rate {
        cli.property_tax_rate = v;
    }
    if let Some(v) = payload.insurance_rate {
        cli.insurance_rate = v;
    }
    if let Some(v) = payload.maintenance_rate {
        cli.maintenance_rate = v;
    }
    if let Some(v) = payload.buy_closing_cost {
        cli.buy_closing_cost = v;
    }
    if let Some(v) = payload.sell_closing_cost {
        cli.sell_closing_cost = v;
    }
    if let Some(v) = payload.rent {
        cli.rent = v;
    }
    if let Some(v) = payload.rent_growth_rate {
        cli.rent_growth_rate = v;
    }
    if let Some(v) = payload.investment_return {
        cli.investment_return = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }
    if let Some(v) = payload.horizon_months {
        cli.horizon_months = v;
    }
    if let Some(v) = payload.report_mode {
        cli.report_mode = v.into();
    }
    if let Some(v) = payload.target_month {
        cli.solve_rent_for_month = Some(v);
    }

    api_request_from_cli(&cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        home_price: 400_000.0,
        down_payment: None,
        down_payment_percent: Some(DEFAULT_DOWN_PAYMENT_PERCENT),
        mortgage_rate: 6.0,
        term_months: 360,
        appreciation_rate: 3.0,
        property_tax_rate: 1.2,
        insurance_rate: 0.4,
        maintenance_rate: 1.0,
        buy_closing_cost: 2.0,
        sell_closing_cost: 6.0,
        rent: 2_000.0,
        rent_growth_rate: 3.0,
        investment_return: 7.0,
        inflation_rate: 2.5,
        horizon_months: 360,
        report_mode: CliReportMode::Real,
        solve_rent_for_month: None,
        json: false,
    }
}

/// Form field values (as typed by the user) keyed by payload name.
type FormValues = Vec<(String, String)>;

fn form_defaults() -> FormValues {
    let cli = default_cli_for_api();
    let mode = match cli.report_mode {
        CliReportMode::Real => "real",
        CliReportMode::Nominal => "nominal",
    };
    [
        ("homePrice", cli.home_price.to_string()),
        ("downPayment", String::new()),
        // Both down payment fields start blank; build_inputs falls back to 20%.
        ("downPaymentPercent", String::new()),
        ("mortgageRate", cli.mortgage_rate.to_string()),
        ("termMonths", cli.term_months.to_string()),
        ("buyClosingCost", cli.buy_closing_cost.to_string()),
        ("sellClosingCost", cli.sell_closing_cost.to_string()),
        ("propertyTaxRate", cli.property_tax_rate.to_string()),
        ("insuranceRate", cli.insurance_rate.to_string()),
        ("maintenanceRate", cli.maintenance_rate.to_string()),
        ("appreciationRate", cli.appreciation_rate.to_string()),
        ("rent", cli.rent.to_string()),
        ("rentGrowthRate", cli.rent_growth_rate.to_string()),
        ("investmentReturn", cli.investment_return.to_string()),
        ("inflationRate", cli.inflation_rate.to_string()),
        ("horizonMonths", cli.horizon_months.to_string()),
        ("reportMode", mode.to_string()),
        ("targetMonth", String::new()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Submitted values win over defaults so a rejected form comes back as typed.
fn merge_form_values(mut values: FormValues, submitted: &[(String, String)]) -> FormValues {
    for (key, value) in submitted {
        if let Some(slot) = values.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value.clone();
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

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
    fn build_inputs_converts_percent_flags_to_fractions() {
        let inputs = build_inputs(&sample_cli()).expect("valid inputs");
        assert_approx(inputs.down_payment_fraction, 0.20);
        assert_approx(inputs.mortgage_rate, 0.06);
        assert_approx(inputs.property_tax_rate, 0.012);
        assert_approx(inputs.buyer_closing_cost_fraction, 0.02);
        assert_approx(inputs.seller_closing_cost_fraction, 0.06);
        assert_approx(inputs.investment_return_rate, 0.07);
        assert_eq!(inputs.report_mode, ReportMode::Real);
    }

    #[test]
    fn build_inputs_accepts_down_payment_in_dollars() {
        let mut cli = sample_cli();
        cli.down_payment = Some(100_000.0);
        cli.down_payment_percent = None;
        let inputs = build_inputs(&cli).expect("valid inputs");
        assert_approx(inputs.down_payment_fraction, 0.25);
    }

    #[test]
    fn build_inputs_defaults_down_payment_when_none_given() {
        let mut cli = sample_cli();
        cli.down_payment_percent = None;
        let inputs = build_inputs(&cli).expect("valid inputs");
        assert_approx(inputs.down_payment_fraction, 0.20);
    }

    #[test]
    fn build_inputs_rejects_down_payment_above_price() {
        let mut cli = sample_cli();
        cli.down_payment = Some(500_000.0);
        cli.down_payment_percent = None;
        let err = build_inputs(&cli).expect_err("must reject");
        assert!(err.contains("--down-payment"));
    }

    #[test]
    fn build_inputs_rejects_closing_cost_of_one_hundred_percent() {
        let mut cli = sample_cli();
        cli.sell_closing_cost = 100.0;
        let err = build_inputs(&cli).expect_err("must reject");
        assert!(err.contains("--sell-closing-cost"));
    }

    #[test]
    fn core_validation_errors_name_the_cli_flag() {
        let mut cli = sample_cli();
        cli.horizon_months = 0;
        let err = api_request_from_cli(&cli).expect_err("must reject");
        assert!(err.starts_with("--horizon-months"), "{err}");

        let mut cli = sample_cli();
        cli.maintenance_rate = -1.0;
        let err = api_request_from_cli(&cli).expect_err("must reject");
        assert!(err.starts_with("--maintenance-rate"), "{err}");
    }

    #[test]
    fn solve_target_beyond_horizon_is_rejected() {
        let mut cli = sample_cli();
        cli.horizon_months = 120;
        cli.solve_rent_for_month = Some(240);
        let err = api_request_from_cli(&cli).expect_err("must reject");
        assert!(err.contains("--solve-rent-for-month"));
    }

    #[test]
    fn api_request_from_json_parses_web_keys() {
        let json = r#"{
          "homePrice": 500000,
          "downPayment": 50000,
          "mortgageRate": 5.5,
          "termMonths": 180,
          "rent": 2600,
          "rentGrowthRate": 4,
          "investmentReturn": 6,
          "horizonMonths": 240,
          "reportMode": "nominal",
          "targetMonth": 120
        }"#;
        let request = api_request_from_json(json).expect("json should parse");
        let params = &request.params;
        assert_approx(params.home_price, 500_000.0);
        assert_approx(params.down_payment_fraction, 0.10);
        assert_approx(params.mortgage_rate, 0.055);
        assert_eq!(params.mortgage_term_months, 180);
        assert_approx(params.starting_rent, 2_600.0);
        assert_approx(params.rent_growth_rate, 0.04);
        assert_eq!(params.horizon_months, 240);
        assert_eq!(params.report_mode, ReportMode::Nominal);
        assert_eq!(request.target_month, Some(120));
    }

    #[test]
    fn api_request_rejects_both_down_payment_forms() {
        let json = r#"{"downPayment": 50000, "downPaymentPercent": 10}"#;
        let err = api_request_from_json(json).expect_err("must reject");
        assert!(err.contains("downPayment"));
    }

    #[test]
    fn form_fields_become_payload() {
        let fields = vec![
            ("homePrice".to_string(), "350000".to_string()),
            ("downPayment".to_string(), "".to_string()),
            ("downPaymentPercent".to_string(), " 10 ".to_string()),
            ("termMonths".to_string(), "240".to_string()),
            ("reportMode".to_string(), "nominal".to_string()),
            ("targetMonth".to_string(), "".to_string()),
        ];
        let payload = payload_from_form(&fields).expect("form should parse");
        let request = api_request_from_payload(payload).expect("valid request");
        assert_approx(request.params.home_price, 350_000.0);
        assert_approx(request.params.down_payment_fraction, 0.10);
        assert_eq!(request.params.mortgage_term_months, 240);
        assert_eq!(request.params.report_mode, ReportMode::Nominal);
        assert_eq!(request.target_month, None);
    }

    #[test]
    fn default_form_accepts_a_dollar_down_payment() {
        let submitted = vec![("downPayment".to_string(), "100000".to_string())];
        let fields = merge_form_values(form_defaults(), &submitted);
        let request = payload_from_form(&fields)
            .and_then(api_request_from_payload)
            .expect("dollar down payment should be accepted");
        assert_approx(request.params.down_payment_fraction, 0.25);
    }

    #[test]
    fn default_form_falls_back_to_twenty_percent_down() {
        let request = payload_from_form(&form_defaults())
            .and_then(api_request_from_payload)
            .expect("defaults should be accepted");
        assert_approx(request.params.down_payment_fraction, 0.20);

        let submitted = vec![("downPaymentPercent".to_string(), "35".to_string())];
        let fields = merge_form_values(form_defaults(), &submitted);
        let request = payload_from_form(&fields)
            .and_then(api_request_from_payload)
            .expect("percent down payment should be accepted");
        assert_approx(request.params.down_payment_fraction, 0.35);
    }

    #[test]
    fn form_rejects_non_numeric_values() {
        let fields = vec![("rent".to_string(), "lots".to_string())];
        let err = payload_from_form(&fields).expect_err("must reject");
        assert_eq!(err, "rent: must be a number");

        let fields = vec![("horizonMonths".to_string(), "12.5".to_string())];
        let err = payload_from_form(&fields).expect_err("must reject");
        assert_eq!(err, "horizonMonths: must be a whole number");
    }

    #[test]
    fn submitted_values_override_defaults() {
        let submitted = vec![("rent".to_string(), "abc".to_string())];
        let values = merge_form_values(form_defaults(), &submitted);
        let rent = values.iter().find(|(k, _)| k == "rent").map(|(_, v)| v.as_str());
        assert_eq!(rent, Some("abc"));
        assert_eq!(values.len(), form_defaults().len());
    }

    #[test]
    fn simulate_response_serialization_contains_expected_fields() {
        let mut cli = sample_cli();
        cli.horizon_months = 120;
        cli.solve_rent_for_month = Some(60);
        let request = api_request_from_cli(&cli).expect("valid request");
        let response = evaluate(&request).expect("simulation runs");
        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"reportMode\":\"real\""));
        assert!(json.contains("\"breakEven\""));
        assert!(json.contains("\"outcome\""));
        assert!(json.contains("\"checkpoints\""));
        assert!(json.contains("\"monthlyPayment\""));
        assert!(json.contains("\"rentSolve\""));
        assert!(json.contains("\"solvedRent\""));
    }

    #[test]
    fn evaluate_matches_core_for_default_scenario() {
        let request = api_request_from_cli(&sample_cli()).expect("valid request");
        let response = evaluate(&request).expect("simulation runs");
        let direct = crate::core::run_simulation(&request.params).expect("simulation runs");
        assert_eq!(response.break_even, direct);
        assert_eq!(response.break_even_month, direct.break_even_month());
        assert_eq!(response.horizon_months, 360);
        assert!(response.rent_solve.is_none());
    }
}
