use std::ops::Deref;

use serde::Serialize;

use super::error::SimulationError;

/// Upper bound for both the mortgage term and the simulation horizon (100 years).
pub const MAX_MONTHS: u32 = 1200;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    Real,
    Nominal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inputs {
    pub home_price: f64,
    pub down_payment_fraction: f64,
    pub mortgage_rate: f64,
    pub mortgage_term_months: u32,
    pub appreciation_rate: f64,
    pub property_tax_rate: f64,
    pub insurance_rate: f64,
    pub maintenance_rate: f64,
    pub buyer_closing_cost_fraction: f64,
    pub seller_closing_cost_fraction: f64,
    pub starting_rent: f64,
    pub rent_growth_rate: f64,
    pub investment_return_rate: f64,
    pub inflation_rate: f64,
    pub horizon_months: u32,
    pub report_mode: ReportMode,
}

impl Inputs {
    pub fn down_payment(&self) -> f64 {
        self.home_price * self.down_payment_fraction
    }

    pub fn buyer_closing_cost(&self) -> f64 {
        self.home_price * self.buyer_closing_cost_fraction
    }

    pub fn loan_principal(&self) -> f64 {
        self.home_price - self.down_payment()
    }

    /// Cash the buyer needs on day one; the renter invests this instead.
    pub fn upfront_cash(&self) -> f64 {
        self.down_payment() + self.buyer_closing_cost()
    }
}

/// Validated, immutable parameter bundle. Only obtainable through [`ParameterSet::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    inputs: Inputs,
}

impl ParameterSet {
    pub fn new(inputs: Inputs) -> Result<Self, SimulationError> {
        validate_inputs(&inputs)?;
        Ok(Self { inputs })
    }

    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    pub fn monthly_rates(&self) -> MonthlyRates {
        MonthlyRates::from_inputs(&self.inputs)
    }
}

impl Deref for ParameterSet {
    type Target = Inputs;

    fn deref(&self) -> &Inputs {
        &self.inputs
    }
}

fn validate_inputs(inputs: &Inputs) -> Result<(), SimulationError> {
    for (field, value) in [
        ("home_price", inputs.home_price),
        ("down_payment_fraction", inputs.down_payment_fraction),
        ("mortgage_rate", inputs.mortgage_rate),
        ("appreciation_rate", inputs.appreciation_rate),
        ("property_tax_rate", inputs.property_tax_rate),
        ("insurance_rate", inputs.insurance_rate),
        ("maintenance_rate", inputs.maintenance_rate),
        (
            "buyer_closing_cost_fraction",
            inputs.buyer_closing_cost_fraction,
        ),
        (
            "seller_closing_cost_fraction",
            inputs.seller_closing_cost_fraction,
        ),
        ("starting_rent", inputs.starting_rent),
        ("rent_growth_rate", inputs.rent_growth_rate),
        ("investment_return_rate", inputs.investment_return_rate),
        ("inflation_rate", inputs.inflation_rate),
    ] {
        if !value.is_finite() {
            return Err(SimulationError::invalid(field, "must be a finite number"));
        }
    }

    if inputs.home_price <= 0.0 {
        return Err(SimulationError::invalid("home_price", "must be > 0"));
    }
    if !(0.0..=1.0).contains(&inputs.down_payment_fraction) {
        return Err(SimulationError::invalid(
            "down_payment_fraction",
            "must be between 0 and 1",
        ));
    }
    if inputs.mortgage_rate < 0.0 {
        return Err(SimulationError::invalid("mortgage_rate", "must be >= 0"));
    }
    if inputs.mortgage_term_months == 0 || inputs.mortgage_term_months > MAX_MONTHS {
        return Err(SimulationError::invalid(
            "mortgage_term_months",
            format!("must be between 1 and {MAX_MONTHS}"),
        ));
    }
    if inputs.horizon_months == 0 || inputs.horizon_months > MAX_MONTHS {
        return Err(SimulationError::invalid(
            "horizon_months",
            format!("must be between 1 and {MAX_MONTHS}"),
        ));
    }

    for (field, rate) in [
        ("appreciation_rate", inputs.appreciation_rate),
        ("rent_growth_rate", inputs.rent_growth_rate),
        ("inflation_rate", inputs.inflation_rate),
    ] {
        if rate <= -1.0 {
            return Err(SimulationError::invalid(field, "must be > -100%"));
        }
    }
    if inputs.investment_return_rate / 12.0 <= -1.0 {
        return Err(SimulationError::invalid(
            "investment_return_rate",
            "monthly return must be > -100%",
        ));
    }

    for (field, rate) in [
        ("property_tax_rate", inputs.property_tax_rate),
        ("insurance_rate", inputs.insurance_rate),
        ("maintenance_rate", inputs.maintenance_rate),
    ] {
        if rate < 0.0 {
            return Err(SimulationError::invalid(field, "must be >= 0"));
        }
    }

    for (field, fraction) in [
        (
            "buyer_closing_cost_fraction",
            inputs.buyer_closing_cost_fraction,
        ),
        (
            "seller_closing_cost_fraction",
            inputs.seller_closing_cost_fraction,
        ),
    ] {
        if !(0.0..1.0).contains(&fraction) {
            return Err(SimulationError::invalid(field, "must be >= 0 and < 1"));
        }
    }

    if inputs.starting_rent < 0.0 {
        return Err(SimulationError::invalid("starting_rent", "must be >= 0"));
    }

    Ok(())
}

/// Per-month rates derived from the annual inputs.
///
/// Mortgage and investment rates follow the usual `annual / 12` convention.
/// Appreciation, rent growth and inflation are converted geometrically so that
/// twelve monthly steps compound to exactly one year at the annual rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyRates {
    pub mortgage: f64,
    pub investment_return: f64,
    pub appreciation: f64,
    pub rent_growth: f64,
    pub inflation: f64,
}

impl MonthlyRates {
    pub fn from_inputs(inputs: &Inputs) -> Self {
        Self {
            mortgage: inputs.mortgage_rate / 12.0,
            investment_return: inputs.investment_return_rate / 12.0,
            appreciation: geometric_monthly(inputs.appreciation_rate),
            rent_growth: geometric_monthly(inputs.rent_growth_rate),
            inflation: geometric_monthly(inputs.inflation_rate),
        }
    }
}

fn geometric_monthly(annual: f64) -> f64 {
    (1.0 + annual).powf(1.0 / 12.0) - 1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationEntry {
    pub month: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub balance: f64,
}

/// Running totals for one simulated month. All figures are nominal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyState {
    pub month: u32,
    pub home_value: f64,
    pub mortgage_balance: f64,
    pub monthly_rent: f64,
    pub owner_cost: f64,
    pub owner_equity: f64,
    pub owner_fund: f64,
    pub renter_portfolio: f64,
    pub cumulative_owner_outflow: f64,
    pub cumulative_owner_unrecoverable: f64,
    pub cumulative_interest: f64,
    pub cumulative_rent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum BreakEvenResult {
    #[serde(rename_all = "camelCase")]
    Reached {
        month: u32,
        owner_wealth: f64,
        renter_wealth: f64,
    },
    #[serde(rename_all = "camelCase")]
    NotReached {
        final_month: u32,
        owner_wealth: f64,
        renter_wealth: f64,
    },
}

impl BreakEvenResult {
    pub fn break_even_month(&self) -> Option<u32> {
        match self {
            BreakEvenResult::Reached { month, .. } => Some(*month),
            BreakEvenResult::NotReached { .. } => None,
        }
    }

    pub fn is_reached(&self) -> bool {
        self.break_even_month().is_some()
    }

    pub fn owner_wealth(&self) -> f64 {
        match self {
            BreakEvenResult::Reached { owner_wealth, .. }
            | BreakEvenResult::NotReached { owner_wealth, .. } => *owner_wealth,
        }
    }

    pub fn renter_wealth(&self) -> f64 {
        match self {
            BreakEvenResult::Reached { renter_wealth, .. }
            | BreakEvenResult::NotReached { renter_wealth, .. } => *renter_wealth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub month: u32,
    pub year: f64,
    pub mortgage_balance: f64,
    pub home_value: f64,
    pub owner_cost: f64,
    pub rent: f64,
    pub owner_wealth: f64,
    pub renter_wealth: f64,
    /// Running totals since month 0, always nominal.
    pub owner_outflow: f64,
    pub owner_unrecoverable: f64,
    pub interest_paid: f64,
    pub rent_paid: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationTrace {
    pub result: BreakEvenResult,
    pub report_mode: ReportMode,
    pub monthly_payment: f64,
    pub upfront_cash: f64,
    pub buyer_closing_cost: f64,
    pub checkpoints: Vec<Checkpoint>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_inputs() -> Inputs {
        Inputs {
            home_price: 400_000.0,
            down_payment_fraction: 0.20,
            mortgage_rate: 0.06,
            mortgage_term_months: 360,
            appreciation_rate: 0.03,
            property_tax_rate: 0.012,
            insurance_rate: 0.004,
            maintenance_rate: 0.01,
            buyer_closing_cost_fraction: 0.0,
            seller_closing_cost_fraction: 0.0,
            starting_rent: 2_000.0,
            rent_growth_rate: 0.03,
            investment_return_rate: 0.07,
            inflation_rate: 0.025,
            horizon_months: 360,
            report_mode: ReportMode::Nominal,
        }
    }

    fn rejected_field(inputs: Inputs) -> &'static str {
        ParameterSet::new(inputs)
            .expect_err("inputs must be rejected")
            .field()
            .expect("parameter errors name a field")
    }

    #[test]
    fn sample_inputs_are_valid() {
        let params = ParameterSet::new(sample_inputs()).expect("valid inputs");
        assert_eq!(params.home_price, 400_000.0);
        assert_eq!(params.loan_principal(), 320_000.0);
        assert_eq!(params.upfront_cash(), 80_000.0);
    }

    #[test]
    fn rejects_zero_home_price() {
        let mut inputs = sample_inputs();
        inputs.home_price = 0.0;
        assert_eq!(rejected_field(inputs), "home_price");
    }

    #[test]
    fn rejects_non_finite_rates() {
        let mut inputs = sample_inputs();
        inputs.investment_return_rate = f64::NAN;
        assert_eq!(rejected_field(inputs), "investment_return_rate");

        let mut inputs = sample_inputs();
        inputs.inflation_rate = f64::INFINITY;
        assert_eq!(rejected_field(inputs), "inflation_rate");
    }

    #[test]
    fn rejects_zero_term_and_horizon() {
        let mut inputs = sample_inputs();
        inputs.mortgage_term_months = 0;
        assert_eq!(rejected_field(inputs), "mortgage_term_months");

        let mut inputs = sample_inputs();
        inputs.horizon_months = 0;
        assert_eq!(rejected_field(inputs), "horizon_months");

        let mut inputs = sample_inputs();
        inputs.horizon_months = MAX_MONTHS + 1;
        assert_eq!(rejected_field(inputs), "horizon_months");
    }

    #[test]
    fn rejects_down_payment_above_price() {
        let mut inputs = sample_inputs();
        inputs.down_payment_fraction = 1.01;
        assert_eq!(rejected_field(inputs), "down_payment_fraction");

        let mut inputs = sample_inputs();
        inputs.down_payment_fraction = -0.1;
        assert_eq!(rejected_field(inputs), "down_payment_fraction");
    }

    #[test]
    fn accepts_all_cash_purchase_and_zero_down() {
        let mut inputs = sample_inputs();
        inputs.down_payment_fraction = 1.0;
        assert!(ParameterSet::new(inputs).is_ok());

        let mut inputs = sample_inputs();
        inputs.down_payment_fraction = 0.0;
        assert!(ParameterSet::new(inputs).is_ok());
    }

    #[test]
    fn rejects_negative_mortgage_rate_and_cost_rates() {
        let mut inputs = sample_inputs();
        inputs.mortgage_rate = -0.01;
        assert_eq!(rejected_field(inputs), "mortgage_rate");

        let mut inputs = sample_inputs();
        inputs.maintenance_rate = -0.01;
        assert_eq!(rejected_field(inputs), "maintenance_rate");
    }

    #[test]
    fn rejects_closing_costs_outside_unit_interval() {
        let mut inputs = sample_inputs();
        inputs.buyer_closing_cost_fraction = 1.0;
        assert_eq!(rejected_field(inputs), "buyer_closing_cost_fraction");

        let mut inputs = sample_inputs();
        inputs.seller_closing_cost_fraction = -0.02;
        assert_eq!(rejected_field(inputs), "seller_closing_cost_fraction");
    }

    #[test]
    fn rejects_growth_rates_at_or_below_minus_one() {
        let mut inputs = sample_inputs();
        inputs.appreciation_rate = -1.0;
        assert_eq!(rejected_field(inputs), "appreciation_rate");

        let mut inputs = sample_inputs();
        inputs.investment_return_rate = -12.0;
        assert_eq!(rejected_field(inputs), "investment_return_rate");
    }

    #[test]
    fn geometric_rates_compound_to_annual_rate() {
        let rates = MonthlyRates::from_inputs(&sample_inputs());
        let yearly = (1.0 + rates.appreciation).powi(12) - 1.0;
        assert!((yearly - 0.03).abs() < 1e-12);
        assert!((rates.mortgage - 0.005).abs() < 1e-15);
        assert!((rates.investment_return - 0.07 / 12.0).abs() < 1e-15);
    }

    #[test]
    fn break_even_result_serializes_with_outcome_tag() {
        let reached = BreakEvenResult::Reached {
            month: 12,
            owner_wealth: 2.0,
            renter_wealth: 1.0,
        };
        let json = serde_json::to_string(&reached).expect("serializes");
        assert!(json.contains("\"outcome\":\"reached\""));
        assert!(json.contains("\"ownerWealth\""));

        let missed = BreakEvenResult::NotReached {
            final_month: 24,
            owner_wealth: 1.0,
            renter_wealth: 2.0,
        };
        let json = serde_json::to_string(&missed).expect("serializes");
        assert!(json.contains("\"outcome\":\"notReached\""));
        assert!(json.contains("\"finalMonth\":24"));
        assert_eq!(missed.break_even_month(), None);
    }
}
