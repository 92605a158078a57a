use tracing::{debug, trace};

use super::amortization::{amortization_schedule, monthly_payment};
use super::error::SimulationError;
use super::types::{
    AmortizationEntry, BreakEvenResult, Checkpoint, Inputs, MonthlyRates, MonthlyState,
    ParameterSet, ReportMode, SimulationTrace,
};

/// Everything a single month needs besides the previous state. Built once per run.
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    pub rates: MonthlyRates,
    pub starting_rent: f64,
    pub annual_carrying_rate: f64,
}

impl StepContext {
    pub fn new(params: &ParameterSet) -> Self {
        Self {
            rates: params.monthly_rates(),
            starting_rent: params.starting_rent,
            annual_carrying_rate: params.property_tax_rate
                + params.insurance_rate
                + params.maintenance_rate,
        }
    }
}

/// Converts nominal figures into the run's reporting convention.
#[derive(Debug, Clone, Copy)]
pub struct DollarAdjuster {
    mode: ReportMode,
    monthly_inflation: f64,
}

impl DollarAdjuster {
    pub fn new(mode: ReportMode, monthly_inflation: f64) -> Self {
        Self {
            mode,
            monthly_inflation,
        }
    }

    pub fn for_params(params: &ParameterSet) -> Self {
        Self::new(params.report_mode, params.monthly_rates().inflation)
    }

    pub fn adjust(&self, nominal: f64, month: u32) -> f64 {
        match self.mode {
            ReportMode::Nominal => nominal,
            ReportMode::Real => nominal / (1.0 + self.monthly_inflation).powi(month as i32),
        }
    }
}

pub fn initial_state(inputs: &Inputs) -> MonthlyState {
    let principal = inputs.loan_principal();
    MonthlyState {
        month: 0,
        home_value: inputs.home_price,
        mortgage_balance: principal,
        monthly_rent: inputs.starting_rent,
        owner_cost: 0.0,
        owner_equity: inputs.home_price - principal,
        owner_fund: 0.0,
        renter_portfolio: inputs.upfront_cash(),
        cumulative_owner_outflow: 0.0,
        cumulative_owner_unrecoverable: 0.0,
        cumulative_interest: 0.0,
        cumulative_rent: 0.0,
    }
}

/// Advances one month. `entry` is the amortization entry for the new month,
/// or `None` once the mortgage has been paid off.
pub fn step_month(
    ctx: &StepContext,
    prev: &MonthlyState,
    entry: Option<&AmortizationEntry>,
) -> MonthlyState {
    let month = prev.month + 1;

    let home_value = prev.home_value * (1.0 + ctx.rates.appreciation);

    let (payment, interest, principal_paid, balance) = match entry {
        Some(e) => (e.payment, e.interest, e.principal, e.balance),
        None => (0.0, 0.0, 0.0, 0.0),
    };
    let carrying = ctx.annual_carrying_rate * home_value / 12.0;
    let owner_cost = payment + carrying;

    let rent = if prev.month == 0 {
        ctx.starting_rent
    } else {
        prev.monthly_rent * (1.0 + ctx.rates.rent_growth)
    };

    // Whoever pays less this month invests the whole difference.
    let differential = rent - owner_cost;
    let (owner_contribution, renter_contribution) = if differential > 0.0 {
        (differential, 0.0)
    } else {
        (0.0, -differential)
    };

    let growth = 1.0 + ctx.rates.investment_return;
    let owner_fund = prev.owner_fund * growth + owner_contribution;
    let renter_portfolio = prev.renter_portfolio * growth + renter_contribution;

    MonthlyState {
        month,
        home_value,
        mortgage_balance: balance,
        monthly_rent: rent,
        owner_cost,
        owner_equity: home_value - balance,
        owner_fund,
        renter_portfolio,
        cumulative_owner_outflow: prev.cumulative_owner_outflow + owner_cost,
        cumulative_owner_unrecoverable: prev.cumulative_owner_unrecoverable + owner_cost
            - principal_paid,
        cumulative_interest: prev.cumulative_interest + interest,
        cumulative_rent: prev.cumulative_rent + rent,
    }
}

/// Both sides of the comparison for one month, already in reporting dollars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WealthComparison {
    pub owner_wealth: f64,
    pub renter_wealth: f64,
}

impl WealthComparison {
    pub fn owner_ahead(&self) -> bool {
        self.owner_wealth >= self.renter_wealth
    }
}

fn compare(
    state: &MonthlyState,
    seller_closing_cost_fraction: f64,
    adjuster: &DollarAdjuster,
) -> WealthComparison {
    let sale_cost = state.home_value * seller_closing_cost_fraction;
    let owner_nominal = state.owner_equity - sale_cost + state.owner_fund;
    WealthComparison {
        owner_wealth: adjuster.adjust(owner_nominal, state.month),
        renter_wealth: adjuster.adjust(state.renter_portfolio, state.month),
    }
}

/// Runs months `0..=horizon`, handing every month to `observe`, and stops at the
/// first month where the owner is at least as wealthy as the renter.
fn drive<F>(params: &ParameterSet, mut observe: F) -> Result<BreakEvenResult, SimulationError>
where
    F: FnMut(&MonthlyState, &WealthComparison, bool),
{
    let schedule = amortization_schedule(
        params.loan_principal(),
        params.mortgage_rate,
        params.mortgage_term_months,
    )?;
    let ctx = StepContext::new(params);
    let adjuster = DollarAdjuster::for_params(params);

    let mut state = initial_state(params);
    loop {
        let comparison = compare(&state, params.seller_closing_cost_fraction, &adjuster);
        let reached = comparison.owner_ahead();
        observe(&state, &comparison, reached);
        trace!(
            month = state.month,
            owner_wealth = comparison.owner_wealth,
            renter_wealth = comparison.renter_wealth,
            "month simulated"
        );

        if reached {
            debug!(
                month = state.month,
                owner_wealth = comparison.owner_wealth,
                renter_wealth = comparison.renter_wealth,
                "break-even reached"
            );
            return Ok(BreakEvenResult::Reached {
                month: state.month,
                owner_wealth: comparison.owner_wealth,
                renter_wealth: comparison.renter_wealth,
            });
        }
        if state.month >= params.horizon_months {
            debug!(
                horizon = params.horizon_months,
                gap = comparison.renter_wealth - comparison.owner_wealth,
                "break-even not reached within horizon"
            );
            return Ok(BreakEvenResult::NotReached {
                final_month: state.month,
                owner_wealth: comparison.owner_wealth,
                renter_wealth: comparison.renter_wealth,
            });
        }

        // Schedule entries are 1-based; entry for month m sits at index m - 1.
        let entry = schedule.get(state.month as usize);
        state = step_month(&ctx, &state, entry);
    }
}

pub fn run_simulation(params: &ParameterSet) -> Result<BreakEvenResult, SimulationError> {
    drive(params, |_, _, _| {})
}

/// Same loop as [`run_simulation`], also recording yearly checkpoints, the
/// break-even month and the final month.
pub fn run_simulation_trace(params: &ParameterSet) -> Result<SimulationTrace, SimulationError> {
    let horizon = params.horizon_months;
    let mut checkpoints = Vec::with_capacity(horizon as usize / 12 + 3);
    let result = drive(params, |state, comparison, reached| {
        if state.month % 12 == 0 || reached || state.month == horizon {
            checkpoints.push(Checkpoint {
                month: state.month,
                year: state.month as f64 / 12.0,
                mortgage_balance: state.mortgage_balance,
                home_value: state.home_value,
                owner_cost: state.owner_cost,
                rent: state.monthly_rent,
                owner_wealth: comparison.owner_wealth,
                renter_wealth: comparison.renter_wealth,
                owner_outflow: state.cumulative_owner_outflow,
                owner_unrecoverable: state.cumulative_owner_unrecoverable,
                interest_paid: state.cumulative_interest,
                rent_paid: state.cumulative_rent,
            });
        }
    })?;

    Ok(SimulationTrace {
        result,
        report_mode: params.report_mode,
        monthly_payment: monthly_payment(
            params.loan_principal(),
            params.mortgage_rate,
            params.mortgage_term_months,
        ),
        upfront_cash: params.upfront_cash(),
        buyer_closing_cost: params.buyer_closing_cost(),
        checkpoints,
    })
}

/// Validates raw inputs and runs them.
pub fn simulate(inputs: Inputs) -> Result<BreakEvenResult, SimulationError> {
    let params = ParameterSet::new(inputs)?;
    run_simulation(&params)
}
