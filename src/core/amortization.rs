use super::error::SimulationError;
use super::types::AmortizationEntry;

const ZERO_RATE_EPS: f64 = 1e-12;

/// Fixed monthly payment for a fully amortizing loan.
pub fn monthly_payment(principal: f64, annual_rate: f64, term_months: u32) -> f64 {
    if term_months == 0 {
        return 0.0;
    }
    let r = annual_rate / 12.0;
    let n = term_months as f64;
    if r.abs() < ZERO_RATE_EPS {
        return principal / n;
    }
    principal * r / (1.0 - (1.0 + r).powf(-n))
}

/// Month-by-month schedule for the whole term, `month` starting at 1.
///
/// The final entry's balance is forced to exactly zero so floating-point drift
/// never leaves a residual balance after the last payment.
pub fn amortization_schedule(
    principal: f64,
    annual_rate: f64,
    term_months: u32,
) -> Result<Vec<AmortizationEntry>, SimulationError> {
    if term_months == 0 || !principal.is_finite() || principal < 0.0 {
        return Err(SimulationError::InvalidTerm {
            term_months,
            principal,
        });
    }

    let r = annual_rate / 12.0;
    let payment = monthly_payment(principal, annual_rate, term_months);

    let mut schedule = Vec::with_capacity(term_months as usize);
    let mut balance = principal;
    for month in 1..=term_months {
        let interest = balance * r;
        let principal_part = payment - interest;
        balance = if month == term_months {
            0.0
        } else {
            (balance - principal_part).max(0.0)
        };
        schedule.push(AmortizationEntry {
            month,
            payment,
            interest,
            principal: principal_part,
            balance,
        });
    }
    Ok(schedule)
}
