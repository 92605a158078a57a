use std::fmt::Write;

use super::SimulateResponse;
use crate::core::{BreakEvenResult, Checkpoint, ReportMode};

fn dollars_label(mode: ReportMode) -> &'static str {
    match mode {
        ReportMode::Real => "real (inflation-adjusted)",
        ReportMode::Nominal => "nominal",
    }
}

/// `1234567.891` -> `$1,234,567.89`; negatives keep their sign in front.
pub fn format_money(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// One-line verdict shared by the CLI report and the web page.
pub(super) fn headline(response: &SimulateResponse) -> String {
    let dollars = dollars_label(response.report_mode);
    match response.break_even {
        BreakEvenResult::Reached { month, .. } => format!(
            "Break-even at month {month} (~{:.2} years), compared in {dollars} dollars.",
            month as f64 / 12.0
        ),
        BreakEvenResult::NotReached {
            final_month,
            owner_wealth,
            renter_wealth,
        } => format!(
            "No break-even within {final_month} months ({:.2} years); renter still ahead by {} in {dollars} dollars.",
            final_month as f64 / 12.0,
            format_money(renter_wealth - owner_wealth)
        ),
    }
}

/// Cumulative cash paid by each side up to a checkpoint, in nominal dollars.
pub(super) fn totals_line(c: &Checkpoint) -> String {
    format!(
        "Through month {}: owner paid {} ({} unrecoverable, {} interest); renter paid {} in rent.",
        c.month,
        format_money(c.owner_outflow),
        format_money(c.owner_unrecoverable),
        format_money(c.interest_paid),
        format_money(c.rent_paid)
    )
}

pub fn format_text(response: &SimulateResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", headline(response));
    let _ = writeln!(
        out,
        "  Owner wealth:  {:>16}",
        format_money(response.break_even.owner_wealth())
    );
    let _ = writeln!(
        out,
        "  Renter wealth: {:>16}",
        format_money(response.break_even.renter_wealth())
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Monthly mortgage payment: {}",
        format_money(response.monthly_payment)
    );
    let _ = writeln!(
        out,
        "Upfront cash invested by the renter: {} (includes {} buyer closing costs)",
        format_money(response.upfront_cash),
        format_money(response.buyer_closing_cost)
    );

    if !response.checkpoints.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:>5} {:>6} {:>15} {:>15} {:>11} {:>11} {:>15} {:>15}",
            "Month", "Year", "Balance", "Home value", "Owner cost", "Rent", "Owner wealth",
            "Renter wealth"
        );
        for c in &response.checkpoints {
            let _ = writeln!(
                out,
                "{:>5} {:>6.2} {:>15} {:>15} {:>11} {:>11} {:>15} {:>15}",
                c.month,
                c.year,
                format_money(c.mortgage_balance),
                format_money(c.home_value),
                format_money(c.owner_cost),
                format_money(c.rent),
                format_money(c.owner_wealth),
                format_money(c.renter_wealth)
            );
        }
        if let Some(last) = response.checkpoints.last() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", totals_line(last));
        }
    }

    if let Some(solve) = &response.rent_solve {
        let _ = writeln!(out);
        match solve.solved_rent {
            Some(rent) => {
                let _ = writeln!(
                    out,
                    "Lowest starting rent breaking even by month {}: {}/month ({})",
                    solve.target_month,
                    format_money(rent),
                    solve.message
                );
            }
            None => {
                let _ = writeln!(out, "Rent solve for month {}: {}", solve.target_month, solve.message);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(break_even: BreakEvenResult) -> SimulateResponse {
        let break_even_month = break_even.break_even_month();
        SimulateResponse {
            report_mode: ReportMode::Nominal,
            break_even,
            break_even_month,
            break_even_years: break_even_month.map(|m| m as f64 / 12.0),
            horizon_months: 360,
            monthly_payment: 1_918.56,
            upfront_cash: 88_000.0,
            buyer_closing_cost: 8_000.0,
            checkpoints: vec![Checkpoint {
                month: 0,
                year: 0.0,
                mortgage_balance: 320_000.0,
                home_value: 400_000.0,
                owner_cost: 0.0,
                rent: 2_000.0,
                owner_wealth: 56_000.0,
                renter_wealth: 88_000.0,
                owner_outflow: 0.0,
                owner_unrecoverable: 0.0,
                interest_paid: 0.0,
                rent_paid: 0.0,
            }],
            rent_solve: None,
        }
    }

    #[test]
    fn money_is_grouped_and_rounded_to_cents() {
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(999.999), "$1,000.00");
        assert_eq!(format_money(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_money(-42_000.5), "-$42,000.50");
        assert_eq!(format_money(-0.001), "$0.00");
    }

    #[test]
    fn reached_report_states_month_and_years() {
        let text = format_text(&response(BreakEvenResult::Reached {
            month: 67,
            owner_wealth: 148_748.06,
            renter_wealth: 148_641.06,
        }));
        assert!(text.starts_with("Break-even at month 67 (~5.58 years), compared in nominal dollars."));
        assert!(text.contains("$148,748.06"));
        assert!(text.contains("$1,918.56"));
        assert!(text.contains("Renter wealth"));
    }

    #[test]
    fn not_reached_report_states_the_gap() {
        let text = format_text(&response(BreakEvenResult::NotReached {
            final_month: 360,
            owner_wealth: 900_000.0,
            renter_wealth: 1_000_000.0,
        }));
        assert!(text.starts_with("No break-even within 360 months (30.00 years)"));
        assert!(text.contains("renter still ahead by $100,000.00"));
    }

    #[test]
    fn totals_line_reports_cumulative_cash() {
        let mut summary = response(BreakEvenResult::NotReached {
            final_month: 24,
            owner_wealth: 1.0,
            renter_wealth: 2.0,
        });
        let last = &mut summary.checkpoints[0];
        last.month = 24;
        last.owner_outflow = 66_000.0;
        last.owner_unrecoverable = 58_000.5;
        last.interest_paid = 38_000.0;
        last.rent_paid = 49_400.25;
        let text = format_text(&summary);
        assert!(text.contains(
            "Through month 24: owner paid $66,000.00 ($58,000.50 unrecoverable, $38,000.00 interest); renter paid $49,400.25 in rent."
        ));
    }
}
