mod amortization;
mod engine;
mod error;
mod solver;
mod types;

pub use amortization::{amortization_schedule, monthly_payment};
pub use engine::{
    DollarAdjuster, StepContext, WealthComparison, initial_state, run_simulation,
    run_simulation_trace, simulate, step_month,
};
pub use error::SimulationError;
pub use solver::{RentSolveConfig, RentSolveIteration, RentSolveResult, solve_break_even_rent};
pub use types::{
    AmortizationEntry, BreakEvenResult, Checkpoint, Inputs, MAX_MONTHS, MonthlyRates,
    MonthlyState, ParameterSet, ReportMode, SimulationTrace,
};
