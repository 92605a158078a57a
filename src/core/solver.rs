use tracing::debug;

use super::engine::run_simulation;
use super::error::SimulationError;
use super::types::{Inputs, ParameterSet};

#[derive(Debug, Clone, Copy)]
pub struct RentSolveConfig {
    pub target_month: u32,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl RentSolveConfig {
    pub fn for_target(target_month: u32) -> Self {
        Self {
            target_month,
            search_min: 0.0,
            search_max: 50_000.0,
            tolerance: 0.5,
            max_iterations: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RentSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_rent: f64,
    pub break_even_month: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RentSolveResult {
    pub target_month: u32,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub solved_rent: Option<f64>,
    pub achieved_break_even_month: Option<u32>,
    pub iterations: Vec<RentSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

/// Lowest starting rent at which owning breaks even no later than `target_month`.
///
/// Bisection is sound because a higher starting rent never delays break-even.
pub fn solve_break_even_rent(
    inputs: &Inputs,
    config: RentSolveConfig,
) -> Result<RentSolveResult, SimulationError> {
    validate_config(inputs, config)?;

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let low_eval = evaluate_candidate(inputs, config, config.search_min)?;
    let high_eval = evaluate_candidate(inputs, config, config.search_max)?;

    let mut solved_rent = None;
    let mut converged = false;
    let feasible;
    let message;

    if low_eval.meets_target {
        solved_rent = Some(config.search_min);
        converged = true;
        feasible = true;
        message = "Already breaks even by the target month at the lower rent bound.".to_string();
    } else if !high_eval.meets_target {
        feasible = false;
        message = "No rent within the search bounds breaks even by the target month.".to_string();
    } else {
        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            let eval = evaluate_candidate(inputs, config, mid)?;
            iterations.push(RentSolveIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_rent: mid,
                break_even_month: eval.break_even_month,
            });
            debug!(
                iteration = it,
                candidate_rent = mid,
                break_even_month = ?eval.break_even_month,
                "rent solver step"
            );

            if eval.meets_target {
                hi = mid;
            } else {
                lo = mid;
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                solved_rent = Some(hi);
                break;
            }
        }
        if solved_rent.is_none() {
            solved_rent = Some(hi);
        }
        feasible = true;
        message = if converged {
            "Solved break-even rent.".to_string()
        } else {
            "Reached max iterations before tolerance was met; returning best estimate.".to_string()
        };
    }

    let achieved_break_even_month = match solved_rent {
        Some(rent) => evaluate_candidate(inputs, config, rent)?.break_even_month,
        None => None,
    };

    Ok(RentSolveResult {
        target_month: config.target_month,
        search_min: config.search_min,
        search_max: config.search_max,
        tolerance: config.tolerance,
        max_iterations: config.max_iterations,
        solved_rent,
        achieved_break_even_month,
        iterations,
        converged,
        feasible,
        message,
    })
}

#[derive(Debug, Clone, Copy)]
struct CandidateEval {
    break_even_month: Option<u32>,
    meets_target: bool,
}

fn evaluate_candidate(
    base_inputs: &Inputs,
    config: RentSolveConfig,
    candidate_rent: f64,
) -> Result<CandidateEval, SimulationError> {
    let mut inputs = base_inputs.clone();
    inputs.starting_rent = candidate_rent.max(0.0);
    let params = ParameterSet::new(inputs)?;
    let break_even_month = run_simulation(&params)?.break_even_month();
    Ok(CandidateEval {
        break_even_month,
        meets_target: break_even_month.is_some_and(|m| m <= config.target_month),
    })
}

fn validate_config(inputs: &Inputs, config: RentSolveConfig) -> Result<(), SimulationError> {
    if config.target_month > inputs.horizon_months {
        return Err(SimulationError::invalid(
            "target_month",
            "must be <= horizon_months",
        ));
    }
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err(SimulationError::invalid(
            "search_bounds",
            "search bounds must be finite",
        ));
    }
    if config.search_min < 0.0 {
        return Err(SimulationError::invalid("search_min", "must be >= 0"));
    }
    if config.search_max <= config.search_min {
        return Err(SimulationError::invalid(
            "search_max",
            "must be greater than search_min",
        ));
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(SimulationError::invalid("tolerance", "must be > 0"));
    }
    if config.max_iterations == 0 {
        return Err(SimulationError::invalid("max_iterations", "must be > 0"));
    }
    Ok(())
}
