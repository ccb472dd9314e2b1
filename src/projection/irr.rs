//! Internal Rate of Return (IRR) and Net Present Value (NPV)
//!
//! Used to derive the saver's personal rate of return from the lifecycle
//! cash flows (contributions out, payouts and terminal value in).

use serde::{Deserialize, Serialize};

/// Periodic-rate bracket tried first
pub const INITIAL_BRACKET: (f64, f64) = (-0.02, 0.05);

/// Bracket tried once if the initial one does not straddle a root
pub const WIDENED_BRACKET: (f64, f64) = (-0.5, 1.0);

/// Upper bound on bisection steps
pub const MAX_ITERATIONS: u32 = 200;

/// Stop once the bracket half-width falls below this
pub const RATE_TOLERANCE: f64 = 1e-12;

/// Stop once |NPV| at the midpoint falls below this
pub const NPV_TOLERANCE: f64 = 1e-9;

/// A root of the NPV function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrrSolution {
    /// Rate per cash-flow period
    pub periodic_rate: f64,
    /// Effective annual rate
    pub annual_rate: f64,
    /// Bisection steps taken
    pub iterations: u32,
    /// NPV at the returned rate
    pub npv: f64,
}

/// NPV of `cashflows` at a periodic rate, first flow undiscounted
pub fn npv_at_rate(cashflows: &[f64], rate: f64) -> f64 {
    let factor = 1.0 / (1.0 + rate);
    let mut discount = 1.0;
    let mut npv = 0.0;
    for &cf in cashflows {
        npv += cf * discount;
        discount *= factor;
    }
    npv
}

/// NPV at an annual effective rate for flows with `periods_per_year` periods
pub fn npv_at_annual_rate(cashflows: &[f64], annual_rate: f64, periods_per_year: u32) -> f64 {
    npv_at_rate(cashflows, periodic_rate(annual_rate, periods_per_year))
}

/// Periodic rate equivalent to an annual effective rate
pub fn periodic_rate(annual_rate: f64, periods_per_year: u32) -> f64 {
    (1.0 + annual_rate).powf(1.0 / periods_per_year as f64) - 1.0
}

/// Annual effective rate equivalent to a periodic rate
pub fn annualize(periodic: f64, periods_per_year: u32) -> f64 {
    (1.0 + periodic).powi(periods_per_year as i32) - 1.0
}

fn brackets(npv_low: f64, npv_high: f64) -> bool {
    if !npv_low.is_finite() || !npv_high.is_finite() {
        return false;
    }
    npv_low == 0.0 || npv_high == 0.0 || npv_low.signum() != npv_high.signum()
}

/// Calculate the IRR of a series of cash flows by bisection.
///
/// # Arguments
/// * `cashflows` - Cash flows per period (positive = inflow, negative = outflow)
/// * `periods_per_year` - Number of periods per year (12 for monthly)
///
/// # Returns
/// * `Option<IrrSolution>` - `None` when fewer than two flows, no sign change,
///   or no root inside either bracket
pub fn calculate_irr(cashflows: &[f64], periods_per_year: u32) -> Option<IrrSolution> {
    if cashflows.len() < 2 {
        return None;
    }

    // A root needs at least one inflow and one outflow
    let has_positive = cashflows.iter().any(|&cf| cf > 0.0);
    let has_negative = cashflows.iter().any(|&cf| cf < 0.0);
    if !has_positive || !has_negative {
        return None;
    }

    let (mut low, mut high) = INITIAL_BRACKET;
    let mut npv_low = npv_at_rate(cashflows, low);
    let mut npv_high = npv_at_rate(cashflows, high);

    if !brackets(npv_low, npv_high) {
        (low, high) = WIDENED_BRACKET;
        npv_low = npv_at_rate(cashflows, low);
        npv_high = npv_at_rate(cashflows, high);
        if !brackets(npv_low, npv_high) {
            return None;
        }
    }

    let solution = |rate: f64, npv: f64, iterations: u32| IrrSolution {
        periodic_rate: rate,
        annual_rate: annualize(rate, periods_per_year),
        iterations,
        npv,
    };

    if npv_low == 0.0 {
        return Some(solution(low, 0.0, 0));
    }
    if npv_high == 0.0 {
        return Some(solution(high, 0.0, 0));
    }

    let mut iteration = 1;
    loop {
        let mid = (low + high) / 2.0;
        let npv_mid = npv_at_rate(cashflows, mid);

        let converged = npv_mid.abs() < NPV_TOLERANCE || (high - low) / 2.0 < RATE_TOLERANCE;
        if converged || iteration == MAX_ITERATIONS {
            return Some(solution(mid, npv_mid, iteration));
        }

        if npv_mid.signum() == npv_low.signum() {
            low = mid;
            npv_low = npv_mid;
        } else {
            high = mid;
        }
        iteration += 1;
    }
}
