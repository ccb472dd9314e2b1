//! Annuity decumulation: monthly payouts from the consolidated balance
//!
//! All three plans share the same monthly skeleton: credit one month of
//! interest to the pool, then pay the month's payment capped at what the
//! pool holds. They differ in how the payment is sized:
//! - **Level**: one fixed amortization payment over the whole horizon
//! - **Escalating**: the first payment solves a growing annuity whose
//!   payment steps up once a year at the escalation rate
//! - **Partial**: a deferred small pool accrues interest while the large
//!   pool is paid down by the switch age; from the switch month the small
//!   pool pays a new level amount for the remaining months

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::member::{AnnuityPlan, ParameterSet};

/// Terms that size the payout schedule
#[derive(Debug, Clone, PartialEq)]
pub struct AnnuityTerms {
    pub plan: AnnuityPlan,
    /// Annual discount rate, credited monthly at rate / 12
    pub discount_rate: f64,
    /// Annual payment growth for the escalating plan
    pub escalation_rate: f64,
    /// Share of the pool deferred by the partial plan
    pub initial_pool_fraction: f64,
    pub payout_start_age: u32,
    pub end_age: u32,
    /// Age at which the partial plan switches to the small pool
    pub switch_age: u32,
    pub reference_ages: Vec<u32>,
}

impl AnnuityTerms {
    pub fn from_params(params: &ParameterSet) -> Self {
        Self {
            plan: params.plan,
            discount_rate: params.annuity_discount_rate,
            escalation_rate: params.escalation_rate,
            initial_pool_fraction: params.initial_pool_fraction,
            payout_start_age: params.retirement_age,
            end_age: params.end_age,
            switch_age: params.partial_switch_age,
            reference_ages: params.reference_ages.clone(),
        }
    }

    pub fn monthly_rate(&self) -> f64 {
        self.discount_rate / 12.0
    }

    pub fn horizon_months(&self) -> usize {
        (self.end_age.saturating_sub(self.payout_start_age) * 12) as usize
    }

    /// Age attained in payout month `month` (0-indexed)
    pub fn age_at_month(&self, month: usize) -> u32 {
        self.payout_start_age + (month / 12) as u32
    }
}

/// Payout schedule for the chosen plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnuityResult {
    pub plan: AnnuityPlan,
    /// Consolidated balance used as the payout pool
    pub pool: f64,
    pub monthly_rate: f64,
    /// Payment sized at payout start (month-1 target)
    pub initial_payment: f64,
    /// Amount paid in each month
    pub payouts: Vec<f64>,
    /// Remaining value immediately after each month's payout
    pub bequest: Vec<f64>,
    pub total_paid: f64,
    pub final_remaining: f64,
    /// Bequest value at each reference age, `None` outside the horizon
    pub bequest_at_ages: BTreeMap<u32, Option<f64>>,
    /// Month (0-indexed) in which the partial plan moved to the small pool
    pub phase_switch_month: Option<usize>,
}

/// Present value of 1 paid at the end of each of `months` months
pub fn level_factor(monthly_rate: f64, months: usize) -> f64 {
    if months == 0 {
        return 0.0;
    }
    if monthly_rate.abs() < 1e-12 {
        return months as f64;
    }
    (1.0 - (1.0 + monthly_rate).powi(-(months as i32))) / monthly_rate
}

/// Fixed monthly payment that exhausts `pool` after `months` payments,
/// each paid after that month's interest
pub fn level_payment(pool: f64, monthly_rate: f64, months: usize) -> f64 {
    if months == 0 {
        return pool;
    }
    pool / level_factor(monthly_rate, months)
}

/// Present value of 1 per month growing by `annual_growth` once every 12 months
///
/// Year k (0-indexed) pays `(1+g)^k` in each of its months; with
/// `q = (1+g) v^12` the whole-year part is `a_12 * (1 - q^Y) / (1 - q)`.
pub fn growing_annuity_factor(monthly_rate: f64, annual_growth: f64, months: usize) -> f64 {
    let full_years = months / 12;
    let remainder = months % 12;
    let v12 = (1.0 + monthly_rate).powi(-12);
    let q = (1.0 + annual_growth) * v12;

    let year_sum = if (q - 1.0).abs() < 1e-12 {
        full_years as f64
    } else {
        (1.0 - q.powi(full_years as i32)) / (1.0 - q)
    };

    let whole_years = level_factor(monthly_rate, 12) * year_sum;
    let tail = if remainder > 0 {
        q.powi(full_years as i32) * level_factor(monthly_rate, remainder)
    } else {
        0.0
    };
    whole_years + tail
}

/// Run the decumulation for `pool` under `terms`
pub fn decumulate(pool: f64, terms: &AnnuityTerms) -> AnnuityResult {
    let pool = pool.max(0.0);
    let months = terms.horizon_months();
    let rate = terms.monthly_rate();

    let mut schedule = match terms.plan {
        AnnuityPlan::Level => run_level(pool, rate, months),
        AnnuityPlan::Escalating => run_escalating(pool, rate, terms.escalation_rate, months),
        AnnuityPlan::Partial => run_partial(pool, rate, terms),
    };

    let total_paid = schedule.payouts.iter().sum();
    let final_remaining = schedule.bequest.last().copied().unwrap_or(pool);

    let bequest_at_ages = terms
        .reference_ages
        .iter()
        .map(|&age| {
            let value = age
                .checked_sub(terms.payout_start_age)
                .and_then(|elapsed| schedule.bequest.get((elapsed * 12) as usize).copied());
            (age, value)
        })
        .collect();

    AnnuityResult {
        plan: terms.plan,
        pool,
        monthly_rate: rate,
        initial_payment: schedule.initial_payment,
        payouts: std::mem::take(&mut schedule.payouts),
        bequest: std::mem::take(&mut schedule.bequest),
        total_paid,
        final_remaining,
        bequest_at_ages,
        phase_switch_month: schedule.phase_switch_month,
    }
}

struct Schedule {
    initial_payment: f64,
    payouts: Vec<f64>,
    bequest: Vec<f64>,
    phase_switch_month: Option<usize>,
}

impl Schedule {
    fn with_capacity(initial_payment: f64, months: usize) -> Self {
        Self {
            initial_payment,
            payouts: Vec::with_capacity(months),
            bequest: Vec::with_capacity(months),
            phase_switch_month: None,
        }
    }
}

/// Credit interest, then pay `target` capped at the balance. Returns the amount paid.
fn pay_month(balance: &mut f64, rate: f64, target: f64) -> f64 {
    *balance *= 1.0 + rate;
    let paid = target.min(*balance).max(0.0);
    *balance -= paid;
    paid
}

fn run_level(pool: f64, rate: f64, months: usize) -> Schedule {
    let payment = level_payment(pool, rate, months);
    let mut schedule = Schedule::with_capacity(payment, months);
    let mut balance = pool;

    for _ in 0..months {
        let paid = pay_month(&mut balance, rate, payment);
        schedule.payouts.push(paid);
        schedule.bequest.push(balance);
    }

    schedule
}

fn run_escalating(pool: f64, rate: f64, growth: f64, months: usize) -> Schedule {
    let factor = growing_annuity_factor(rate, growth, months);
    let first = if factor > 0.0 { pool / factor } else { pool };
    let mut schedule = Schedule::with_capacity(first, months);
    let mut balance = pool;

    for month in 0..months {
        let elapsed_years = (month / 12) as i32;
        let target = first * (1.0 + growth).powi(elapsed_years);
        let paid = pay_month(&mut balance, rate, target);
        schedule.payouts.push(paid);
        schedule.bequest.push(balance);
    }

    schedule
}

fn run_partial(pool: f64, rate: f64, terms: &AnnuityTerms) -> Schedule {
    let months = terms.horizon_months();
    let switch_month = (terms.switch_age.saturating_sub(terms.payout_start_age) * 12) as usize;

    let mut small = pool * terms.initial_pool_fraction;
    let mut large = pool - small;

    // Large pool is sized to run out at the switch age
    let phase_one_payment = level_payment(large, rate, switch_month);
    let mut schedule = Schedule::with_capacity(phase_one_payment, months);
    let mut tail_payment = 0.0;

    for month in 0..months {
        let paid = if month < switch_month {
            small *= 1.0 + rate;
            pay_month(&mut large, rate, phase_one_payment)
        } else {
            if month == switch_month {
                // Any rounding residue in the large pool joins the small pool
                small = (small + large) * (1.0 + rate);
                large = 0.0;
                let remaining = months - month;
                // Sized on the balance after this month's interest; the final
                // month pays whatever is left
                tail_payment = level_payment(small, rate, remaining);
                schedule.phase_switch_month = Some(month);
                log::debug!(
                    "Partial plan switch at month {} (age {}): small pool {:.2}, tail payment {:.2}",
                    month,
                    terms.age_at_month(month),
                    small,
                    tail_payment
                );
                let paid = tail_payment.min(small);
                small -= paid;
                paid
            } else {
                pay_month(&mut small, rate, tail_payment)
            }
        };

        schedule.payouts.push(paid);
        schedule.bequest.push(large + small);
    }

    schedule
}
