//! Compare payout plans across a salary grid
//!
//! Supports JSON output via --json flag
//! Accepts config via environment variables:
//!   SALARIES (comma separated), START_AGE, RETIREMENT_AGE, END_AGE,
//!   TARGET, CASH_OUT, STATUTORY_DIR

use provident_sim::member::{AnnuityPlan, TargetPolicy};
use provident_sim::ScenarioRunner;
use serde::Serialize;
use std::env;
use std::path::Path;
use std::time::Instant;

#[derive(Serialize)]
struct GridRow {
    salary: f64,
    plan: AnnuityPlan,
    pool: Option<f64>,
    first_payout: Option<f64>,
    last_payout: Option<f64>,
    total_benefits: Option<f64>,
    annual_irr_pct: Option<f64>,
    error: Option<String>,
}

#[derive(Serialize)]
struct GridResponse {
    target: String,
    rows: Vec<GridRow>,
    execution_time_ms: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let start = Instant::now();

    let json_output = env::args().any(|arg| arg == "--json");

    let salaries: Vec<f64> = env::var("SALARIES")
        .ok()
        .map(|s| s.split(',').filter_map(|v| v.trim().parse().ok()).collect())
        .unwrap_or_else(|| vec![36_000.0, 60_000.0, 96_000.0, 120_000.0]);

    let runner = match env::var("STATUTORY_DIR") {
        Ok(dir) => ScenarioRunner::from_csv_path(Path::new(&dir))?,
        Err(_) => ScenarioRunner::new(),
    };

    let mut params = runner.base_params();
    if let Some(age) = env::var("START_AGE").ok().and_then(|s| s.parse().ok()) {
        params.start_age = age;
    }
    if let Some(age) = env::var("RETIREMENT_AGE").ok().and_then(|s| s.parse().ok()) {
        params.retirement_age = age;
    }
    if let Some(age) = env::var("END_AGE").ok().and_then(|s| s.parse().ok()) {
        params.end_age = age;
    }
    if let Ok(target) = env::var("TARGET") {
        params.target = target.parse::<TargetPolicy>()?;
    }
    params.allow_cash_withdrawal = env::var("CASH_OUT").is_ok();
    params.validate()?;

    if !json_output {
        println!("Running {} salaries x {} plans...", salaries.len(), AnnuityPlan::ALL.len());
    }

    let grid = runner.run_salary_grid(&params, &salaries, &AnnuityPlan::ALL);

    let rows: Vec<GridRow> = grid
        .into_iter()
        .map(|(salary, plan, result)| match result {
            Ok(r) => {
                let summary = r.summary();
                GridRow {
                    salary,
                    plan,
                    pool: Some(summary.retirement_pool),
                    first_payout: Some(summary.first_payout),
                    last_payout: Some(summary.last_payout),
                    total_benefits: Some(summary.total_benefits),
                    annual_irr_pct: summary.annual_irr.map(|irr| irr * 100.0),
                    error: None,
                }
            }
            Err(e) => GridRow {
                salary,
                plan,
                pool: None,
                first_payout: None,
                last_payout: None,
                total_benefits: None,
                annual_irr_pct: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    if json_output {
        let response = GridResponse {
            target: params.target.to_string(),
            rows,
            execution_time_ms: start.elapsed().as_millis() as u64,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("\n{:>10} {:>11} {:>13} {:>11} {:>11} {:>14} {:>9}",
        "Salary", "Plan", "Pool", "First", "Last", "Benefits", "IRR");
    println!("{}", "-".repeat(85));
    for row in &rows {
        match &row.error {
            Some(e) => println!("{:>10.0} {:>11} error: {}", row.salary, row.plan.name(), e),
            None => println!("{:>10.0} {:>11} {:>13.2} {:>11.2} {:>11.2} {:>14.2} {:>9}",
                row.salary,
                row.plan.name(),
                row.pool.unwrap_or(0.0),
                row.first_payout.unwrap_or(0.0),
                row.last_payout.unwrap_or(0.0),
                row.total_benefits.unwrap_or(0.0),
                row.annual_irr_pct
                    .map(|irr| format!("{:.3}%", irr))
                    .unwrap_or_else(|| "n/a".to_string()),
            ),
        }
    }

    println!("\nCompleted in {:?}", start.elapsed());
    Ok(())
}
