//! Run lifecycle projections for every member in data/members.csv
//!
//! Usage: run_batch [members.csv] [output.csv]
//! Set STATUTORY_DIR to load medical cap and target tables from another directory

use provident_sim::member::load_members;
use provident_sim::ScenarioRunner;
use anyhow::Context;
use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let input_path = args.next().unwrap_or_else(|| "data/members.csv".to_string());
    let output_path = args.next().unwrap_or_else(|| "batch_output.csv".to_string());

    let runner = match env::var("STATUTORY_DIR") {
        Ok(dir) => ScenarioRunner::from_csv_path(Path::new(&dir))?,
        Err(_) => ScenarioRunner::from_csv().unwrap_or_else(|e| {
            log::warn!("Statutory tables not loaded ({}), using built-in tables", e);
            ScenarioRunner::new()
        }),
    };

    let start = Instant::now();
    println!("Loading members from {}...", input_path);
    let members = load_members(&input_path, runner.statutory())
        .with_context(|| format!("loading members from {}", input_path))?;
    println!("Loaded {} members in {:?}", members.len(), start.elapsed());

    println!("Running projections...");
    let proj_start = Instant::now();
    let runs = runner.run_batch(&members);
    println!("Projections complete in {:?}", proj_start.elapsed());

    let mut file = File::create(&output_path)
        .with_context(|| format!("creating {}", output_path))?;
    writeln!(file, "MemberId,Plan,TotalContribution,EmployeeContribution,ConsolidationTarget,CashWithdrawn,Pool,FirstPayout,LastPayout,TotalPaid,TerminalValue,TotalBenefits,AnnualIRR,NPV,Valid,Error")?;

    let mut failures = 0;
    for run in &runs {
        match &run.result {
            Ok(result) => {
                let summary = result.summary();
                writeln!(
                    file,
                    "{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{},{:.2},{},",
                    run.member_id,
                    summary.plan,
                    summary.total_contribution,
                    summary.total_employee_contribution,
                    result.consolidation.target,
                    summary.cash_withdrawn,
                    summary.retirement_pool,
                    summary.first_payout,
                    summary.last_payout,
                    summary.total_paid,
                    summary.terminal_value,
                    summary.total_benefits,
                    summary.annual_irr.map(|irr| format!("{:.8}", irr)).unwrap_or_default(),
                    summary.npv_at_reference,
                    summary.is_valid,
                )?;
            }
            Err(e) => {
                failures += 1;
                log::warn!("Member {} failed: {}", run.member_id, e);
                writeln!(file, "{},,,,,,,,,,,,,,false,\"{}\"", run.member_id, e)?;
            }
        }
    }

    println!("Output written to {}", output_path);
    if failures > 0 {
        println!("{} of {} members failed", failures, runs.len());
    }
    println!("Total time: {:?}", start.elapsed());

    Ok(())
}
