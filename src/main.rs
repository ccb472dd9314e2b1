//! Provident Sim CLI
//!
//! Runs one member's lifecycle and prints the working-year trace, payout
//! summary and personal rate of return

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Datelike;
use clap::Parser;

use provident_sim::assumptions::Statutory;
use provident_sim::member::{CashflowView, ParameterSet, SalaryPath};
use provident_sim::projection::LifecycleEngine;

#[derive(Parser, Debug)]
#[command(name = "provident_sim", version, about = "Retirement savings lifecycle projection")]
struct Args {
    /// Age at the first contribution year
    #[arg(long, default_value_t = 30)]
    start_age: u32,

    /// Payout-start age
    #[arg(long, default_value_t = 65)]
    retirement_age: u32,

    /// Last age covered by payouts
    #[arg(long, default_value_t = 90)]
    end_age: u32,

    /// Calendar year of the first contribution (defaults to the current year)
    #[arg(long)]
    start_year: Option<i32>,

    /// Annual salary at the start age
    #[arg(long, default_value_t = 60_000.0)]
    salary: f64,

    /// Annual salary growth rate
    #[arg(long, default_value_t = 0.03)]
    growth: f64,

    /// Annual contribution ceiling
    #[arg(long)]
    ceiling: Option<f64>,

    /// Payout plan: level, escalating or partial
    #[arg(long, default_value = "level")]
    plan: String,

    /// Consolidation target: basic, full, enhanced or an amount
    #[arg(long, default_value = "full")]
    target: String,

    /// Pay out the ordinary balance left after consolidation
    #[arg(long)]
    cash_out: bool,

    /// Count employer contributions as the saver's outflows
    #[arg(long)]
    combined: bool,

    /// Directory holding medical_cap.csv and retirement_target.csv
    #[arg(long)]
    statutory_dir: Option<PathBuf>,

    /// Print the full result as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Where to write the working-year trace
    #[arg(long, default_value = "lifecycle_output.csv")]
    csv: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let statutory = match &args.statutory_dir {
        Some(dir) => Statutory::from_csv_path(dir)
            .with_context(|| format!("loading statutory tables from {}", dir.display()))?,
        None => Statutory::default_tables(),
    };

    let standard = ParameterSet::standard();
    let params = ParameterSet {
        start_year: args.start_year.unwrap_or_else(|| chrono::Local::now().year()),
        start_age: args.start_age,
        retirement_age: args.retirement_age,
        end_age: args.end_age,
        salary: SalaryPath::Growth { start: args.salary, rate: args.growth },
        contribution_ceiling: args.ceiling.unwrap_or(standard.contribution_ceiling),
        plan: args.plan.parse()?,
        target: args.target.parse()?,
        allow_cash_withdrawal: args.cash_out,
        cashflow_view: if args.combined { CashflowView::Combined } else { CashflowView::Employee },
        statutory,
        ..standard
    };

    let engine = LifecycleEngine::new(&params)?;
    let result = engine.run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Provident Sim v0.1.0");
    println!("====================\n");
    println!("Member: age {} in {}, payouts {}..{}, plan {}, target {}",
        params.start_age, params.start_year, params.retirement_age, params.end_age, params.plan, params.target);
    println!();

    println!("{:>4} {:>4} {:>11} {:>10} {:>11} {:>12} {:>12} {:>11} {:>12} {:>10}",
        "Year", "Age", "Base", "Contrib", "Overflow", "Ordinary", "Special", "Medical", "Retirement", "Cap");
    println!("{}", "-".repeat(110));
    for row in &result.years {
        println!("{:>4} {:>4} {:>11.2} {:>10.2} {:>11.2} {:>12.2} {:>12.2} {:>11.2} {:>12.2} {:>10.2}",
            row.year,
            row.age,
            row.contribution_base,
            row.total_contribution,
            row.overflow,
            row.ordinary_balance,
            row.special_balance,
            row.medical_balance,
            row.retirement_balance,
            row.medical_cap,
        );
    }

    let mut file = File::create(&args.csv)
        .with_context(|| format!("creating {}", args.csv.display()))?;
    writeln!(file, "Year,Age,Salary,Base,Employee,Employer,OrdinaryAlloc,SpecialAlloc,MedicalAlloc,RetirementAlloc,Interest,Overflow,Ordinary,Special,Medical,Retirement,MedicalCap")?;
    for row in &result.years {
        writeln!(file, "{},{},{:.2},{:.2},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.2}",
            row.year,
            row.age,
            row.salary,
            row.contribution_base,
            row.employee_contribution,
            row.employer_contribution,
            row.ordinary_allocation,
            row.special_allocation,
            row.medical_allocation,
            row.retirement_allocation,
            row.interest_credited,
            row.overflow,
            row.ordinary_balance,
            row.special_balance,
            row.medical_balance,
            row.retirement_balance,
            row.medical_cap,
        )?;
    }
    println!("\nFull trace written to: {}", args.csv.display());

    let c = &result.consolidation;
    println!("\nConsolidation at age {} ({}):", c.age, c.year);
    println!("  Target:            ${:.2}", c.target);
    println!("  From special:      ${:.2}", c.from_special);
    println!("  From ordinary:     ${:.2}", c.from_ordinary);
    println!("  Special remaining: ${:.2}", c.special_remaining);
    println!("  Ordinary remaining:${:.2}", c.ordinary_remaining);
    println!("  Cash withdrawn:    ${:.2}", c.cash_withdrawn);

    let summary = result.summary();
    println!("\nSummary:");
    println!("  Total Contributions: ${:.2} (employee ${:.2})", summary.total_contribution, summary.total_employee_contribution);
    println!("  Payout Pool:         ${:.2}", summary.retirement_pool);
    println!("  First / Last Payout: ${:.2} / ${:.2}", summary.first_payout, summary.last_payout);
    println!("  Total Paid:          ${:.2}", summary.total_paid);
    println!("  Terminal Value:      ${:.2}", summary.terminal_value);
    println!("  Total Benefits:      ${:.2}", summary.total_benefits);
    match summary.annual_irr {
        Some(irr) => println!("  Personal IRR:        {:.4}%", irr * 100.0),
        None => println!("  Personal IRR:        n/a"),
    }
    println!("  NPV @ {:.2}%:         ${:.2}", result.reference_discount_rate * 100.0, summary.npv_at_reference);

    println!("\nBequest at reference ages:");
    for (age, value) in &result.annuity.bequest_at_ages {
        match value {
            Some(v) => println!("  Age {:>3}: ${:.2}", age, v),
            None => println!("  Age {:>3}: outside payout horizon", age),
        }
    }

    if !result.validation.is_valid {
        println!("\nValidation FAILED:");
        for v in &result.validation.violations {
            println!("  - {}", v);
        }
    }

    Ok(())
}
