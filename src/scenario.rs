//! Scenario runner for batch lifecycle runs
//!
//! Loads statutory tables once, then runs many members or plan variants in
//! parallel. Every run owns its own account state, so no coordination is
//! needed between them.

use rayon::prelude::*;

use crate::assumptions::Statutory;
use crate::error::{ConfigError, LoadError};
use crate::member::{AnnuityPlan, Member, ParameterSet, SalaryPath};
use crate::projection::{simulate, ComprehensiveResult};

/// Result of one member's run in a batch
#[derive(Debug)]
pub struct MemberRun {
    pub member_id: u32,
    pub result: Result<ComprehensiveResult, ConfigError>,
}

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_csv()?;
/// let results = runner.run_plans(&runner.base_params());
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    statutory: Statutory,
}

impl ScenarioRunner {
    /// Create runner with the built-in statutory tables
    pub fn new() -> Self {
        Self {
            statutory: Statutory::default_tables(),
        }
    }

    /// Create runner by loading statutory tables from the default directory
    pub fn from_csv() -> Result<Self, LoadError> {
        Ok(Self {
            statutory: Statutory::from_csv()?,
        })
    }

    /// Create runner from a specific statutory table directory
    pub fn from_csv_path(path: &std::path::Path) -> Result<Self, LoadError> {
        Ok(Self {
            statutory: Statutory::from_csv_path(path)?,
        })
    }

    /// Create runner with pre-built statutory parameters
    pub fn with_statutory(statutory: Statutory) -> Self {
        Self { statutory }
    }

    pub fn statutory(&self) -> &Statutory {
        &self.statutory
    }

    /// Standard parameter set carrying this runner's statutory tables
    pub fn base_params(&self) -> ParameterSet {
        ParameterSet {
            statutory: self.statutory.clone(),
            ..ParameterSet::standard()
        }
    }

    /// Run a single lifecycle
    pub fn run(&self, params: &ParameterSet) -> Result<ComprehensiveResult, ConfigError> {
        simulate(params)
    }

    /// Run every member in parallel, keeping input order
    pub fn run_batch(&self, members: &[Member]) -> Vec<MemberRun> {
        members
            .par_iter()
            .map(|member| MemberRun {
                member_id: member.member_id,
                result: simulate(&member.params),
            })
            .collect()
    }

    /// Run the same member under each payout plan
    pub fn run_plans(&self, params: &ParameterSet) -> Vec<Result<ComprehensiveResult, ConfigError>> {
        AnnuityPlan::ALL
            .par_iter()
            .map(|&plan| {
                let variant = ParameterSet { plan, ..params.clone() };
                simulate(&variant)
            })
            .collect()
    }

    /// Run every (salary, plan) pair with flat salaries, salary-major order
    pub fn run_salary_grid(
        &self,
        params: &ParameterSet,
        salaries: &[f64],
        plans: &[AnnuityPlan],
    ) -> Vec<(f64, AnnuityPlan, Result<ComprehensiveResult, ConfigError>)> {
        let cases: Vec<(f64, AnnuityPlan)> = salaries
            .iter()
            .flat_map(|&salary| plans.iter().map(move |&plan| (salary, plan)))
            .collect();

        cases
            .into_par_iter()
            .map(|(salary, plan)| {
                let variant = ParameterSet {
                    plan,
                    salary: SalaryPath::Growth { start: salary, rate: 0.0 },
                    ..params.clone()
                };
                (salary, plan, simulate(&variant))
            })
            .collect()
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}
