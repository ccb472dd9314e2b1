//! Statutory assumptions: contribution rates, allocation bands and
//! year-indexed schedules for the medical cap and consolidation target

mod rates;
mod schedule;
pub mod loader;

pub use rates::{AllocationBand, AllocationTable, ContributionRates, RatePair};
pub use schedule::{ScheduleFn, StatutorySchedule};
pub use loader::LoadedSchedules;

use std::path::Path;

use crate::error::LoadError;

/// Container for all statutory parameters of a run
#[derive(Debug, Clone)]
pub struct Statutory {
    pub contribution_rates: ContributionRates,
    pub allocation: AllocationTable,
    /// Medical-account cap for a calendar year
    pub medical_cap: ScheduleFn,
    /// Consolidation ("full") target for a calendar year
    pub retirement_target: ScheduleFn,
}

impl Statutory {
    /// Built-in tables with linear extrapolation past the last published year
    pub fn default_tables() -> Self {
        Self {
            contribution_rates: ContributionRates::default(),
            allocation: AllocationTable::default(),
            medical_cap: StatutorySchedule::default_medical_cap().into_fn(),
            retirement_target: StatutorySchedule::default_retirement_target().into_fn(),
        }
    }

    /// Load the schedules from CSV files in the default location (data/statutory/)
    pub fn from_csv() -> Result<Self, LoadError> {
        Self::from_csv_path(Path::new(loader::DEFAULT_STATUTORY_PATH))
    }

    /// Load the schedules from CSV files in a specific directory
    pub fn from_csv_path(path: &Path) -> Result<Self, LoadError> {
        let loaded = LoadedSchedules::load_from(path)?;
        Ok(Self {
            medical_cap: loaded.medical_cap.into_fn(),
            retirement_target: loaded.retirement_target.into_fn(),
            ..Self::default_tables()
        })
    }

    /// Replace the medical cap schedule
    pub fn with_medical_cap(mut self, cap: ScheduleFn) -> Self {
        self.medical_cap = cap;
        self
    }

    /// Replace the consolidation target schedule
    pub fn with_retirement_target(mut self, target: ScheduleFn) -> Self {
        self.retirement_target = target;
        self
    }
}

impl Default for Statutory {
    fn default() -> Self {
        Self::default_tables()
    }
}
