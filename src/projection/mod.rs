//! Lifecycle projection: accumulation, consolidation, decumulation and returns

mod state;
mod allocation;
mod consolidation;
mod terminal;
mod cashflows;
mod engine;
pub mod annuity;
pub mod irr;
pub mod validation;

pub use state::AccountState;
pub use allocation::{ContributionAllocator, OverflowCascade, OverflowTarget};
pub use consolidation::{consolidate, consolidation_target};
pub use terminal::{project_terminal_value, TerminalValue};
pub use cashflows::{ComprehensiveResult, ConsolidationOutcome, RunSummary, YearResult};
pub use engine::{simulate, LifecycleEngine, PERIODS_PER_YEAR};
pub use annuity::{decumulate, AnnuityResult, AnnuityTerms};
pub use irr::{calculate_irr, npv_at_annual_rate, npv_at_rate, IrrSolution};
pub use validation::{validate, ValidationReport, Violation};
