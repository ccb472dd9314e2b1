//! Provident Sim - lifecycle engine for multi-account retirement savings schemes
//!
//! This library provides:
//! - Year-by-year contribution allocation across four sub-accounts
//! - Medical-account cap enforcement with overflow redirection
//! - One-time consolidation into a retirement account
//! - Level, escalating and partial annuity decumulation
//! - Personal IRR and NPV over the full lifecycle cash flows

pub mod error;
pub mod assumptions;
pub mod member;
pub mod projection;
pub mod scenario;

// Re-export commonly used types
pub use error::{ConfigError, LoadError};
pub use assumptions::{ScheduleFn, Statutory, StatutorySchedule};
pub use member::{AnnuityPlan, ParameterSet, TargetPolicy};
pub use projection::{simulate, ComprehensiveResult, LifecycleEngine, YearResult};
pub use scenario::ScenarioRunner;
