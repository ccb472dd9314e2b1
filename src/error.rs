//! Error types for configuration and data loading

use thiserror::Error;

/// Problems with a parameter set that make a run meaningless.
///
/// These are raised before any account state exists, so a run either
/// starts from a consistent configuration or does not start at all.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown annuity plan '{0}' (expected level, escalating or partial)")]
    UnknownPlan(String),

    #[error("Unknown target policy '{0}' (expected basic, full, enhanced or an amount)")]
    UnknownTargetPolicy(String),

    #[error("Invalid age ordering: start {start}, consolidation {consolidation}, retirement {retirement}, end {end}")]
    InvalidAges {
        start: u32,
        consolidation: u32,
        retirement: u32,
        end: u32,
    },

    #[error("Partial plan switch age {switch_age} must be after payout start age {retirement_age}")]
    InvalidSwitchAge { switch_age: u32, retirement_age: u32 },

    #[error("Rate '{name}' = {value} is not usable (must be finite and greater than -100%)")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("Initial pool fraction {0} must lie strictly between 0 and 1")]
    InvalidPoolFraction(f64),

    #[error("Amount '{name}' = {value} must be finite and non-negative")]
    InvalidAmount { name: &'static str, value: f64 },

    #[error("Schedule '{0}' has no entries")]
    EmptySchedule(&'static str),

    #[error("Allocation band up to age {max_age} sums to {total}, expected 1.0")]
    InvalidAllocation { max_age: u32, total: f64 },
}

/// Errors raised while reading statutory tables or member files
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration in row {row}: {source}")]
    Config {
        row: usize,
        #[source]
        source: ConfigError,
    },

    #[error("Configuration error: {0}")]
    Invalid(#[from] ConfigError),
}
