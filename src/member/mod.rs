//! Member parameter sets and their CSV loader

mod data;
mod loader;

pub use data::{AccountRates, AnnuityPlan, CashflowView, ParameterSet, SalaryPath, TargetPolicy};
pub use loader::{load_members, load_members_from_reader, Member};
