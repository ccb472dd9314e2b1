//! Member parameter set for one lifecycle run

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::assumptions::Statutory;
use crate::error::ConfigError;

/// Payout plan chosen at the payout-start age
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnuityPlan {
    /// Fixed monthly payment sized to exhaust the pool at end age
    Level,
    /// Payment grows once a year at the escalation rate
    Escalating,
    /// Small pool deferred, large pool paid down first, then the small pool
    Partial,
}

impl AnnuityPlan {
    pub const ALL: [AnnuityPlan; 3] = [AnnuityPlan::Level, AnnuityPlan::Escalating, AnnuityPlan::Partial];

    pub fn name(&self) -> &'static str {
        match self {
            AnnuityPlan::Level => "level",
            AnnuityPlan::Escalating => "escalating",
            AnnuityPlan::Partial => "partial",
        }
    }
}

impl fmt::Display for AnnuityPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnnuityPlan {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "level" | "standard" => Ok(AnnuityPlan::Level),
            "escalating" => Ok(AnnuityPlan::Escalating),
            "partial" | "basic" => Ok(AnnuityPlan::Partial),
            _ => Err(ConfigError::UnknownPlan(s.to_string())),
        }
    }
}

/// How the consolidation target is derived
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetPolicy {
    /// Half of the published amount
    Basic,
    /// The published amount
    Full,
    /// Twice the published amount
    Enhanced,
    /// Caller-supplied amount, schedule ignored
    Custom(f64),
}

impl TargetPolicy {
    /// Multiple of the published schedule, `None` for a custom amount
    pub fn multiple(&self) -> Option<f64> {
        match self {
            TargetPolicy::Basic => Some(0.5),
            TargetPolicy::Full => Some(1.0),
            TargetPolicy::Enhanced => Some(2.0),
            TargetPolicy::Custom(_) => None,
        }
    }

    /// Target amount given the published amount for the consolidation year
    pub fn resolve(&self, published: f64) -> f64 {
        match self {
            TargetPolicy::Custom(amount) => *amount,
            policy => published * policy.multiple().unwrap_or(1.0),
        }
    }
}

impl fmt::Display for TargetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetPolicy::Basic => f.write_str("basic"),
            TargetPolicy::Full => f.write_str("full"),
            TargetPolicy::Enhanced => f.write_str("enhanced"),
            TargetPolicy::Custom(amount) => write!(f, "{}", amount),
        }
    }
}

impl FromStr for TargetPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "basic" | "brs" => Ok(TargetPolicy::Basic),
            "full" | "frs" => Ok(TargetPolicy::Full),
            "enhanced" | "ers" => Ok(TargetPolicy::Enhanced),
            _ => match trimmed.parse::<f64>() {
                Ok(amount) if amount.is_finite() && amount >= 0.0 => Ok(TargetPolicy::Custom(amount)),
                _ => Err(ConfigError::UnknownTargetPolicy(s.to_string())),
            },
        }
    }
}

/// Which contributions count as the saver's own outflows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashflowView {
    /// Employee share only
    #[default]
    Employee,
    /// Employee plus employer
    Combined,
}

/// Annual salary before the contribution ceiling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SalaryPath {
    /// Start salary growing at a constant annual rate
    Growth { start: f64, rate: f64 },
    /// One value per simulated year; the last value repeats
    Schedule(Vec<f64>),
}

impl SalaryPath {
    /// Salary in the `index`-th simulated year (0 = start age)
    pub fn salary_for(&self, index: u32) -> f64 {
        match self {
            SalaryPath::Growth { start, rate } => start * (1.0 + rate).powi(index as i32),
            SalaryPath::Schedule(values) => values
                .get(index as usize)
                .or_else(|| values.last())
                .copied()
                .unwrap_or(0.0),
        }
    }
}

/// Annual interest rates of the four accounts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountRates {
    pub ordinary: f64,
    pub special: f64,
    pub medical: f64,
    pub retirement: f64,
}

impl Default for AccountRates {
    fn default() -> Self {
        Self {
            ordinary: 0.025,
            special: 0.04,
            medical: 0.04,
            retirement: 0.04,
        }
    }
}

/// Immutable configuration of one simulation run
#[derive(Debug, Clone)]
pub struct ParameterSet {
    /// Calendar year in which the saver is `start_age`
    pub start_year: i32,
    pub start_age: u32,
    /// Age at which the consolidation event runs
    pub consolidation_age: u32,
    /// Payout-start age; working years run up to but excluding it
    pub retirement_age: u32,
    pub end_age: u32,
    /// Age from which the medical cap is frozen at its cohort value
    pub cap_freeze_age: u32,

    pub salary: SalaryPath,
    /// Annual contribution ceiling on salary
    pub contribution_ceiling: f64,
    pub rates: AccountRates,

    pub plan: AnnuityPlan,
    /// Annual rate used to amortize the payout pool
    pub annuity_discount_rate: f64,
    /// Annual payment growth for the escalating plan
    pub escalation_rate: f64,
    /// Share of the pool deferred by the partial plan
    pub initial_pool_fraction: f64,
    /// Age at which the partial plan's large pool is exhausted
    pub partial_switch_age: u32,

    pub target: TargetPolicy,
    /// Ordinary balance left after consolidation may be paid out as cash
    pub allow_cash_withdrawal: bool,

    pub cashflow_view: CashflowView,
    /// Annual rate for the reference NPV
    pub reference_discount_rate: f64,
    /// Ages at which the bequest curve is reported
    pub reference_ages: Vec<u32>,

    pub statutory: Statutory,
}

impl ParameterSet {
    /// Default configuration: age 30 to 65 working, payouts to 90, level plan
    pub fn standard() -> Self {
        Self {
            start_year: 2025,
            start_age: 30,
            consolidation_age: 55,
            retirement_age: 65,
            end_age: 90,
            cap_freeze_age: 65,
            salary: SalaryPath::Growth { start: 60_000.0, rate: 0.03 },
            contribution_ceiling: 81_600.0,
            rates: AccountRates::default(),
            plan: AnnuityPlan::Level,
            annuity_discount_rate: 0.04,
            escalation_rate: 0.02,
            initial_pool_fraction: 0.15,
            partial_switch_age: 85,
            target: TargetPolicy::Full,
            allow_cash_withdrawal: false,
            cashflow_view: CashflowView::Employee,
            reference_discount_rate: 0.04,
            reference_ages: vec![70, 75, 80, 85, 90],
            statutory: Statutory::default_tables(),
        }
    }

    /// Standard configuration with plan and target given by name
    pub fn from_names(plan: &str, target: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            plan: plan.parse()?,
            target: target.parse()?,
            ..Self::standard()
        })
    }

    /// Number of working (contribution) years
    pub fn working_years(&self) -> u32 {
        self.retirement_age - self.start_age
    }

    /// Number of payout months
    pub fn horizon_months(&self) -> usize {
        ((self.end_age - self.retirement_age) * 12) as usize
    }

    /// Calendar year in which the saver has attained `age`
    pub fn year_at_age(&self, age: u32) -> i32 {
        self.start_year + age as i32 - self.start_age as i32
    }

    /// Year whose cap applies once the cap is frozen
    pub fn cohort_year(&self) -> i32 {
        self.year_at_age(self.cap_freeze_age)
    }

    /// Medical cap applicable at `age`
    ///
    /// Before the freeze age the current year's cap applies; from the freeze
    /// age on the cohort year's cap applies and later years are never read.
    pub fn medical_cap_at(&self, age: u32) -> f64 {
        if age >= self.cap_freeze_age {
            self.statutory.medical_cap.at(self.cohort_year())
        } else {
            self.statutory.medical_cap.at(self.year_at_age(age))
        }
    }

    /// Check the parameter set before a run
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ages_ordered = self.start_age <= self.consolidation_age
            && self.consolidation_age < self.retirement_age
            && self.retirement_age < self.end_age;
        if !ages_ordered {
            return Err(ConfigError::InvalidAges {
                start: self.start_age,
                consolidation: self.consolidation_age,
                retirement: self.retirement_age,
                end: self.end_age,
            });
        }

        if self.plan == AnnuityPlan::Partial && self.partial_switch_age <= self.retirement_age {
            return Err(ConfigError::InvalidSwitchAge {
                switch_age: self.partial_switch_age,
                retirement_age: self.retirement_age,
            });
        }

        let rates = [
            ("ordinary_rate", self.rates.ordinary),
            ("special_rate", self.rates.special),
            ("medical_rate", self.rates.medical),
            ("retirement_rate", self.rates.retirement),
            ("annuity_discount_rate", self.annuity_discount_rate),
            ("escalation_rate", self.escalation_rate),
            ("reference_discount_rate", self.reference_discount_rate),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value <= -1.0 {
                return Err(ConfigError::InvalidRate { name, value });
            }
        }

        if !(self.initial_pool_fraction > 0.0 && self.initial_pool_fraction < 1.0) {
            return Err(ConfigError::InvalidPoolFraction(self.initial_pool_fraction));
        }

        check_amount("contribution_ceiling", self.contribution_ceiling)?;
        match &self.salary {
            SalaryPath::Growth { start, rate } => {
                check_amount("annual_salary", *start)?;
                if !rate.is_finite() || *rate <= -1.0 {
                    return Err(ConfigError::InvalidRate { name: "salary_growth", value: *rate });
                }
            }
            SalaryPath::Schedule(values) => {
                if values.is_empty() {
                    return Err(ConfigError::EmptySchedule("salary"));
                }
                for &value in values {
                    check_amount("annual_salary", value)?;
                }
            }
        }
        if let TargetPolicy::Custom(amount) = self.target {
            check_amount("custom_target", amount)?;
        }

        self.statutory.allocation.validate()
    }
}

fn check_amount(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidAmount { name, value })
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::ScheduleFn;

    #[test]
    fn test_plan_names() {
        assert_eq!("level".parse::<AnnuityPlan>(), Ok(AnnuityPlan::Level));
        assert_eq!(" Escalating ".parse::<AnnuityPlan>(), Ok(AnnuityPlan::Escalating));
        assert_eq!("partial".parse::<AnnuityPlan>(), Ok(AnnuityPlan::Partial));
        assert_eq!(
            "lump".parse::<AnnuityPlan>(),
            Err(ConfigError::UnknownPlan("lump".to_string()))
        );
    }

    #[test]
    fn test_target_names() {
        assert_eq!("full".parse::<TargetPolicy>(), Ok(TargetPolicy::Full));
        assert_eq!("ERS".parse::<TargetPolicy>(), Ok(TargetPolicy::Enhanced));
        assert_eq!("150000".parse::<TargetPolicy>(), Ok(TargetPolicy::Custom(150_000.0)));
        assert!(matches!(
            "generous".parse::<TargetPolicy>(),
            Err(ConfigError::UnknownTargetPolicy(_))
        ));
        assert!("-5".parse::<TargetPolicy>().is_err());
    }

    #[test]
    fn test_target_resolution() {
        assert_eq!(TargetPolicy::Basic.resolve(200_000.0), 100_000.0);
        assert_eq!(TargetPolicy::Full.resolve(200_000.0), 200_000.0);
        assert_eq!(TargetPolicy::Enhanced.resolve(200_000.0), 400_000.0);
        assert_eq!(TargetPolicy::Custom(1.0).resolve(200_000.0), 1.0);
    }

    #[test]
    fn test_salary_paths() {
        let growth = SalaryPath::Growth { start: 100.0, rate: 0.1 };
        assert!((growth.salary_for(2) - 121.0).abs() < 1e-9);

        let schedule = SalaryPath::Schedule(vec![1.0, 2.0]);
        assert_eq!(schedule.salary_for(0), 1.0);
        assert_eq!(schedule.salary_for(1), 2.0);
        assert_eq!(schedule.salary_for(9), 2.0);
    }

    #[test]
    fn test_cap_frozen_at_cohort_year() {
        let mut params = ParameterSet::standard();
        params.statutory.medical_cap = ScheduleFn::new(|year| year as f64);

        // Start 2025 at 30, so age 40 is 2035 and age 65 is 2060
        assert_eq!(params.medical_cap_at(40), 2035.0);
        assert_eq!(params.medical_cap_at(65), 2060.0);
        assert_eq!(params.medical_cap_at(80), 2060.0);
    }

    #[test]
    fn test_standard_is_valid() {
        assert!(ParameterSet::standard().validate().is_ok());
        assert_eq!(ParameterSet::standard().horizon_months(), 300);
        assert_eq!(ParameterSet::standard().working_years(), 35);
    }

    #[test]
    fn test_validation_rejects_bad_ages() {
        let params = ParameterSet { retirement_age: 50, ..ParameterSet::standard() };
        assert!(matches!(params.validate(), Err(ConfigError::InvalidAges { .. })));
    }

    #[test]
    fn test_validation_rejects_early_switch_for_partial() {
        let params = ParameterSet {
            plan: AnnuityPlan::Partial,
            partial_switch_age: 65,
            ..ParameterSet::standard()
        };
        assert!(matches!(params.validate(), Err(ConfigError::InvalidSwitchAge { .. })));
    }

    #[test]
    fn test_validation_rejects_bad_fraction_and_rate() {
        let params = ParameterSet { initial_pool_fraction: 1.0, ..ParameterSet::standard() };
        assert_eq!(params.validate(), Err(ConfigError::InvalidPoolFraction(1.0)));

        let params = ParameterSet { annuity_discount_rate: f64::NAN, ..ParameterSet::standard() };
        assert!(matches!(params.validate(), Err(ConfigError::InvalidRate { .. })));
    }
}
