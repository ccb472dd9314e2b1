//! Year-indexed statutory schedules
//!
//! The medical-account cap and the consolidation target are both published
//! per calendar year. The engine only ever sees them through [`ScheduleFn`],
//! so callers may supply any deterministic function of the year; the
//! [`StatutorySchedule`] table with linear extrapolation is the default.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Published amounts by calendar year
///
/// Serializes as a list of `(year, amount)` pairs; deserializing goes through
/// [`StatutorySchedule::new`], so an empty or negative table is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(i32, f64)>", into = "Vec<(i32, f64)>")]
pub struct StatutorySchedule {
    /// (year, amount) pairs sorted by year
    points: Vec<(i32, f64)>,
}

impl StatutorySchedule {
    /// Build a schedule from (year, amount) pairs in any order
    pub fn new(name: &'static str, mut points: Vec<(i32, f64)>) -> Result<Self, ConfigError> {
        if points.is_empty() {
            return Err(ConfigError::EmptySchedule(name));
        }
        for &(_, amount) in &points {
            if !amount.is_finite() || amount < 0.0 {
                return Err(ConfigError::InvalidAmount { name, value: amount });
            }
        }
        points.sort_by_key(|&(year, _)| year);
        points.dedup_by_key(|&mut (year, _)| year);
        Ok(Self { points })
    }

    /// Medical-account cap table
    pub fn default_medical_cap() -> Self {
        Self {
            points: vec![
                (2020, 63_000.0),
                (2021, 63_000.0),
                (2022, 66_000.0),
                (2023, 68_500.0),
                (2024, 71_500.0),
                (2025, 75_500.0),
            ],
        }
    }

    /// Consolidation target ("full" level) table
    pub fn default_retirement_target() -> Self {
        Self {
            points: vec![
                (2020, 181_000.0),
                (2021, 186_000.0),
                (2022, 192_000.0),
                (2023, 198_800.0),
                (2024, 205_800.0),
                (2025, 213_000.0),
            ],
        }
    }

    /// Amount applicable in `year`.
    ///
    /// Years inside the table interpolate linearly between neighbours, years
    /// after the last entry extrapolate along the last segment, and years
    /// before the first entry use the first amount. Never negative.
    pub fn amount_for(&self, year: i32) -> f64 {
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];

        if year <= first.0 {
            return first.1;
        }

        if year >= last.0 {
            if self.points.len() < 2 {
                return last.1;
            }
            let prev = self.points[self.points.len() - 2];
            let slope = (last.1 - prev.1) / (last.0 - prev.0) as f64;
            return (last.1 + slope * (year - last.0) as f64).max(0.0);
        }

        // Interior: find the bracketing pair
        let idx = self.points.partition_point(|&(y, _)| y <= year);
        let (y0, a0) = self.points[idx - 1];
        let (y1, a1) = self.points[idx];
        if y0 == year {
            return a0;
        }
        a0 + (a1 - a0) * (year - y0) as f64 / (y1 - y0) as f64
    }

    /// Number of published years
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Wrap the table as a caller-replaceable schedule function
    pub fn into_fn(self) -> ScheduleFn {
        ScheduleFn::new(move |year| self.amount_for(year))
    }
}

impl TryFrom<Vec<(i32, f64)>> for StatutorySchedule {
    type Error = ConfigError;

    fn try_from(points: Vec<(i32, f64)>) -> Result<Self, Self::Error> {
        Self::new("schedule", points)
    }
}

impl From<StatutorySchedule> for Vec<(i32, f64)> {
    fn from(schedule: StatutorySchedule) -> Self {
        schedule.points
    }
}

/// A year-indexed amount supplied by the caller
///
/// Cloning shares the underlying function.
#[derive(Clone)]
pub struct ScheduleFn(Arc<dyn Fn(i32) -> f64 + Send + Sync>);

impl ScheduleFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(i32) -> f64 + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Same amount in every year
    pub fn constant(amount: f64) -> Self {
        Self::new(move |_| amount)
    }

    /// Evaluate for a calendar year
    pub fn at(&self, year: i32) -> f64 {
        (self.0)(year)
    }
}

impl fmt::Debug for ScheduleFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ScheduleFn(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_years() {
        let cap = StatutorySchedule::default_medical_cap();
        assert_eq!(cap.amount_for(2020), 63_000.0);
        assert_eq!(cap.amount_for(2023), 68_500.0);
        assert_eq!(cap.amount_for(2025), 75_500.0);
    }

    #[test]
    fn test_before_first_year_uses_first_amount() {
        let cap = StatutorySchedule::default_medical_cap();
        assert_eq!(cap.amount_for(1990), 63_000.0);
    }

    #[test]
    fn test_linear_extrapolation() {
        let cap = StatutorySchedule::default_medical_cap();
        // Last segment slope is 4,000 per year
        assert_relative_eq!(cap.amount_for(2026), 79_500.0);
        assert_relative_eq!(cap.amount_for(2030), 95_500.0);
    }

    #[test]
    fn test_interpolation_between_gaps() {
        let s = StatutorySchedule::new("test", vec![(2030, 200.0), (2020, 100.0)]).unwrap();
        assert_relative_eq!(s.amount_for(2025), 150.0);
        assert_relative_eq!(s.amount_for(2035), 250.0);
    }

    #[test]
    fn test_extrapolation_never_negative() {
        let s = StatutorySchedule::new("falling", vec![(2020, 100.0), (2021, 50.0)]).unwrap();
        assert_eq!(s.amount_for(2030), 0.0);
    }

    #[test]
    fn test_single_point_is_flat() {
        let s = StatutorySchedule::new("flat", vec![(2024, 10.0)]).unwrap();
        assert_eq!(s.amount_for(2100), 10.0);
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(
            StatutorySchedule::new("cap", vec![]),
            Err(ConfigError::EmptySchedule("cap"))
        );
    }

    #[test]
    fn test_deserialize_validates_points() {
        let empty: Result<StatutorySchedule, _> = serde_json::from_str("[]");
        assert!(empty.is_err());

        let negative: Result<StatutorySchedule, _> = serde_json::from_str("[[2024, -1.0]]");
        assert!(negative.is_err());

        let s: StatutorySchedule = serde_json::from_str("[[2025, 20.0], [2024, 10.0]]").unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.amount_for(2024), 10.0);
        assert_eq!(serde_json::to_string(&s).unwrap(), "[[2024,10.0],[2025,20.0]]");
    }

    #[test]
    fn test_schedule_fn_wraps_table() {
        let f = StatutorySchedule::default_retirement_target().into_fn();
        assert_eq!(f.at(2024), 205_800.0);
        assert_eq!(ScheduleFn::constant(5.0).at(1), 5.0);
    }
}
