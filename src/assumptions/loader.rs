//! CSV-based statutory table loader
//!
//! Loads year-indexed schedules from CSV files in data/statutory/

use std::path::Path;

use serde::Deserialize;

use super::schedule::StatutorySchedule;
use crate::error::LoadError;

/// Default path to the statutory table directory
pub const DEFAULT_STATUTORY_PATH: &str = "data/statutory";

/// File holding the medical-account cap by year
pub const MEDICAL_CAP_FILE: &str = "medical_cap.csv";

/// File holding the consolidation target by year
pub const RETIREMENT_TARGET_FILE: &str = "retirement_target.csv";

#[derive(Debug, Deserialize)]
struct ScheduleRow {
    year: i32,
    amount: f64,
}

/// Load a `year,amount` schedule from any reader
pub fn load_schedule_from_reader<R: std::io::Read>(
    name: &'static str,
    reader: R,
) -> Result<StatutorySchedule, LoadError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut points = Vec::new();

    for result in csv_reader.deserialize() {
        let row: ScheduleRow = result?;
        points.push((row.year, row.amount));
    }

    Ok(StatutorySchedule::new(name, points)?)
}

/// Load a `year,amount` schedule from a file
pub fn load_schedule(name: &'static str, path: &Path) -> Result<StatutorySchedule, LoadError> {
    let file = std::fs::File::open(path)?;
    load_schedule_from_reader(name, file)
}

/// Both statutory schedules read from one directory
#[derive(Debug, Clone)]
pub struct LoadedSchedules {
    pub medical_cap: StatutorySchedule,
    pub retirement_target: StatutorySchedule,
}

impl LoadedSchedules {
    /// Load from the default location
    pub fn load_default() -> Result<Self, LoadError> {
        Self::load_from(Path::new(DEFAULT_STATUTORY_PATH))
    }

    /// Load from a specific directory
    pub fn load_from(path: &Path) -> Result<Self, LoadError> {
        let medical_cap = load_schedule("medical_cap", &path.join(MEDICAL_CAP_FILE))?;
        let retirement_target = load_schedule("retirement_target", &path.join(RETIREMENT_TARGET_FILE))?;
        log::debug!(
            "Loaded statutory tables from {}: {} cap years, {} target years",
            path.display(),
            medical_cap.len(),
            retirement_target.len()
        );
        Ok(Self { medical_cap, retirement_target })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_reader() {
        let data = "year,amount\n2024,71500\n2025,75500\n";
        let schedule = load_schedule_from_reader("cap", data.as_bytes()).unwrap();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.amount_for(2024), 71_500.0);
        assert_eq!(schedule.amount_for(2026), 79_500.0);
    }

    #[test]
    fn test_empty_file_is_config_error() {
        let data = "year,amount\n";
        let err = load_schedule_from_reader("cap", data.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Invalid(_)));
    }

    #[test]
    fn test_bad_number_is_csv_error() {
        let data = "year,amount\n2024,lots\n";
        let err = load_schedule_from_reader("cap", data.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)));
    }

    #[test]
    fn test_load_bundled_tables() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_STATUTORY_PATH);
        let loaded = LoadedSchedules::load_from(&dir).expect("bundled tables should load");
        assert_eq!(loaded.medical_cap.amount_for(2025), 75_500.0);
        assert_eq!(loaded.retirement_target.amount_for(2025), 213_000.0);
    }
}
