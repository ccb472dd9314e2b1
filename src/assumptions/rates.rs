//! Contribution rates and account allocation bands

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Employee/employer contribution rates as fractions of the contribution base
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePair {
    pub employee: f64,
    pub employer: f64,
}

impl RatePair {
    pub fn total(&self) -> f64 {
        self.employee + self.employer
    }
}

/// Two-band contribution rate table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionRates {
    /// First age at which the late-career rates apply
    pub late_career_age: u32,
    pub standard: RatePair,
    pub late_career: RatePair,
}

impl Default for ContributionRates {
    fn default() -> Self {
        Self {
            late_career_age: 56,
            standard: RatePair { employee: 0.20, employer: 0.17 },
            late_career: RatePair { employee: 0.17, employer: 0.155 },
        }
    }
}

impl ContributionRates {
    pub fn for_age(&self, age: u32) -> RatePair {
        if age >= self.late_career_age {
            self.late_career
        } else {
            self.standard
        }
    }
}

/// Split of the combined contribution across the three working accounts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationBand {
    /// Band applies up to and including this age
    pub max_age: u32,
    pub ordinary: f64,
    pub special: f64,
    pub medical: f64,
}

impl AllocationBand {
    pub fn total(&self) -> f64 {
        self.ordinary + self.special + self.medical
    }
}

/// Age-banded allocation table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationTable {
    /// Bands sorted by `max_age`; the last band covers all higher ages
    bands: Vec<AllocationBand>,
}

impl Default for AllocationTable {
    fn default() -> Self {
        Self {
            bands: vec![
                AllocationBand { max_age: 35, ordinary: 0.6217, special: 0.1621, medical: 0.2162 },
                AllocationBand { max_age: 45, ordinary: 0.5677, special: 0.1891, medical: 0.2432 },
                AllocationBand { max_age: 50, ordinary: 0.5136, special: 0.2162, medical: 0.2702 },
                AllocationBand { max_age: 55, ordinary: 0.4055, special: 0.3108, medical: 0.2837 },
                AllocationBand { max_age: 60, ordinary: 0.3694, special: 0.3076, medical: 0.3230 },
                AllocationBand { max_age: 65, ordinary: 0.1493, special: 0.4029, medical: 0.4478 },
            ],
        }
    }
}

impl AllocationTable {
    const SUM_TOLERANCE: f64 = 1e-3;

    pub fn new(mut bands: Vec<AllocationBand>) -> Result<Self, ConfigError> {
        if bands.is_empty() {
            return Err(ConfigError::EmptySchedule("allocation"));
        }
        bands.sort_by_key(|b| b.max_age);
        let table = Self { bands };
        table.validate()?;
        Ok(table)
    }

    /// Each band must split the whole contribution, with no negative share
    pub fn validate(&self) -> Result<(), ConfigError> {
        for band in &self.bands {
            let total = band.total();
            let negative = band.ordinary < 0.0 || band.special < 0.0 || band.medical < 0.0;
            if negative || (total - 1.0).abs() > Self::SUM_TOLERANCE {
                return Err(ConfigError::InvalidAllocation { max_age: band.max_age, total });
            }
        }
        Ok(())
    }

    pub fn for_age(&self, age: u32) -> &AllocationBand {
        self.bands
            .iter()
            .find(|b| age <= b.max_age)
            .unwrap_or_else(|| &self.bands[self.bands.len() - 1])
    }

    pub fn bands(&self) -> &[AllocationBand] {
        &self.bands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contribution_bands() {
        let rates = ContributionRates::default();
        assert_eq!(rates.for_age(30), rates.standard);
        assert_eq!(rates.for_age(55), rates.standard);
        assert_eq!(rates.for_age(56), rates.late_career);
        assert!((rates.standard.total() - 0.37).abs() < 1e-12);
    }

    #[test]
    fn test_allocation_lookup() {
        let table = AllocationTable::default();
        assert_eq!(table.for_age(25).max_age, 35);
        assert_eq!(table.for_age(35).max_age, 35);
        assert_eq!(table.for_age(36).max_age, 45);
        // Beyond the last band the last band applies
        assert_eq!(table.for_age(80).max_age, 65);
    }

    #[test]
    fn test_default_bands_sum_to_one() {
        assert!(AllocationTable::default().validate().is_ok());
    }

    #[test]
    fn test_bad_band_rejected() {
        let result = AllocationTable::new(vec![AllocationBand {
            max_age: 40,
            ordinary: 0.5,
            special: 0.5,
            medical: 0.5,
        }]);
        assert!(matches!(result, Err(ConfigError::InvalidAllocation { max_age: 40, .. })));
    }
}
