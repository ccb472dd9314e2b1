//! Load member parameter sets from a CSV file

use std::path::Path;

use csv::Reader;

use super::{ParameterSet, SalaryPath};
use crate::assumptions::Statutory;
use crate::error::{ConfigError, LoadError};

/// Raw CSV row matching members.csv columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    member_id: u32,
    start_age: u32,
    retirement_age: u32,
    end_age: u32,
    annual_salary: f64,
    salary_growth: f64,
    plan: String,
    target: String,
    allow_cash_withdrawal: bool,
}

/// A member with the parameter set for their run
#[derive(Debug, Clone)]
pub struct Member {
    pub member_id: u32,
    pub params: ParameterSet,
}

impl CsvRow {
    fn to_member(self, statutory: &Statutory) -> Result<Member, ConfigError> {
        let params = ParameterSet {
            start_age: self.start_age,
            retirement_age: self.retirement_age,
            end_age: self.end_age,
            salary: SalaryPath::Growth {
                start: self.annual_salary,
                rate: self.salary_growth,
            },
            plan: self.plan.parse()?,
            target: self.target.parse()?,
            allow_cash_withdrawal: self.allow_cash_withdrawal,
            statutory: statutory.clone(),
            ..ParameterSet::standard()
        };
        params.validate()?;

        Ok(Member {
            member_id: self.member_id,
            params,
        })
    }
}

/// Load members from any reader, sharing one set of statutory tables
pub fn load_members_from_reader<R: std::io::Read>(
    reader: R,
    statutory: &Statutory,
) -> Result<Vec<Member>, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut members = Vec::new();

    for (idx, result) in csv_reader.deserialize().enumerate() {
        let row: CsvRow = result?;
        let member = row
            .to_member(statutory)
            .map_err(|source| LoadError::Config { row: idx + 1, source })?;
        members.push(member);
    }

    Ok(members)
}

/// Load all members from a CSV file
pub fn load_members<P: AsRef<Path>>(path: P, statutory: &Statutory) -> Result<Vec<Member>, LoadError> {
    let file = std::fs::File::open(path)?;
    load_members_from_reader(file, statutory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::{AnnuityPlan, TargetPolicy};

    const HEADER: &str =
        "member_id,start_age,retirement_age,end_age,annual_salary,salary_growth,plan,target,allow_cash_withdrawal\n";

    #[test]
    fn test_load_members() {
        let data = format!(
            "{}1,30,65,90,60000,0.03,level,full,false\n2,40,65,95,90000,0.0,partial,basic,true\n",
            HEADER
        );
        let members = load_members_from_reader(data.as_bytes(), &Statutory::default_tables()).unwrap();

        assert_eq!(members.len(), 2);
        assert_eq!(members[0].member_id, 1);
        assert_eq!(members[0].params.plan, AnnuityPlan::Level);
        assert_eq!(members[1].params.plan, AnnuityPlan::Partial);
        assert_eq!(members[1].params.target, TargetPolicy::Basic);
        assert!(members[1].params.allow_cash_withdrawal);
        assert_eq!(members[1].params.end_age, 95);
    }

    #[test]
    fn test_unknown_plan_reports_row() {
        let data = format!("{}1,30,65,90,60000,0.03,lump_sum,full,false\n", HEADER);
        let err = load_members_from_reader(data.as_bytes(), &Statutory::default_tables()).unwrap_err();

        match err {
            LoadError::Config { row, source } => {
                assert_eq!(row, 1);
                assert_eq!(source, ConfigError::UnknownPlan("lump_sum".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_bundled_members() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/members.csv");
        let members = load_members(path, &Statutory::default_tables()).expect("bundled members should load");
        assert!(!members.is_empty());
    }
}
