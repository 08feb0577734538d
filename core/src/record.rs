//! Simulator output records.
//!
//! Output line layout (`;`-separated, trailing separator):
//!   race;sex;yob;init_age;cess_age;ocd_age;[age;amount;]*
//!
//! The (age, amount) pairs are only present for subjects who ever smoked.
//! A subject with init_age == SENTINEL carries no history at all, and any
//! trailing tokens on such a line are ignored.

use serde::Serialize;
use std::path::Path;
use std::str::FromStr;

use crate::{
    error::{HarnessError, HarnessResult},
    types::{Age, Code, Year, SENTINEL},
};

const FIXED_FIELDS: usize = 6;

/// One year of a subject's smoking history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SmokingYear {
    pub age: Age,
    /// Cigarettes per day. May be fractional.
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationRecord {
    pub race: Code,
    pub sex: Code,
    pub yob: Year,
    pub init_age: Age,
    pub cess_age: Age,
    pub ocd_age: Age,
    /// `None` when the subject never initiated. May be `Some(empty)` if the
    /// simulator emitted an initiation age but no pairs.
    pub smoking_history: Option<Vec<SmokingYear>>,
}

impl SimulationRecord {
    pub fn ever_smoked(&self) -> bool {
        self.smoking_history.is_some()
    }

    /// Age of the first history entry, if any.
    pub fn first_smoking_age(&self) -> Option<Age> {
        self.smoking_history.as_ref()?.first().map(|y| y.age)
    }

    /// Parse one output line. `line_no` is 1-based and only used in errors.
    pub fn parse(line: &str, line_no: usize) -> HarnessResult<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let line = line.strip_suffix(';').unwrap_or(line);
        let tokens: Vec<&str> = line.split(';').collect();

        if tokens.len() < FIXED_FIELDS {
            return Err(HarnessError::MalformedRecord {
                line: line_no,
                reason: format!("expected at least {FIXED_FIELDS} fields, got {}", tokens.len()),
            });
        }

        let init_age: Age = field(&tokens, 3, "init_age", line_no)?;
        let smoking_history = if init_age == SENTINEL {
            None
        } else {
            Some(parse_history(&tokens[FIXED_FIELDS..], line_no)?)
        };

        Ok(Self {
            race: field(&tokens, 0, "race", line_no)?,
            sex: field(&tokens, 1, "sex", line_no)?,
            yob: field(&tokens, 2, "yob", line_no)?,
            init_age,
            cess_age: field(&tokens, 4, "cess_age", line_no)?,
            ocd_age: field(&tokens, 5, "ocd_age", line_no)?,
            smoking_history,
        })
    }
}

fn field<T: FromStr>(tokens: &[&str], idx: usize, name: &str, line_no: usize) -> HarnessResult<T> {
    let raw = tokens[idx].trim();
    raw.parse().map_err(|_| HarnessError::MalformedRecord {
        line: line_no,
        reason: format!("{name} is not numeric: '{raw}'"),
    })
}

fn parse_history(tokens: &[&str], line_no: usize) -> HarnessResult<Vec<SmokingYear>> {
    if tokens.len() % 2 != 0 {
        return Err(HarnessError::MalformedRecord {
            line: line_no,
            reason: format!("odd number of history tokens ({})", tokens.len()),
        });
    }
    tokens
        .chunks_exact(2)
        .map(|pair| -> HarnessResult<SmokingYear> {
            Ok(SmokingYear {
                age: field(pair, 0, "history age", line_no)?,
                amount: field(pair, 1, "history amount", line_no)?,
            })
        })
        .collect()
}

/// All records for one cohort year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cohort {
    pub year: Year,
    pub records: Vec<SimulationRecord>,
}

impl Cohort {
    /// Parse a whole output file's text. Blank lines are skipped.
    /// A single malformed line fails the whole cohort.
    pub fn parse(year: Year, text: &str) -> HarnessResult<Self> {
        let records = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| SimulationRecord::parse(line, idx + 1))
            .collect::<HarnessResult<Vec<_>>>()?;
        Ok(Self { year, records })
    }

    pub fn load(year: Year, path: &Path) -> HarnessResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        Self::parse(year, &text)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimulationRecord> {
        self.records.iter()
    }

    /// Subjects with a history key, empty or not.
    pub fn smokers(&self) -> impl Iterator<Item = &SimulationRecord> {
        self.records.iter().filter(|r| r.ever_smoked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carriage_return_is_stripped() {
        let record = SimulationRecord::parse("0;0;1990;-999;-999;77;\r", 1).unwrap();
        assert_eq!(record.ocd_age, 77);
    }

    #[test]
    fn sentinel_init_ignores_trailing_tokens() {
        let record = SimulationRecord::parse("0;0;1990;-999;-999;77;12;5;", 1).unwrap();
        assert_eq!(record.smoking_history, None);
    }

    #[test]
    fn first_smoking_age_reads_first_pair() {
        let record = SimulationRecord::parse("0;0;1990;10;15;99;12;5;14;10;", 1).unwrap();
        assert_eq!(record.first_smoking_age(), Some(12));
    }
}
