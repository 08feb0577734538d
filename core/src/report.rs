//! Descriptive statistics and sanity warnings for one cohort.
//!
//! RULE: Nothing here prints. Every statistic and warning is returned as
//! data; the runner decides how to render it. Anomalies are not errors:
//! a cohort with weird ages still produces a full report.

use serde::Serialize;
use std::fmt;

use crate::{
    config::{AgeBand, Thresholds},
    error::{HarnessError, HarnessResult},
    record::{Cohort, SimulationRecord, SmokingYear},
    rng::SimulatorSeeds,
    types::{Age, Year, SENTINEL},
};

// ── Prevalence ─────────────────────────────────────────────────

/// A subject counts as a smoker when they have a history and either
/// their ocd_age is the sentinel or it is numerically greater than
/// the age of their first history entry.
pub fn is_prevalent_smoker(record: &SimulationRecord) -> bool {
    if !record.ever_smoked() {
        return false;
    }
    if record.ocd_age == SENTINEL {
        return true;
    }
    record
        .first_smoking_age()
        .is_some_and(|first| record.ocd_age > first)
}

pub fn prevalence(cohort: &Cohort) -> HarnessResult<f64> {
    if cohort.is_empty() {
        return Err(HarnessError::EmptyCohort);
    }
    let smokers = cohort.iter().filter(|r| is_prevalent_smoker(r)).count();
    Ok(smokers as f64 / cohort.len() as f64)
}

// ── Age summaries ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeField {
    InitAge,
    CessAge,
    OcdAge,
}

impl AgeField {
    pub const ALL: [AgeField; 3] = [Self::InitAge, Self::CessAge, Self::OcdAge];

    pub fn key(&self) -> &'static str {
        match self {
            Self::InitAge => "init_age",
            Self::CessAge => "cess_age",
            Self::OcdAge  => "ocd_age",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::InitAge => "init",
            Self::CessAge => "cess",
            Self::OcdAge  => "ocd",
        }
    }

    pub fn value(&self, record: &SimulationRecord) -> Age {
        match self {
            Self::InitAge => record.init_age,
            Self::CessAge => record.cess_age,
            Self::OcdAge  => record.ocd_age,
        }
    }

    pub fn band<'a>(&self, thresholds: &'a Thresholds) -> &'a AgeBand {
        match self {
            Self::InitAge => &thresholds.init_age,
            Self::CessAge => &thresholds.cess_age,
            Self::OcdAge  => &thresholds.ocd_age,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Min,
    Max,
}

/// An out-of-band min or max.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    pub field: AgeField,
    pub bound: Bound,
    pub value: Age,
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = match self.bound {
            Bound::Min => "min",
            Bound::Max => "max",
        };
        write!(f, "WARNING: weird {bound} {} age, {}", self.field.label(), self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeSummary {
    pub field: AgeField,
    pub min: Age,
    pub max: Age,
    pub median: f64,
    pub anomalies: Vec<Anomaly>,
}

impl fmt::Display for AgeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {}, {}, {:?} (min, max, median)",
            self.field.key(),
            self.min,
            self.max,
            self.median
        )
    }
}

/// Median of the values; the mean of the two middle values for even counts.
pub fn median(values: &[Age]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0)
    } else {
        Some(sorted[mid] as f64)
    }
}

/// Non-sentinel values of `field` across the cohort.
pub fn age_values(cohort: &Cohort, field: AgeField) -> Vec<Age> {
    cohort
        .iter()
        .map(|r| field.value(r))
        .filter(|&age| age != SENTINEL)
        .collect()
}

pub fn summarize_ages(
    cohort: &Cohort,
    field: AgeField,
    thresholds: &Thresholds,
    cutoff: Year,
) -> HarnessResult<AgeSummary> {
    let values = age_values(cohort, field);
    let (Some(&min), Some(&max), Some(median)) =
        (values.iter().min(), values.iter().max(), median(&values))
    else {
        return Err(HarnessError::NoValues { field: field.key() });
    };

    let anomalies = check_band(field, field.band(thresholds), min, max, cohort.year, cutoff);
    for anomaly in &anomalies {
        log::warn!("Cohort {}: {anomaly}", cohort.year);
    }

    Ok(AgeSummary { field, min, max, median, anomalies })
}

fn check_band(
    field: AgeField,
    band: &AgeBand,
    min: Age,
    max: Age,
    year: Year,
    cutoff: Year,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    if band.min.is_some_and(|t| t.is_violated_by(min)) {
        anomalies.push(Anomaly { field, bound: Bound::Min, value: min });
    }
    let at_cutoff =
        band.max_exempt_at_cutoff && i64::from(year) + i64::from(max) == i64::from(cutoff);
    if !at_cutoff && band.max.is_some_and(|t| t.is_violated_by(max)) {
        anomalies.push(Anomaly { field, bound: Bound::Max, value: max });
    }
    anomalies
}

// ── Smoking histories ──────────────────────────────────────────

/// A subject whose mean reported amount is non-integral changed intensity.
pub fn is_switcher(history: &[SmokingYear]) -> bool {
    if history.is_empty() {
        return false;
    }
    let mean = history.iter().map(|y| y.amount).sum::<f64>() / history.len() as f64;
    mean.fract() != 0.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    /// Subjects with a non-empty history.
    pub subjects: usize,
    pub min_age: Age,
    pub max_age: Age,
    pub min_amount: f64,
    pub max_amount: f64,
    pub mean_amount: f64,
    pub switchers: usize,
    pub switcher_fraction: f64,
}

impl HistorySummary {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Smoking ages: min = {}, max = {}", self.min_age, self.max_age),
            format!(
                "Smoking amounts: min = {:?}, max = {:?}, mean = {:?}",
                self.min_amount, self.max_amount, self.mean_amount
            ),
            format!("Fraction of switchers = {:?}", self.switcher_fraction),
        ]
    }
}

pub fn summarize_histories(cohort: &Cohort) -> HarnessResult<HistorySummary> {
    let histories: Vec<&[SmokingYear]> = cohort
        .iter()
        .filter_map(|r| r.smoking_history.as_deref())
        .filter(|h| !h.is_empty())
        .collect();
    if histories.is_empty() {
        return Err(HarnessError::NoValues { field: "smoking_history" });
    }

    let mut min_age = Age::MAX;
    let mut max_age = Age::MIN;
    let mut min_amount = f64::INFINITY;
    let mut max_amount = f64::NEG_INFINITY;
    let mut total_amount = 0.0;
    let mut count = 0usize;
    for entry in histories.iter().flat_map(|h| h.iter()) {
        min_age = min_age.min(entry.age);
        max_age = max_age.max(entry.age);
        min_amount = min_amount.min(entry.amount);
        max_amount = max_amount.max(entry.amount);
        total_amount += entry.amount;
        count += 1;
    }

    let switchers = histories.iter().filter(|h| is_switcher(h)).count();

    Ok(HistorySummary {
        subjects: histories.len(),
        min_age,
        max_age,
        min_amount,
        max_amount,
        mean_amount: total_amount / count as f64,
        switchers,
        switcher_fraction: switchers as f64 / histories.len() as f64,
    })
}

// ── Year report ────────────────────────────────────────────────

/// Everything the harness reports for one cohort year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearReport {
    pub year: Year,
    pub subjects: usize,
    pub seeds: SimulatorSeeds,
    pub prevalence: f64,
    pub ages: Vec<AgeSummary>,
    pub history: HistorySummary,
}

impl YearReport {
    pub fn compile(
        cohort: &Cohort,
        seeds: SimulatorSeeds,
        thresholds: &Thresholds,
        cutoff: Year,
    ) -> HarnessResult<Self> {
        let prevalence = prevalence(cohort)?;
        let ages = AgeField::ALL
            .iter()
            .map(|&field| summarize_ages(cohort, field, thresholds, cutoff))
            .collect::<HarnessResult<Vec<_>>>()?;
        let history = summarize_histories(cohort)?;
        Ok(Self {
            year: cohort.year,
            subjects: cohort.len(),
            seeds,
            prevalence,
            ages,
            history,
        })
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &Anomaly> {
        self.ages.iter().flat_map(|a| a.anomalies.iter())
    }

    /// Console rendering, one entry per line.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            self.year.to_string(),
            format!("nSims = {}", self.subjects),
            format!("prevalence = {:?}", self.prevalence),
        ];
        for summary in &self.ages {
            lines.push(summary.to_string());
            lines.extend(summary.anomalies.iter().map(|a| a.to_string()));
        }
        lines.extend(self.history.lines());
        lines
    }
}
