//! Statistics reporter tests: prevalence, age bands, smoking histories.

use smokehist_core::{
    config::{Thresholds, Tolerance},
    error::HarnessError,
    record::{Cohort, SmokingYear},
    report::{
        age_values, is_switcher, median, prevalence, summarize_ages, summarize_histories,
        AgeField, Bound, YearReport,
    },
    rng::SimulatorSeeds,
};

const CUTOFF: i32 = 2050;

fn cohort(year: i32, lines: &[&str]) -> Cohort {
    Cohort::parse(year, &lines.join("\n")).expect("valid cohort")
}

fn amounts(values: &[f64]) -> Vec<SmokingYear> {
    values
        .iter()
        .enumerate()
        .map(|(i, &amount)| SmokingYear { age: 20 + i as i32, amount })
        .collect()
}

// ── Prevalence ─────────────────────────────────────────────────

#[test]
fn prevalence_counts_sentinel_ocd_and_later_ocd() {
    let c = cohort(1990, &[
        "0;0;1990;12;-999;-999;12;20;",
        "0;0;1990;-999;-999;80;",
    ]);
    assert_eq!(prevalence(&c).unwrap(), 0.5);

    let c = cohort(1990, &[
        "0;0;1990;-999;-999;-999;",
        "0;0;1990;12;30;60;12;20;13;20;",
    ]);
    assert_eq!(prevalence(&c).unwrap(), 0.5, "Sentinel ocd without history is not a smoker");
}

#[test]
fn prevalence_comparison_is_numeric() {
    // "100" < "12" as text; numerically 100 > 12.
    let c = cohort(1990, &["0;0;1990;12;-999;100;12;20;"]);
    assert_eq!(prevalence(&c).unwrap(), 1.0);
}

#[test]
fn death_at_first_smoking_age_is_not_prevalent() {
    let c = cohort(1990, &["0;0;1990;12;-999;12;12;20;"]);
    assert_eq!(prevalence(&c).unwrap(), 0.0);
}

#[test]
fn prevalence_of_empty_cohort_is_an_error() {
    let empty = Cohort { year: 1990, records: Vec::new() };
    assert!(matches!(prevalence(&empty), Err(HarnessError::EmptyCohort)));
}

// ── Ages ───────────────────────────────────────────────────────

#[test]
fn median_filters_sentinel_and_averages_middle_pair() {
    let c = cohort(1990, &[
        "0;0;1990;8;-999;50;8;1;",
        "0;0;1990;8;-999;50;8;1;",
        "0;0;1990;20;-999;50;20;1;",
        "0;0;1990;-999;-999;50;",
    ]);
    let values = age_values(&c, AgeField::InitAge);
    assert_eq!(values, vec![8, 8, 20]);

    let summary = summarize_ages(&c, AgeField::InitAge, &Thresholds::default(), CUTOFF).unwrap();
    assert_eq!((summary.min, summary.max), (8, 20));
    assert_eq!(summary.median, 8.0);

    // [8, 8, 20] is a true median of 8.0, as numpy computes it; 14.0 needs an even split.
    assert_eq!(median(&[8, 20]), Some(14.0));
    assert_eq!(median(&[8, 8, 20, 20]), Some(14.0));
    assert_eq!(median(&[]), None);
}

#[test]
fn age_summary_renders_like_the_console_report() {
    let c = cohort(1990, &["0;0;1990;8;-999;50;8;1;", "0;0;1990;20;-999;50;20;1;"]);
    let summary = summarize_ages(&c, AgeField::InitAge, &Thresholds::default(), CUTOFF).unwrap();
    assert_eq!(summary.to_string(), "init_age = 8, 20, 14.0 (min, max, median)");
}

#[test]
fn all_sentinel_field_is_an_error() {
    let c = cohort(1990, &["0;0;1990;-999;-999;50;"]);
    let err = summarize_ages(&c, AgeField::CessAge, &Thresholds::default(), CUTOFF).unwrap_err();
    assert!(matches!(err, HarnessError::NoValues { field: "cess_age" }));
}

#[test]
fn late_initiation_minimum_warns() {
    let c = cohort(1990, &["0;0;1990;16;-999;50;16;1;"]);
    let summary = summarize_ages(&c, AgeField::InitAge, &Thresholds::default(), CUTOFF).unwrap();
    assert_eq!(summary.anomalies.len(), 1);
    assert_eq!(summary.anomalies[0].bound, Bound::Min);
    assert_eq!(summary.anomalies[0].to_string(), "WARNING: weird min init age, 16");
}

#[test]
fn ocd_minimum_must_be_zero() {
    let c = cohort(1990, &["0;0;1990;-999;-999;1;", "0;0;1990;-999;-999;95;"]);
    let summary = summarize_ages(&c, AgeField::OcdAge, &Thresholds::default(), CUTOFF).unwrap();
    assert_eq!(summary.anomalies.len(), 1);
    assert_eq!(summary.anomalies[0].to_string(), "WARNING: weird min ocd age, 1");
}

#[test]
fn max_at_cutoff_year_is_accepted() {
    // 1990 + 60 == 2050: truncated by the cutoff, not weird.
    let c = cohort(1990, &["0;0;1990;-999;-999;0;", "0;0;1990;-999;-999;60;"]);
    let summary = summarize_ages(&c, AgeField::OcdAge, &Thresholds::default(), CUTOFF).unwrap();
    assert!(summary.anomalies.is_empty(), "unexpected {:?}", summary.anomalies);

    let c = cohort(1980, &["0;0;1980;-999;-999;0;", "0;0;1980;-999;-999;60;"]);
    let summary = summarize_ages(&c, AgeField::OcdAge, &Thresholds::default(), CUTOFF).unwrap();
    assert_eq!(summary.anomalies.len(), 1);
    assert_eq!(summary.anomalies[0].to_string(), "WARNING: weird max ocd age, 60");
}

#[test]
fn extreme_ages_warn_instead_of_overflowing() {
    let c = cohort(1990, &["0;0;1990;-2147483648;-999;50;-2147483648;1;"]);
    let summary = summarize_ages(&c, AgeField::InitAge, &Thresholds::default(), CUTOFF).unwrap();
    assert_eq!(summary.anomalies.len(), 1);
    assert_eq!(summary.anomalies[0].value, i32::MIN);

    let c = cohort(1990, &["0;0;1990;-999;-999;0;", "0;0;1990;-999;-999;2147483647;"]);
    let summary = summarize_ages(&c, AgeField::OcdAge, &Thresholds::default(), CUTOFF).unwrap();
    assert_eq!(summary.anomalies.len(), 1);
    assert_eq!(summary.anomalies[0].bound, Bound::Max);
}

#[test]
fn init_max_is_unchecked_by_default() {
    let c = cohort(1990, &["0;0;1990;8;-999;50;8;1;", "0;0;1990;40;-999;50;40;1;"]);
    let summary = summarize_ages(&c, AgeField::InitAge, &Thresholds::default(), CUTOFF).unwrap();
    assert!(summary.anomalies.is_empty());
}

#[test]
fn thresholds_are_configurable() {
    let mut thresholds = Thresholds::default();
    thresholds.init_age.max = Some(Tolerance::new(30, 5));
    let c = cohort(1990, &["0;0;1990;8;-999;50;8;1;", "0;0;1990;40;-999;50;40;1;"]);
    let summary = summarize_ages(&c, AgeField::InitAge, &thresholds, CUTOFF).unwrap();
    assert_eq!(summary.anomalies.len(), 1);
    assert_eq!(summary.anomalies[0].to_string(), "WARNING: weird max init age, 40");
}

// ── Smoking histories ──────────────────────────────────────────

#[test]
fn switcher_is_detected_by_non_integral_mean() {
    assert!(!is_switcher(&amounts(&[5.0, 5.0, 5.0])));
    assert!(is_switcher(&amounts(&[5.0, 6.0])));
    assert!(!is_switcher(&[]));
}

#[test]
fn history_summary_flattens_across_subjects() {
    let c = cohort(1990, &[
        "0;0;1990;12;14;70;12;5;13;5;14;5;",
        "0;0;1990;15;-999;80;15;5;16;6;",
        "0;0;1990;-999;-999;90;",
    ]);
    let summary = summarize_histories(&c).unwrap();

    assert_eq!(summary.subjects, 2);
    assert_eq!((summary.min_age, summary.max_age), (12, 16));
    assert_eq!((summary.min_amount, summary.max_amount), (5.0, 6.0));
    assert!((summary.mean_amount - 26.0 / 5.0).abs() < 1e-12);
    assert_eq!(summary.switchers, 1);
    assert_eq!(summary.switcher_fraction, 0.5);
    assert_eq!(summary.lines()[2], "Fraction of switchers = 0.5");
}

#[test]
fn cohort_without_histories_is_an_error() {
    let c = cohort(1990, &["0;0;1990;-999;-999;90;"]);
    assert!(matches!(
        summarize_histories(&c),
        Err(HarnessError::NoValues { field: "smoking_history" })
    ));
}

// ── Year report ────────────────────────────────────────────────

#[test]
fn year_report_lines_follow_console_order() {
    let c = cohort(1990, &[
        "0;0;1990;8;15;95;8;10;9;10;",
        "0;0;1990;-999;-999;0;",
        "0;0;1990;10;92;96;10;10;11;10;",
        "0;0;1990;-999;-999;50;",
    ]);
    let seeds = SimulatorSeeds { initiation: 1, cessation: 2, other_cod: 3, individual: 4 };
    let report = YearReport::compile(&c, seeds, &Thresholds::default(), CUTOFF).unwrap();

    let lines = report.lines();
    assert_eq!(lines[0], "1990");
    assert_eq!(lines[1], "nSims = 4");
    assert_eq!(lines[2], "prevalence = 0.5");
    assert_eq!(lines[3], "init_age = 8, 10, 9.0 (min, max, median)");
    assert!(lines.iter().any(|l| l.starts_with("Smoking ages: min = 8, max = 11")));
    assert_eq!(report.anomalies().count(), 0);
}
