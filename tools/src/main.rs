//! shg-harness: sanity-check runner for the smoking-history simulator.
//!
//! Usage:
//!   shg-harness --simulator ./lbc_smokehist_osx64.exe --data-dir data/shg2p0
//!   shg-harness --config harness.json --n 5000 --start-year 1950 --end-year 2000 --step 25
//!   shg-harness --seed 12345 --cutoff 2040 --fail-fast --json summary.json

use anyhow::{bail, Result};
use smokehist_core::{
    config::HarnessConfig,
    harness::{Harness, RunSummary, YearOutcome},
    simulator::{rebuild_simulator, ExternalSimulator},
    types::Year,
};
use std::env;
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = build_config(&args)?;
    let rebuild = args.iter().any(|a| a == "--rebuild");
    let json_out = find_arg(&args, "--json").map(PathBuf::from);

    println!("Smoking history harness");
    println!("  data_dir:   {}", config.data_dir);
    println!("  work_dir:   {}", config.work_dir.display());
    println!("  n:          {}", config.cohort_size);
    println!("  years:      {:?}", config.years.years());
    println!("  cutoff:     {}", config.effective_cutoff());

    if rebuild {
        rebuild_simulator(&config.build_script);
    }

    let simulator =
        ExternalSimulator::new(config.simulator.clone()).with_working_dir(config.work_dir.clone());
    println!("  simulator:  {}", simulator.program().display());
    let mut harness = Harness::new(config, simulator)?;
    println!("  seed:       {}", harness.master_seed());

    let summary = harness.run_all_with(print_launch, print_year);
    println!();
    harness.cleanup()?;

    if let Some(path) = json_out {
        std::fs::write(&path, serde_json::to_string_pretty(&summary)?)?;
        log::info!("Run summary written to {}", path.display());
    }

    print_totals(&summary);
    if !summary.all_succeeded() {
        bail!("years failed: {:?}", summary.failed_years());
    }
    Ok(())
}

fn build_config(args: &[String]) -> Result<HarnessConfig> {
    let mut config = match find_arg(args, "--config") {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };

    if let Some(sim) = find_arg(args, "--simulator") {
        config.simulator = PathBuf::from(sim);
    }
    if let Some(dir) = find_arg(args, "--data-dir") {
        config.data_dir = dir.to_string();
    }
    if let Some(dir) = find_arg(args, "--work-dir") {
        config.work_dir = PathBuf::from(dir);
    }
    if let Some(script) = find_arg(args, "--build-script") {
        config.build_script = PathBuf::from(script);
    }
    config.cohort_size = parse_arg(args, "--n", config.cohort_size);
    config.years.start = parse_arg(args, "--start-year", config.years.start);
    config.years.end = parse_arg(args, "--end-year", config.years.end);
    config.years.step = parse_arg(args, "--step", config.years.step);
    config.output_type = parse_arg(args, "--output-type", config.output_type);
    config.immediate_cessation_year =
        parse_arg(args, "--cess-year", config.immediate_cessation_year);
    config.min_output_lines = parse_arg(args, "--min-lines", config.min_output_lines);
    if let Some(cutoff) = find_arg(args, "--cutoff").and_then(|v| v.parse().ok()) {
        config.cutoff_year = Some(cutoff);
    }
    if let Some(seed) = find_arg(args, "--seed").and_then(|v| v.parse().ok()) {
        config.master_seed = Some(seed);
    }
    if args.iter().any(|a| a == "--fail-fast") {
        config.fail_fast = true;
    }

    config.validate()?;
    config.resolve_work_dir()?;
    Ok(config)
}

fn print_launch(_year: Year, command_line: &str) {
    println!();
    println!("{command_line}");
}

fn print_year(outcome: &YearOutcome) {
    match outcome {
        YearOutcome::Completed { report, .. } => {
            for line in report.lines() {
                println!("{line}");
            }
        }
        YearOutcome::Failed { year, error, .. } => {
            println!("Run for year {year} didn't work");
            println!("  {error}");
        }
    }
}

fn print_totals(summary: &RunSummary) {
    let warnings: usize = summary
        .years
        .iter()
        .map(|o| match o {
            YearOutcome::Completed { report, .. } => report.anomalies().count(),
            YearOutcome::Failed { .. } => 0,
        })
        .sum();
    println!("=== RUN SUMMARY ===");
    println!("  master seed:  {}", summary.master_seed);
    println!("  years run:    {}", summary.years.len());
    println!("  failed:       {:?}", summary.failed_years());
    println!("  warnings:     {warnings}");
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
