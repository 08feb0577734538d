//! The harness loop — one simulator pass per cohort year.
//!
//! PER-YEAR ORDER (fixed):
//!   1. Delete stale input/output files
//!   2. Write the synthetic input file
//!   3. Draw seeds and invoke the simulator
//!   4. Archive the output as <archive_prefix><year>.out
//!   5. Liveness check on the output line count
//!   6. Parse the cohort and compile the report
//!
//! RULES:
//!   - Years share only the two transient file paths, never in-memory state.
//!   - A failed year is recorded and the loop moves on, unless fail_fast is set.
//!   - Archived outputs survive cleanup(); the transient files do not.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::{
    config::HarnessConfig,
    error::{HarnessError, HarnessResult},
    input::{write_input_file, SyntheticSubject},
    record::Cohort,
    report::YearReport,
    rng::{SeedBank, SeedSlot},
    simulator::{Invocation, RunOutcome, Simulator},
    types::Year,
};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum YearOutcome {
    Completed {
        command_line: String,
        run: RunOutcome,
        archive: PathBuf,
        report: YearReport,
    },
    Failed {
        year: Year,
        command_line: String,
        error: String,
    },
}

impl YearOutcome {
    pub fn year(&self) -> Year {
        match self {
            Self::Completed { report, .. } => report.year,
            Self::Failed { year, .. } => *year,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Result of a single successful year.
#[derive(Debug, Clone)]
pub struct YearRun {
    pub command_line: String,
    pub run: RunOutcome,
    pub archive: PathBuf,
    pub report: YearReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub master_seed: u64,
    pub cohort_size: usize,
    pub years: Vec<YearOutcome>,
}

impl RunSummary {
    pub fn failed_years(&self) -> Vec<Year> {
        self.years.iter().filter(|o| o.is_failed()).map(|o| o.year()).collect()
    }

    pub fn all_succeeded(&self) -> bool {
        !self.years.iter().any(|o| o.is_failed())
    }
}

pub struct Harness<S: Simulator> {
    pub config: HarnessConfig,
    simulator: S,
    seed_bank: SeedBank,
}

impl<S: Simulator> Harness<S> {
    pub fn new(mut config: HarnessConfig, simulator: S) -> HarnessResult<Self> {
        config.validate()?;
        config.resolve_work_dir()?;
        let seed_bank = match config.master_seed {
            Some(seed) => SeedBank::new(seed),
            None => SeedBank::from_entropy(),
        };
        log::info!(
            "Harness ready: simulator={} master_seed={} cohort_size={}",
            simulator.name(),
            seed_bank.master_seed(),
            config.cohort_size
        );
        Ok(Self { config, simulator, seed_bank })
    }

    pub fn master_seed(&self) -> u64 {
        self.seed_bank.master_seed()
    }

    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    pub fn invocation(&self, year: Year) -> Invocation {
        Invocation {
            data_dir: self.config.data_dir.clone(),
            seeds: self.seed_bank.for_year(year),
            input: self.config.input_path(),
            output: self.config.output_path(),
            output_type: self.config.output_type,
            immediate_cessation_year: self.config.immediate_cessation_year,
            cutoff_year: self.config.cutoff_year,
        }
    }

    /// The command line the simulator will be handed for `year`.
    pub fn command_line(&self, year: Year) -> String {
        self.simulator.describe(&self.invocation(year))
    }

    /// Run one cohort year end to end.
    pub fn run_year(&mut self, year: Year) -> HarnessResult<YearRun> {
        self.run_year_with(year, |_| {})
    }

    /// Run one cohort year, calling `on_launch` with the command line
    /// right before the simulator starts.
    pub fn run_year_with(
        &mut self,
        year: Year,
        on_launch: impl FnOnce(&str),
    ) -> HarnessResult<YearRun> {
        let input = self.config.input_path();
        let output = self.config.output_path();

        remove_if_exists(&input)?;
        remove_if_exists(&output)?;

        let subject = SyntheticSubject::new(self.config.race, self.config.sex, year);
        write_input_file(&input, subject, self.config.cohort_size)?;

        let invocation = self.invocation(year);
        let command_line = self.simulator.describe(&invocation);
        for slot in SeedSlot::ALL {
            log::debug!("Year {year}: {} seed = {}", slot.name(), invocation.seeds.get(slot));
        }
        log::info!("Year {year}: {command_line}");
        on_launch(&command_line);
        let run = self.simulator.run(&invocation)?;

        let archive = self.config.archive_path(year);
        if output.exists() {
            std::fs::copy(&output, &archive).map_err(|e| HarnessError::io(&archive, e))?;
            log::debug!("Archived {} to {}", output.display(), archive.display());
        }

        let lines = count_lines(&output)?;
        if lines <= self.config.min_output_lines {
            return Err(HarnessError::NoOutput {
                year,
                lines,
                required: self.config.min_output_lines,
            });
        }

        let cohort = Cohort::load(year, &output)?;
        let report = YearReport::compile(
            &cohort,
            invocation.seeds,
            &self.config.thresholds,
            self.config.effective_cutoff(),
        )?;
        log::info!(
            "Year {year}: {} subjects, prevalence {:.4}",
            report.subjects,
            report.prevalence
        );

        Ok(YearRun { command_line, run, archive, report })
    }

    /// Run every configured year.
    pub fn run_all(&mut self) -> RunSummary {
        self.run_all_with(|_, _| {}, |_| {})
    }

    /// Run every configured year. `on_launch` fires right before each
    /// simulator run, `on_year` as each year finishes.
    pub fn run_all_with(
        &mut self,
        mut on_launch: impl FnMut(Year, &str),
        mut on_year: impl FnMut(&YearOutcome),
    ) -> RunSummary {
        let mut summary = RunSummary {
            started_at: Utc::now(),
            master_seed: self.master_seed(),
            cohort_size: self.config.cohort_size,
            years: Vec::new(),
        };

        for year in self.config.years.years() {
            let outcome = match self.run_year_with(year, |cmd| on_launch(year, cmd)) {
                Ok(run) => YearOutcome::Completed {
                    command_line: run.command_line,
                    run: run.run,
                    archive: run.archive,
                    report: run.report,
                },
                Err(e) => {
                    log::error!("Year {year} failed: {e}");
                    YearOutcome::Failed {
                        year,
                        command_line: self.command_line(year),
                        error: e.to_string(),
                    }
                }
            };
            on_year(&outcome);
            let stop = outcome.is_failed() && self.config.fail_fast;
            summary.years.push(outcome);
            if stop {
                log::warn!("fail_fast set, stopping after year {year}");
                break;
            }
        }
        summary
    }

    /// Remove the transient input/output files. Archives are kept.
    pub fn cleanup(&self) -> HarnessResult<()> {
        remove_if_exists(&self.config.input_path())?;
        remove_if_exists(&self.config.output_path())?;
        Ok(())
    }
}

/// Delete `path`; a missing file is not an error.
pub fn remove_if_exists(path: &Path) -> HarnessResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(HarnessError::io(path, e)),
    }
}

/// Count non-blank lines; a missing file counts as zero.
pub fn count_lines(path: &Path) -> HarnessResult<usize> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(HarnessError::io(path, e)),
    };
    let mut count = 0;
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| HarnessError::io(path, e))?;
        if !line.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}
