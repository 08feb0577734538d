//! Simulator trait and the external-process implementation.
//!
//! RULE: The harness never inspects how a simulator produces its output.
//! It hands over an Invocation and later reads whatever landed at the
//! output path. Exit status is reported, never trusted: liveness is judged
//! from the output file alone (see harness.rs).

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{error::HarnessResult, rng::SimulatorSeeds, types::Year};

/// Everything one simulator run needs, in command-line order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub data_dir: String,
    pub seeds: SimulatorSeeds,
    pub input: PathBuf,
    pub output: PathBuf,
    pub output_type: i32,
    pub immediate_cessation_year: Year,
    pub cutoff_year: Option<Year>,
}

impl Invocation {
    /// Positional arguments:
    /// DATA_DIR INIT_SEED CESS_SEED OTH_COD_SEED INDIV_SEED INPUT OUTPUT OUTPUT_TYPE CESS_YEAR [-c CUTOFF]
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(11);
        args.push(self.data_dir.clone());
        args.extend(self.seeds.as_array().iter().map(|s| s.to_string()));
        args.push(self.input.display().to_string());
        args.push(self.output.display().to_string());
        args.push(self.output_type.to_string());
        args.push(self.immediate_cessation_year.to_string());
        if let Some(cutoff) = self.cutoff_year {
            args.push("-c".into());
            args.push(cutoff.to_string());
        }
        args
    }
}

/// How a simulator run ended. None of these is an error for the harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Exited { code: i32 },
    /// Terminated without an exit code (signal).
    Terminated,
    NotLaunched { reason: String },
}

impl RunOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, RunOutcome::Exited { code: 0 })
    }
}

/// The contract every simulator backend fulfils.
pub trait Simulator {
    fn name(&self) -> &str;

    /// Human-readable command line for the console.
    fn describe(&self, invocation: &Invocation) -> String {
        format!("{} {}", self.name(), invocation.args().join(" "))
    }

    /// Run once, synchronously. Must only return Err for harness-side
    /// failures; simulator failures belong in the RunOutcome.
    fn run(&mut self, invocation: &Invocation) -> HarnessResult<RunOutcome>;
}

/// A pre-built simulator executable, run with inherited stdio.
pub struct ExternalSimulator {
    program: PathBuf,
    working_dir: Option<PathBuf>,
}

impl ExternalSimulator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), working_dir: None }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn command(&self, invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(invocation.args());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Shell-style rendering for the console.
    pub fn command_line(&self, invocation: &Invocation) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(invocation.args());
        parts.join(" ")
    }
}

impl Simulator for ExternalSimulator {
    fn name(&self) -> &str {
        "external"
    }

    fn describe(&self, invocation: &Invocation) -> String {
        self.command_line(invocation)
    }

    fn run(&mut self, invocation: &Invocation) -> HarnessResult<RunOutcome> {
        log::debug!("Launching {}", self.command_line(invocation));
        let outcome = match self.command(invocation).status() {
            Ok(status) => match status.code() {
                Some(code) => RunOutcome::Exited { code },
                None => RunOutcome::Terminated,
            },
            Err(e) => RunOutcome::NotLaunched { reason: e.to_string() },
        };
        if !outcome.is_clean() {
            log::warn!("Simulator {} ended with {:?}", self.program.display(), outcome);
        }
        Ok(outcome)
    }
}

/// Run the simulator's build script. Failure is logged, never fatal.
pub fn rebuild_simulator(script: &Path) -> RunOutcome {
    log::info!("Rebuilding simulator via {}", script.display());
    let outcome = match Command::new(script).status() {
        Ok(status) => match status.code() {
            Some(code) => RunOutcome::Exited { code },
            None => RunOutcome::Terminated,
        },
        Err(e) => RunOutcome::NotLaunched { reason: e.to_string() },
    };
    if !outcome.is_clean() {
        log::warn!("Build script {} ended with {:?}", script.display(), outcome);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(cutoff_year: Option<Year>) -> Invocation {
        Invocation {
            data_dir: "data/shg2p0".into(),
            seeds: SimulatorSeeds { initiation: 11, cessation: 22, other_cod: 33, individual: 44 },
            input: PathBuf::from("test.in"),
            output: PathBuf::from("test.out"),
            output_type: 1,
            immediate_cessation_year: 0,
            cutoff_year,
        }
    }

    #[test]
    fn args_follow_positional_order() {
        assert_eq!(
            invocation(None).args(),
            vec!["data/shg2p0", "11", "22", "33", "44", "test.in", "test.out", "1", "0"]
        );
    }

    #[test]
    fn cutoff_appends_flag() {
        let args = invocation(Some(2030)).args();
        assert_eq!(&args[args.len() - 2..], ["-c", "2030"]);
    }

    #[test]
    fn command_line_starts_with_program() {
        let sim = ExternalSimulator::new("./lbc_smokehist_osx64.exe");
        assert_eq!(sim.program(), Path::new("./lbc_smokehist_osx64.exe"));
        assert_eq!(
            sim.command_line(&invocation(None)),
            "./lbc_smokehist_osx64.exe data/shg2p0 11 22 33 44 test.in test.out 1 0"
        );
    }

    #[test]
    fn missing_executable_is_an_outcome_not_an_error() {
        let mut sim = ExternalSimulator::new("/nonexistent/shg-simulator");
        let outcome = sim.run(&invocation(None)).unwrap();
        assert!(matches!(outcome, RunOutcome::NotLaunched { .. }));
        assert!(!outcome.is_clean());
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_reported() {
        // `sh data/shg2p0 ...` fails: the script path does not exist.
        let mut sim = ExternalSimulator::new("sh").with_working_dir(std::env::temp_dir());
        let outcome = sim.run(&invocation(None)).unwrap();
        assert!(matches!(outcome, RunOutcome::Exited { code } if code != 0));
    }
}
