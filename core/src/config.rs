//! Harness configuration. Every threshold and path the run depends on
//! lives here with its historic default; nothing downstream hard-codes them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    error::{HarnessError, HarnessResult},
    types::{Age, Code, Year, SIMULATOR_CUTOFF_YEAR},
};

/// Half-open range of cohort years, stepped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct YearRange {
    pub start: Year,
    pub end:   Year,
    pub step:  Year,
}

impl YearRange {
    pub fn years(&self) -> Vec<Year> {
        if self.step <= 0 {
            return Vec::new();
        }
        (self.start..self.end).step_by(self.step as usize).collect()
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self { start: 1990, end: 2020, step: 10 }
    }
}

/// Expected value for a statistic; a warning fires when |value - expected| > tolerance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tolerance {
    pub expected:  Age,
    pub tolerance: Age,
}

impl Tolerance {
    pub const fn new(expected: Age, tolerance: Age) -> Self {
        Self { expected, tolerance }
    }

    pub fn is_violated_by(&self, value: Age) -> bool {
        (i64::from(value) - i64::from(self.expected)).abs() > i64::from(self.tolerance)
    }
}

/// Warning band for one age field. `None` disables that side of the check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgeBand {
    pub min: Option<Tolerance>,
    pub max: Option<Tolerance>,
    /// Accept a max that lands exactly on the cutoff year (year + max == cutoff).
    #[serde(default)]
    pub max_exempt_at_cutoff: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Thresholds {
    pub init_age: AgeBand,
    pub cess_age: AgeBand,
    pub ocd_age:  AgeBand,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            // Initiation normally starts near 8.
            init_age: AgeBand {
                min: Some(Tolerance::new(8, 7)),
                max: None,
                max_exempt_at_cutoff: false,
            },
            // Cessation normally starts near 15; oldest quitters near 99.
            cess_age: AgeBand {
                min: Some(Tolerance::new(15, 7)),
                max: Some(Tolerance::new(99, 9)),
                max_exempt_at_cutoff: true,
            },
            // Infant mortality in the first year is unavoidable, so min must be 0.
            ocd_age: AgeBand {
                min: Some(Tolerance::new(0, 0)),
                max: Some(Tolerance::new(99, 9)),
                max_exempt_at_cutoff: true,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Simulator executable.
    pub simulator: PathBuf,
    /// Data-directory prefix passed as the simulator's first argument.
    pub data_dir: String,
    /// Directory holding the transient files and archived outputs.
    pub work_dir: PathBuf,
    pub input_file: String,
    pub output_file: String,
    /// Archived copies are named `<archive_prefix><year>.out`.
    pub archive_prefix: String,
    pub cohort_size: usize,
    pub years: YearRange,
    pub race: Code,
    pub sex: Code,
    pub output_type: i32,
    pub immediate_cessation_year: Year,
    /// Passed as `-c <year>` when set. The simulator clamps it to 2050.
    pub cutoff_year: Option<Year>,
    /// Liveness: the output must have more lines than this.
    pub min_output_lines: usize,
    /// Fixed master seed for reproducible runs. Drawn from the OS when unset.
    pub master_seed: Option<u64>,
    /// Stop at the first failed year instead of moving on.
    pub fail_fast: bool,
    /// Script run once before the loop when rebuilding is requested.
    pub build_script: PathBuf,
    pub thresholds: Thresholds,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            simulator: PathBuf::from("./lbc_smokehist_osx64.exe"),
            data_dir: "data/shg2p0".into(),
            work_dir: PathBuf::from("."),
            input_file: "test.in".into(),
            output_file: "test.out".into(),
            archive_prefix: "test_".into(),
            cohort_size: 20_000,
            years: YearRange::default(),
            race: 0,
            sex: 0,
            output_type: 1,
            immediate_cessation_year: 0,
            cutoff_year: None,
            min_output_lines: 10,
            master_seed: None,
            fail_fast: false,
            build_script: PathBuf::from("./install.sh"),
            thresholds: Thresholds::default(),
        }
    }
}

impl HarnessConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        let config: HarnessConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if self.cohort_size == 0 {
            return Err(HarnessError::InvalidConfig("cohort_size must be positive".into()));
        }
        if self.years.step <= 0 {
            return Err(HarnessError::InvalidConfig(format!(
                "year step must be positive, got {}",
                self.years.step
            )));
        }
        if self.years.years().is_empty() {
            return Err(HarnessError::InvalidConfig(format!(
                "year range {}..{} is empty",
                self.years.start, self.years.end
            )));
        }
        if self.input_file == self.output_file {
            return Err(HarnessError::InvalidConfig(
                "input_file and output_file must differ".into(),
            ));
        }
        Ok(())
    }

    /// Anchor a relative work_dir at the current directory. The simulator
    /// runs inside work_dir, so the paths it is handed must not be relative.
    pub fn resolve_work_dir(&mut self) -> HarnessResult<()> {
        if self.work_dir.is_relative() {
            let cwd = std::env::current_dir().map_err(|e| HarnessError::io(".", e))?;
            self.work_dir = cwd.join(&self.work_dir);
        }
        Ok(())
    }

    /// Cutoff the simulator will actually apply.
    pub fn effective_cutoff(&self) -> Year {
        self.cutoff_year
            .map_or(SIMULATOR_CUTOFF_YEAR, |c| c.min(SIMULATOR_CUTOFF_YEAR))
    }

    pub fn input_path(&self) -> PathBuf {
        self.work_dir.join(&self.input_file)
    }

    pub fn output_path(&self) -> PathBuf {
        self.work_dir.join(&self.output_file)
    }

    pub fn archive_path(&self, year: Year) -> PathBuf {
        self.work_dir.join(format!("{}{year}.out", self.archive_prefix))
    }

    /// Small config for tests: 50 subjects, one year, fixed seed.
    pub fn default_test(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            cohort_size: 50,
            years: YearRange { start: 1990, end: 1991, step: 1 },
            master_seed: Some(42),
            ..Self::default()
        }
    }
}
