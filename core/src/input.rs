//! Synthetic simulator input: N identical subjects for one birth year.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::{
    error::{HarnessError, HarnessResult},
    types::{Code, Year},
};

/// One input row for the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticSubject {
    pub race: Code,
    pub sex:  Code,
    pub yob:  Year,
}

impl SyntheticSubject {
    pub fn new(race: Code, sex: Code, yob: Year) -> Self {
        Self { race, sex, yob }
    }

    /// `race;sex;yob`
    pub fn to_line(&self) -> String {
        format!("{};{};{}", self.race, self.sex, self.yob)
    }
}

/// Write `n` copies of `subject`, one per line, truncating `path`.
pub fn write_input_file(path: &Path, subject: SyntheticSubject, n: usize) -> HarnessResult<()> {
    let file = File::create(path).map_err(|e| HarnessError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let line = subject.to_line();
    for _ in 0..n {
        writeln!(writer, "{line}").map_err(|e| HarnessError::io(path, e))?;
    }
    writer.flush().map_err(|e| HarnessError::io(path, e))?;
    log::debug!("Wrote {n} input rows to {}", path.display());
    Ok(())
}
