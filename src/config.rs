//! Program configuration - built-in program or a JSON program file

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::{Program, ProgramClock};
use crate::exercises::{Catalog, Exercise};
use crate::schedule::Schedule;

/// Start date of the built-in program
pub const DEFAULT_START_DATE: &str = "2025-08-19";

pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 19).unwrap_or_default()
}

/// On-disk program definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramFile {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    pub exercises: Vec<Exercise>,
    pub schedule: Schedule,
}

impl ProgramFile {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid program file")
    }

    /// Validate and build; an explicit start date wins over the file's
    pub fn into_program(self, start: Option<NaiveDate>) -> Result<Program> {
        let start = start.or(self.start_date).unwrap_or_else(default_start_date);
        let catalog = Catalog::new(self.exercises)?;
        let program = Program::new(catalog, self.schedule, ProgramClock::new(start))?;
        Ok(program)
    }
}

/// Program from `path`, or the built-in one
pub fn load_program(path: Option<&Path>, start: Option<NaiveDate>) -> Result<Program> {
    let Some(path) = path else {
        return Ok(Program::builtin(start.unwrap_or_else(default_start_date)));
    };

    let json = fs::read_to_string(path)
        .with_context(|| format!("reading program file {}", path.display()))?;
    let program = ProgramFile::from_json(&json)?
        .into_program(start)
        .with_context(|| format!("loading program file {}", path.display()))?;

    info!(
        "loaded program from {}: {} exercises",
        path.display(),
        program.catalog().exercises().len()
    );
    Ok(program)
}
