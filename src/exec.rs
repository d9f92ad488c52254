//! Concrete unit executors.
//!
//! Three ways to run a unit: an in-process closure ([`FnExecutor`]), a file
//! of pre-recorded TAP text ([`TapFileExecutor`]), or a subprocess whose
//! stdout is the TAP text ([`CommandExecutor`]). The harness itself never
//! touches the filesystem or spawns anything; it only sees this trait.

use crate::errors::TapError;
use crate::harness::{Execution, UnitExecutor, UnitResult};
use crate::output::OutputBuffer;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;
use walkdir::WalkDir;

/// Lists files in `dir` (non-recursive, name-sorted) whose extension matches
/// the filter. Multiple extensions may be given separated by `|`.
fn list_files(dir: &str, ext: &str) -> Vec<String> {
    let extensions: Vec<&str> = ext.split('|').collect();
    let mut files: Vec<String> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| extensions.contains(&e))
                .unwrap_or(false)
        })
        .map(|entry| entry.path().display().to_string())
        .collect();
    files.sort();
    files
}

/// The closure type run by [`FnExecutor`]: the unit writes its output to the
/// injected buffer and may return a structured result.
pub type UnitFn = Box<dyn FnMut(&mut OutputBuffer) -> Result<Option<UnitResult>, TapError>>;

/// Runs units registered as in-process closures.
///
/// Each run hands the closure a fresh [`OutputBuffer`], so capture is scoped
/// to the unit and nothing global is redirected. Directory listing treats
/// registered names as `dir/name.ext` paths.
#[derive(Default)]
pub struct FnExecutor {
    units: BTreeMap<String, UnitFn>,
}

impl FnExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a unit under a name. Re-registering replaces the old unit.
    pub fn register<F>(&mut self, name: impl Into<String>, unit: F) -> &mut Self
    where
        F: FnMut(&mut OutputBuffer) -> Result<Option<UnitResult>, TapError> + 'static,
    {
        self.units.insert(name.into(), Box::new(unit));
        self
    }
}

impl UnitExecutor for FnExecutor {
    fn resolves(&self, unit: &str) -> bool {
        self.units.contains_key(unit)
    }

    fn list_dir(&self, dir: &str, ext: &str) -> Vec<String> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        let extensions: Vec<String> = ext.split('|').map(|e| format!(".{}", e)).collect();
        self.units
            .keys()
            .filter(|name| name.starts_with(&prefix))
            .filter(|name| extensions.iter().any(|e| name.ends_with(e.as_str())))
            .cloned()
            .collect()
    }

    fn execute(&mut self, unit: &str) -> Result<Execution, TapError> {
        let Some(f) = self.units.get_mut(unit) else {
            return Err(TapError::UnitFailed {
                unit: unit.to_string(),
                message: "unknown unit".into(),
            });
        };
        let mut sink = OutputBuffer::new();
        let result = f(&mut sink)?;
        Ok(Execution {
            output: sink.into_string(),
            result,
        })
    }
}

/// Treats each unit as a file of pre-recorded TAP text.
///
/// Useful for interop fixtures and for harness runs over output captured
/// elsewhere: "executing" the unit is reading the file.
#[derive(Debug, Default)]
pub struct TapFileExecutor;

impl TapFileExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl UnitExecutor for TapFileExecutor {
    fn resolves(&self, unit: &str) -> bool {
        Path::new(unit).is_file()
    }

    fn list_dir(&self, dir: &str, ext: &str) -> Vec<String> {
        list_files(dir, ext)
    }

    fn execute(&mut self, unit: &str) -> Result<Execution, TapError> {
        let output = std::fs::read_to_string(unit)?;
        Ok(Execution {
            output,
            result: None,
        })
    }
}

/// Runs each unit as a subprocess and captures its stdout as the TAP text.
///
/// With an interpreter configured, units run as `<interpreter> <unit>`;
/// otherwise the unit path is invoked directly. The exit status is ignored
/// on purpose: pass/fail is decided from the TAP text, the way the harness
/// decides everything else.
#[derive(Debug, Default)]
pub struct CommandExecutor {
    interpreter: Option<String>,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interpreter(program: impl Into<String>) -> Self {
        Self {
            interpreter: Some(program.into()),
        }
    }
}

impl UnitExecutor for CommandExecutor {
    fn resolves(&self, unit: &str) -> bool {
        Path::new(unit).is_file()
    }

    fn list_dir(&self, dir: &str, ext: &str) -> Vec<String> {
        list_files(dir, ext)
    }

    fn execute(&mut self, unit: &str) -> Result<Execution, TapError> {
        let output = match &self.interpreter {
            Some(program) => Command::new(program).arg(unit).output()?,
            None => Command::new(unit).output()?,
        };
        Ok(Execution {
            output: String::from_utf8_lossy(&output.stdout).into_owned(),
            result: None,
        })
    }
}
