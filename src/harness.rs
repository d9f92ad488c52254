//! The multi-unit test harness.
//!
//! A [`Harness`] owns an ordered list of unit identifiers and an executor
//! that knows how to resolve and run them. Each executed unit contributes
//! exactly one pass/fail record to the harness's internal aggregate
//! [`Session`], decided from the unit's returned result object when there is
//! one, or from its parsed TAP output otherwise.
//!
//! The core contract is failure isolation: a unit that errors or panics is
//! recorded as one aggregate failure naming the unit, and the run continues
//! with the next unit.

use crate::errors::TapError;
use crate::log::Directive;
use crate::parser::TapParser;
use crate::session::{describe_panic, Session, SessionConfig, Verbosity};
use crate::summary::ResultSummary;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// The execution environment the harness delegates to.
///
/// This is the only surface through which the harness touches the
/// filesystem or a process boundary, which keeps the aggregation logic
/// testable with an in-memory double.
pub trait UnitExecutor {
    /// True when the identifier resolves to a runnable unit.
    fn resolves(&self, unit: &str) -> bool;

    /// Ordered unit identifiers found in `dir` whose names match the
    /// extension filter (without the leading dot).
    fn list_dir(&self, dir: &str, ext: &str) -> Vec<String>;

    /// Runs one unit, capturing its textual output and optional structured
    /// result. Errors propagate to the harness, which absorbs them.
    fn execute(&mut self, unit: &str) -> Result<Execution, TapError>;
}

/// What executing one unit produced.
#[derive(Debug, Default)]
pub struct Execution {
    /// Everything the unit wrote to its output sink.
    pub output: String,
    /// A structured result returned by the unit, when it has one.
    pub result: Option<UnitResult>,
}

/// A structured result object exposing the shared `success` contract.
pub enum UnitResult {
    Session(Session),
    Summary(ResultSummary),
    Harness(Box<Harness>),
}

impl UnitResult {
    pub fn success(&self, no_todo: bool) -> bool {
        match self {
            UnitResult::Session(session) => session.success(no_todo),
            UnitResult::Summary(summary) => summary.success(no_todo),
            UnitResult::Harness(harness) => harness.suite().success(no_todo),
        }
    }
}

// Hand-written because the nested harness owns a `Box<dyn UnitExecutor>`,
// which has no `Debug` to derive through.
impl fmt::Debug for UnitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitResult::Session(session) => f.debug_tuple("Session").field(session).finish(),
            UnitResult::Summary(summary) => f.debug_tuple("Summary").field(summary).finish(),
            UnitResult::Harness(harness) => f
                .debug_struct("Harness")
                .field("units", &harness.units().len())
                .finish_non_exhaustive(),
        }
    }
}

/// Runs a fixed list of test units and aggregates their outcomes.
pub struct Harness {
    executor: Box<dyn UnitExecutor>,
    units: Vec<String>,
    suite: Session,
    outputs: BTreeMap<String, String>,
    results: BTreeMap<String, UnitResult>,
}

impl Harness {
    pub fn new(executor: Box<dyn UnitExecutor>) -> Self {
        Self::with_config(executor, SessionConfig::default())
    }

    pub fn with_config(executor: Box<dyn UnitExecutor>, config: SessionConfig) -> Self {
        Self {
            executor,
            units: Vec::new(),
            suite: Session::with_config(config),
            outputs: BTreeMap::new(),
            results: BTreeMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Unit registration
    // ------------------------------------------------------------------

    /// Adds one unit. Identifiers that do not resolve are silently ignored.
    pub fn add_unit(&mut self, unit: impl Into<String>) -> &mut Self {
        let unit = unit.into();
        if self.executor.resolves(&unit) {
            self.units.push(unit);
        }
        self
    }

    /// Adds every unit the executor finds in `dir` with the given extension.
    pub fn add_dir(&mut self, dir: &str, ext: &str) -> &mut Self {
        let found = self.executor.list_dir(dir, ext);
        self.units.extend(found);
        self
    }

    pub fn units(&self) -> &[String] {
        &self.units
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Runs every registered unit in list order. With `auto_plan`, the
    /// aggregate session is planned for the number of registered units
    /// first, so a run that stops early is detectable.
    pub fn run(&mut self, auto_plan: bool) -> &mut Self {
        if auto_plan {
            self.suite.plan(self.units.len());
        }
        let units = self.units.clone();
        for unit in units {
            self.run_unit(&unit, true);
        }
        self
    }

    /// Runs one unit and records a single aggregate pass/fail for it.
    ///
    /// Decision policy, in order: a returned result object wins; otherwise
    /// non-blank output is parsed as TAP; otherwise the unit failed with
    /// "nothing returned from test". An executor error or panic becomes an
    /// aggregate failure naming the unit, and never propagates.
    pub fn run_unit(&mut self, unit: &str, no_todo: bool) -> (&str, Option<&UnitResult>) {
        let executor = self.executor.as_mut();
        let outcome = catch_unwind(AssertUnwindSafe(|| executor.execute(unit)));

        match outcome {
            Err(payload) => {
                let message = describe_panic(payload);
                self.suite.fail(Some(unit), Some(Directive::Text(message)));
            }
            Ok(Err(error)) => {
                self.suite
                    .fail(Some(unit), Some(Directive::Text(error.to_string())));
            }
            Ok(Ok(Execution { output, result })) => {
                self.outputs.insert(unit.to_string(), output.clone());
                if let Some(result) = result {
                    self.suite.ok(result.success(no_todo), Some(unit), None);
                    self.results.insert(unit.to_string(), result);
                } else if !output.trim().is_empty() {
                    let summary = TapParser::parse(&output);
                    if self.suite.verbosity() >= Verbosity::Debug {
                        eprintln!(
                            "# {}: planned={} ran={} failed={} skipped={} todo={}",
                            unit,
                            summary.planned,
                            summary.ran,
                            summary.failed,
                            summary.skipped,
                            summary.todo
                        );
                    }
                    self.suite.ok(summary.success(no_todo), Some(unit), None);
                    self.results
                        .insert(unit.to_string(), UnitResult::Summary(summary));
                } else {
                    self.suite.fail(
                        Some(unit),
                        Some(Directive::Text("nothing returned from test".into())),
                    );
                }
            }
        }

        (
            self.outputs.get(unit).map(String::as_str).unwrap_or(""),
            self.results.get(unit),
        )
    }

    // ------------------------------------------------------------------
    // Aggregate queries (explicit delegation to the internal session)
    // ------------------------------------------------------------------

    pub fn planned(&self) -> usize {
        self.suite.planned()
    }

    pub fn ran(&self) -> usize {
        self.suite.ran()
    }

    pub fn failed(&self, no_todo: bool) -> usize {
        self.suite.failed(no_todo)
    }

    pub fn skipped(&self) -> usize {
        self.suite.skipped()
    }

    pub fn are_todo(&self) -> usize {
        self.suite.are_todo()
    }

    /// True when every executed unit passed and the plan, if any, was met.
    pub fn success(&self) -> bool {
        self.suite.success(true)
    }

    /// The aggregate run rendered as TAP.
    pub fn tap(&self) -> String {
        self.suite.tap()
    }

    /// Alias of [`Harness::tap`], kept for the reporting call sites.
    pub fn summary(&self) -> String {
        self.suite.tap()
    }

    /// The internal aggregate session, for nesting one harness inside
    /// another or for queries not forwarded above.
    pub fn suite(&self) -> &Session {
        &self.suite
    }

    pub fn suite_mut(&mut self) -> &mut Session {
        &mut self.suite
    }

    /// The raw captured output of a unit that has run.
    pub fn output_of(&self, unit: &str) -> Option<&str> {
        self.outputs.get(unit).map(String::as_str)
    }

    /// The structured result of a unit that has run, when it produced one.
    pub fn result_of(&self, unit: &str) -> Option<&UnitResult> {
        self.results.get(unit)
    }
}
