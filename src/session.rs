//! The assertion accumulator.
//!
//! A [`Session`] records one [`ResultLog`](crate::log::ResultLog) per
//! assertion call, tracks the ran/failed/skipped/todo counters, and renders
//! the whole run as TAP text. Every assertion funnels through [`Session::ok`];
//! assertion failures are recorded outcomes, never errors. The only call
//! here that can return an error is [`Session::version`], which rejects
//! anything other than TAP versions 12 and 13.

use crate::errors::TapError;
use crate::log::{CmpDetails, Directive, ResultLog, StackFrame, Thrown};
use crate::value::{TypeRegistry, Value};
use std::fmt::Write as _;
use std::panic::{catch_unwind, Location, UnwindSafe};
use std::str::FromStr;

/// How much call-site context a failed assertion captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceMode {
    /// No trace capture.
    #[default]
    None,
    /// Capture the failing assertion's call site.
    FailureSite,
    /// Capture the call site plus the assertion delegation chain.
    FullStack,
}

/// Supported TAP versions. Version 13 is accepted but currently renders
/// identically to 12; negotiation exists so callers can declare intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TapVersion {
    #[default]
    V12,
    V13,
}

impl TapVersion {
    pub fn as_u32(self) -> u32 {
        match self {
            TapVersion::V12 => 12,
            TapVersion::V13 => 13,
        }
    }

    pub fn from_u32(ver: u32) -> Result<Self, TapError> {
        match ver {
            12 => Ok(TapVersion::V12),
            13 => Ok(TapVersion::V13),
            other => Err(TapError::UnsupportedVersion { requested: other }),
        }
    }
}

/// How chatty reporting around the session should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Summary,
    Details,
    Debug,
}

/// The comparators accepted by [`Session::cmp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Identical,
    NotIdentical,
    LooseEq,
    LooseNe,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Comparator {
    /// The canonical token, as shown in diagnostic `op:` lines.
    pub fn token(self) -> &'static str {
        match self {
            Comparator::Identical => "===",
            Comparator::NotIdentical => "!==",
            Comparator::LooseEq => "==",
            Comparator::LooseNe => "!=",
            Comparator::Lt => "<",
            Comparator::Gt => ">",
            Comparator::Le => "<=",
            Comparator::Ge => ">=",
        }
    }

    /// Evaluates the comparison. Unordered pairs fail every ordering
    /// comparator.
    pub fn evaluate(self, got: &Value, want: &Value) -> bool {
        use std::cmp::Ordering;
        match self {
            Comparator::Identical => got == want,
            Comparator::NotIdentical => got != want,
            Comparator::LooseEq => got.loose_eq(want),
            Comparator::LooseNe => !got.loose_eq(want),
            Comparator::Lt => got.loose_cmp(want) == Some(Ordering::Less),
            Comparator::Gt => got.loose_cmp(want) == Some(Ordering::Greater),
            Comparator::Le => matches!(
                got.loose_cmp(want),
                Some(Ordering::Less) | Some(Ordering::Equal)
            ),
            Comparator::Ge => matches!(
                got.loose_cmp(want),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            ),
        }
    }
}

impl FromStr for Comparator {
    type Err = ();

    /// Alias table: every comparator has a word form and a symbol form.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "is" | "===" => Ok(Comparator::Identical),
            "isnt" | "!==" => Ok(Comparator::NotIdentical),
            "eq" | "==" => Ok(Comparator::LooseEq),
            "ne" | "!=" => Ok(Comparator::LooseNe),
            "lt" | "<" => Ok(Comparator::Lt),
            "gt" | ">" => Ok(Comparator::Gt),
            "le" | "lte" | "<=" => Ok(Comparator::Le),
            "ge" | "gte" | ">=" => Ok(Comparator::Ge),
            _ => Err(()),
        }
    }
}

/// What a `dies` closure reports back: completion, or one of the two
/// throwable tiers with its message.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ok,
    Exception(String),
    Error(String),
}

/// Which throwable tiers count as success for `dies`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatchPolicy {
    #[default]
    All,
    ExceptionsOnly,
    ErrorsOnly,
}

impl CatchPolicy {
    fn accepts(self, thrown: &Thrown) -> bool {
        match (self, thrown) {
            (CatchPolicy::All, _) => true,
            (CatchPolicy::ExceptionsOnly, Thrown::Exception(_)) => true,
            (CatchPolicy::ErrorsOnly, Thrown::Error(_)) => true,
            _ => false,
        }
    }
}

/// One entry in the session log: an assertion outcome or a raw diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Log(ResultLog),
    Diag(String),
}

/// Explicit construction-time configuration. There are no process-wide
/// defaults to mutate; callers that want shared settings build one of these
/// and pass it around.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionConfig {
    pub plan: usize,
    pub trace: TraceMode,
    pub version: TapVersion,
    pub verbosity: Verbosity,
}

/// Accumulates assertion outcomes and renders them as TAP.
#[derive(Debug, Clone, Default)]
pub struct Session {
    planned: usize,
    ran: usize,
    failed: usize,
    skipped: usize,
    todo: usize,
    trace: TraceMode,
    tap_version: TapVersion,
    verbosity: Verbosity,
    entries: Vec<Entry>,
    types: TypeRegistry,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            planned: config.plan,
            trace: config.trace,
            tap_version: config.version,
            verbosity: config.verbosity,
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Declares how many assertions this session expects to run.
    /// Zero means unplanned: no plan line and no early-stop detection.
    pub fn plan(&mut self, count: usize) -> &mut Self {
        self.planned = count;
        self
    }

    /// Changes the trace capture mode for subsequent failures.
    pub fn trace(&mut self, mode: TraceMode) -> &mut Self {
        self.trace = mode;
        self
    }

    /// Sets the TAP version. Only 12 and 13 are accepted; 13 is currently
    /// inert (it renders identically to 12).
    pub fn version(&mut self, ver: u32) -> Result<&mut Self, TapError> {
        self.tap_version = TapVersion::from_u32(ver)?;
        Ok(self)
    }

    pub fn tap_version(&self) -> TapVersion {
        self.tap_version
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Registers supertype/interface relations consulted by [`Session::is_type`].
    pub fn register_type(
        &mut self,
        class: impl Into<String>,
        supertypes: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        self.types.register(class, supertypes);
        self
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn planned(&self) -> usize {
        self.planned
    }

    pub fn ran(&self) -> usize {
        self.ran
    }

    /// Number of failures. With `no_todo`, failures marked TODO are
    /// excluded from the total.
    pub fn failed(&self, no_todo: bool) -> usize {
        if no_todo {
            self.failed.saturating_sub(self.todo)
        } else {
            self.failed
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn are_todo(&self) -> usize {
        self.todo
    }

    /// True when nothing (relevant) failed and the plan, if any, was met.
    pub fn success(&self, no_todo: bool) -> bool {
        self.failed(no_todo) == 0 && (self.planned == 0 || self.planned == self.ran)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    // ------------------------------------------------------------------
    // Assertions
    // ------------------------------------------------------------------

    /// The primitive every other assertion funnels through: records one
    /// pass/fail outcome. Never raises.
    #[track_caller]
    pub fn ok(
        &mut self,
        test: bool,
        desc: Option<&str>,
        directive: Option<Directive>,
    ) -> &mut ResultLog {
        let frames = Self::call_chain(Location::caller(), &["ok"]);
        self.record(test, desc, directive, frames)
    }

    /// Records an unconditional failure.
    #[track_caller]
    pub fn fail(&mut self, desc: Option<&str>, directive: Option<Directive>) -> &mut ResultLog {
        let frames = Self::call_chain(Location::caller(), &["fail", "ok"]);
        self.record(false, desc, directive, frames)
    }

    /// Records an unconditional pass.
    #[track_caller]
    pub fn pass(&mut self, desc: Option<&str>, directive: Option<Directive>) -> &mut ResultLog {
        let frames = Self::call_chain(Location::caller(), &["pass", "ok"]);
        self.record(true, desc, directive, frames)
    }

    /// Asserts that `test` raises a throwable matching `policy`.
    ///
    /// The closure reports its outcome as a tagged [`Outcome`]; a panic
    /// inside the closure is caught and classified as the Error tier.
    /// Whatever was raised is stored as the directive, whether or not it
    /// satisfied the policy. Nothing escapes this call.
    #[track_caller]
    pub fn dies<F>(&mut self, test: F, desc: Option<&str>, policy: CatchPolicy) -> &mut ResultLog
    where
        F: FnOnce() -> Outcome + UnwindSafe,
    {
        let frames = Self::call_chain(Location::caller(), &["dies", "ok"]);
        let outcome = match catch_unwind(test) {
            Ok(outcome) => outcome,
            Err(payload) => Outcome::Error(panic_message(payload.as_ref())),
        };
        let (ok, directive) = match outcome {
            Outcome::Ok => (false, None),
            Outcome::Exception(msg) => {
                let thrown = Thrown::Exception(msg);
                (policy.accepts(&thrown), Some(Directive::Thrown(thrown)))
            }
            Outcome::Error(msg) => {
                let thrown = Thrown::Error(msg);
                (policy.accepts(&thrown), Some(Directive::Thrown(thrown)))
            }
        };
        self.record(ok, desc, directive, frames)
    }

    /// Compares two values with the given comparator. On failure the log
    /// entry carries the got/expected/op details for rendering.
    #[track_caller]
    pub fn cmp(
        &mut self,
        got: &Value,
        want: &Value,
        comparator: Comparator,
        desc: Option<&str>,
        stringify: bool,
    ) -> &mut ResultLog {
        let frames = Self::call_chain(Location::caller(), &["cmp", "ok"]);
        self.cmp_with(
            got,
            want,
            Some(comparator),
            comparator.token().to_string(),
            desc,
            stringify,
            frames,
        )
    }

    /// Token-string variant of [`Session::cmp`]. An unknown token is an
    /// automatic failure, not an error.
    #[track_caller]
    pub fn cmp_ok(
        &mut self,
        got: &Value,
        want: &Value,
        token: &str,
        desc: Option<&str>,
        stringify: bool,
    ) -> &mut ResultLog {
        let frames = Self::call_chain(Location::caller(), &["cmp_ok", "ok"]);
        let comparator = token.parse::<Comparator>().ok();
        self.cmp_with(
            got,
            want,
            comparator,
            token.to_string(),
            desc,
            stringify,
            frames,
        )
    }

    /// Asserts strict identity (`===`).
    #[track_caller]
    pub fn is(&mut self, got: &Value, want: &Value, desc: Option<&str>) -> &mut ResultLog {
        let frames = Self::call_chain(Location::caller(), &["is", "cmp", "ok"]);
        self.cmp_with(got, want, Some(Comparator::Identical), "===".into(), desc, true, frames)
    }

    /// Asserts strict non-identity (`!==`).
    #[track_caller]
    pub fn isnt(&mut self, got: &Value, want: &Value, desc: Option<&str>) -> &mut ResultLog {
        let frames = Self::call_chain(Location::caller(), &["isnt", "cmp", "ok"]);
        self.cmp_with(
            got,
            want,
            Some(Comparator::NotIdentical),
            "!==".into(),
            desc,
            true,
            frames,
        )
    }

    /// Asserts that both sides render to the same JSON text.
    ///
    /// Map entry order is part of the rendered text, so structurally equal
    /// values built in different field order fail this check. That is a
    /// property of the encoding, not of the values.
    #[track_caller]
    pub fn is_json(&mut self, got: &Value, want: &Value, desc: Option<&str>) -> &mut ResultLog {
        let frames = Self::call_chain(Location::caller(), &["is_json", "cmp", "ok"]);
        let got_text = got.to_json();
        let want_text = want.to_json();
        self.cmp_with(
            &Value::Str(got_text),
            &Value::Str(want_text),
            Some(Comparator::Identical),
            "===".into(),
            desc,
            false,
            frames,
        )
    }

    /// Asserts that both sides have identical full-fidelity serializations.
    ///
    /// With `raw_output`, failure details show the serialized strings
    /// instead of the original values. Order-sensitive for the same reason
    /// as [`Session::is_json`].
    #[track_caller]
    pub fn is_serialized(
        &mut self,
        got: &Value,
        want: &Value,
        desc: Option<&str>,
        raw_output: bool,
    ) -> &mut ResultLog {
        let frames = Self::call_chain(Location::caller(), &["is_serialized", "ok"]);
        let got_text = got.to_serialized();
        let want_text = want.to_serialized();
        let test = got_text == want_text;
        let details = if test {
            None
        } else if raw_output {
            Some(CmpDetails {
                got: Value::Str(got_text),
                wanted: Value::Str(want_text),
                comparator: None,
                stringify: false,
            })
        } else {
            Some(CmpDetails {
                got: got.clone(),
                wanted: want.clone(),
                comparator: None,
                stringify: true,
            })
        };
        let log = self.record(test, desc, None, frames);
        log.details = details;
        log
    }

    /// Asserts that `got`'s category tag, object class, or any registered
    /// supertype/interface matches `want_name` exactly (case-sensitive).
    ///
    /// The pseudo-type `"iterable"` matches sequences, maps, and classes
    /// registered as iterable; `"callable"` matches callables and classes
    /// registered as callable. An unknown name is an automatic failure.
    #[track_caller]
    pub fn is_type(&mut self, got: &Value, want_name: &str, desc: Option<&str>) -> &mut ResultLog {
        let frames = Self::call_chain(Location::caller(), &["is_type", "ok"]);
        let test = self.type_matches(got, want_name);
        self.record(test, desc, None, frames)
    }

    /// Records a forced pass marked as skipped.
    #[track_caller]
    pub fn skip(&mut self, reason: Option<&str>, desc: Option<&str>) -> &mut ResultLog {
        let frames = Self::call_chain(Location::caller(), &["skip", "ok"]);
        self.skipped += 1;
        let log = self.record(true, desc, None, frames);
        log.skipped = true;
        if let Some(reason) = reason {
            log.reason = reason.to_string();
        }
        log
    }

    /// Records a forced failure marked TODO. TODO failures can be excluded
    /// from failure totals via the `no_todo` query flag.
    #[track_caller]
    pub fn todo_mark(&mut self, reason: Option<&str>, desc: Option<&str>) -> &mut ResultLog {
        let frames = Self::call_chain(Location::caller(), &["todo_mark", "ok"]);
        self.todo += 1;
        let log = self.record(false, desc, None, frames);
        log.todo = true;
        if let Some(reason) = reason {
            log.reason = reason.to_string();
        }
        log
    }

    /// Appends a raw diagnostic line. Does not affect any counter.
    pub fn diag(&mut self, message: &str) -> &mut Self {
        self.entries.push(Entry::Diag(message.to_string()));
        self
    }

    /// Appends a structured diagnostic, JSON-encoded.
    pub fn diag_value(&mut self, payload: &Value) -> &mut Self {
        self.entries.push(Entry::Diag(payload.to_json()));
        self
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Renders the whole session as TAP text: plan line (when planned),
    /// every entry in insertion order, then the skip/failure/plan-mismatch
    /// trailer comments.
    pub fn tap(&self) -> String {
        let mut out = String::new();
        if self.planned > 0 {
            let _ = writeln!(out, "1..{}", self.planned);
        }

        let mut num = 1;
        for entry in &self.entries {
            match entry {
                Entry::Log(log) => {
                    out.push_str(&log.render(num));
                    num += 1;
                }
                Entry::Diag(text) => {
                    out.push_str(text);
                    if !text.ends_with('\n') {
                        out.push('\n');
                    }
                }
            }
        }

        if self.skipped > 0 {
            let _ = writeln!(out, "# Skipped {} tests", self.skipped);
        }

        if self.failed > 0 {
            let noun = if self.failed > 1 { "tests" } else { "test" };
            let _ = write!(out, "# Failed {} {}", self.failed, noun);
            if self.planned > 0 {
                let _ = write!(out, " out of {}", self.planned);
            }
            out.push('\n');
        }

        if self.planned > 0 && self.planned != self.ran {
            let _ = writeln!(
                out,
                "# Looks like you planned '{}' but ran '{}' tests",
                self.planned, self.ran
            );
        }

        out
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Builds the recorded delegation chain. Every frame carries the user's
    /// call site; the function names walk the assertion entry points.
    fn call_chain(location: &Location<'_>, names: &[&str]) -> Vec<StackFrame> {
        names
            .iter()
            .map(|name| StackFrame::from_location(location, name))
            .collect()
    }

    fn record(
        &mut self,
        test: bool,
        desc: Option<&str>,
        directive: Option<Directive>,
        frames: Vec<StackFrame>,
    ) -> &mut ResultLog {
        self.ran += 1;
        let mut log = ResultLog::new(test);
        if !test {
            self.failed += 1;
            match self.trace {
                TraceMode::None => {}
                TraceMode::FailureSite => {
                    log.stack_trace = Some(frames.into_iter().take(1).collect());
                }
                TraceMode::FullStack => {
                    log.stack_trace = Some(frames);
                    log.full_trace = true;
                }
            }
        }
        log.desc = desc.map(str::to_string);
        log.directive = directive;
        self.entries.push(Entry::Log(log));
        let Some(Entry::Log(entry)) = self.entries.last_mut() else {
            unreachable!("entry was just pushed");
        };
        entry
    }

    #[allow(clippy::too_many_arguments)]
    fn cmp_with(
        &mut self,
        got: &Value,
        want: &Value,
        comparator: Option<Comparator>,
        token: String,
        desc: Option<&str>,
        stringify: bool,
        frames: Vec<StackFrame>,
    ) -> &mut ResultLog {
        let test = comparator.map_or(false, |c| c.evaluate(got, want));
        let log = self.record(test, desc, None, frames);
        if !test {
            log.details = Some(CmpDetails {
                got: got.clone(),
                wanted: want.clone(),
                comparator: Some(token),
                stringify,
            });
        }
        log
    }

    fn type_matches(&self, got: &Value, want: &str) -> bool {
        if got.type_name() == want {
            return true;
        }
        match got {
            Value::Seq(_) | Value::Map(_) => want == "iterable",
            Value::Object { class, .. } => {
                self.types.is_a(class, want)
                    || (want == "iterable" && self.types.is_a(class, "iterable"))
                    || (want == "callable" && self.types.is_a(class, "callable"))
            }
            _ => false,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unit panicked".to_string()
    }
}

/// Shared helper for the harness: converts a caught panic payload into a
/// failure message.
pub(crate) fn describe_panic(payload: Box<dyn std::any::Any + Send>) -> String {
    panic_message(payload.as_ref())
}
