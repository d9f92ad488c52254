//! Result log entries and their TAP line rendering.
//!
//! A [`ResultLog`] is the record of one assertion. It is created by the
//! session's `ok` funnel, may be annotated by the derived assertion that
//! created it (skip/todo markers, comparison details), and is immutable once
//! the next assertion runs. Rendering one entry yields the `ok`/`not ok`
//! line plus any `#`-prefixed diagnostic lines attached to it.

use crate::value::Value;
use std::fmt::Write as _;
use std::panic::Location;

/// A throwable caught by `dies`, split into the two-tier taxonomy:
/// recoverable exceptions versus fatal errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Thrown {
    Exception(String),
    Error(String),
}

impl Thrown {
    pub fn kind(&self) -> &'static str {
        match self {
            Thrown::Exception(_) => "Exception",
            Thrown::Error(_) => "Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Thrown::Exception(m) | Thrown::Error(m) => m,
        }
    }
}

/// Extra detail attached to a result line, rendered as the ` # ...` suffix.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Plain directive text, rendered verbatim.
    Text(String),
    /// A throwable captured by `dies`, rendered as `<kind>: <message>`.
    Thrown(Thrown),
    /// A structured payload, rendered as JSON.
    Value(Value),
}

impl From<&str> for Directive {
    fn from(s: &str) -> Self {
        Directive::Text(s.to_string())
    }
}

impl From<String> for Directive {
    fn from(s: String) -> Self {
        Directive::Text(s)
    }
}

/// Details of a failed comparison, for diagnostic rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct CmpDetails {
    pub got: Value,
    pub wanted: Value,
    /// The comparator token as the caller wrote it, shown in the `op:` line.
    pub comparator: Option<String>,
    /// When true, values render as JSON; otherwise through Display.
    pub stringify: bool,
}

/// One frame of a captured call chain.
#[derive(Debug, Clone, PartialEq)]
pub struct StackFrame {
    pub file: String,
    pub line: u32,
    pub function: String,
}

impl StackFrame {
    /// Builds a frame from a caller location, as captured by
    /// `#[track_caller]` on the assertion entry points.
    pub fn from_location(location: &Location<'_>, function: &str) -> Self {
        Self {
            file: location.file().to_string(),
            line: location.line(),
            function: function.to_string(),
        }
    }
}

/// The outcome of a single assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultLog {
    pub ok: bool,
    pub skipped: bool,
    pub todo: bool,
    pub reason: String,
    pub desc: Option<String>,
    pub directive: Option<Directive>,
    pub details: Option<CmpDetails>,
    pub stack_trace: Option<Vec<StackFrame>>,
    pub full_trace: bool,
}

impl ResultLog {
    pub fn new(ok: bool) -> Self {
        Self {
            ok,
            skipped: false,
            todo: false,
            reason: String::new(),
            desc: None,
            directive: None,
            details: None,
            stack_trace: None,
            full_trace: false,
        }
    }

    /// Renders this entry as its TAP line(s), numbered `num`.
    ///
    /// The directive suffix is chosen by priority: explicit text, then a
    /// captured throwable, then a structured payload, then the SKIP/TODO
    /// markers with their reasons.
    pub fn render(&self, num: usize) -> String {
        let mut out = String::new();
        if self.ok {
            out.push_str("ok ");
        } else {
            out.push_str("not ok ");
        }
        let _ = write!(out, "{}", num);

        if let Some(desc) = &self.desc {
            let _ = write!(out, " - {}", desc);
        }

        match &self.directive {
            Some(Directive::Text(text)) => {
                let _ = write!(out, " # {}", text);
            }
            Some(Directive::Thrown(thrown)) => {
                let _ = write!(out, " # {}: {}", thrown.kind(), thrown.message());
            }
            Some(Directive::Value(value)) => {
                let _ = write!(out, " # {}", value.to_json());
            }
            None if self.skipped => {
                out.push_str(" # SKIP");
                if !self.reason.is_empty() {
                    let _ = write!(out, " {}", self.reason);
                }
            }
            None if self.todo => {
                out.push_str(" # TODO");
                if !self.reason.is_empty() {
                    let _ = write!(out, " {}", self.reason);
                }
            }
            None => {}
        }
        out.push('\n');

        if let Some(frames) = &self.stack_trace {
            if self.full_trace {
                for (depth, frame) in frames.iter().enumerate() {
                    render_frame(&mut out, frame, depth + 1);
                }
            } else if let Some(frame) = frames.first() {
                render_frame(&mut out, frame, 1);
            }
        }

        if let Some(details) = &self.details {
            let (want, got) = if details.stringify {
                (details.wanted.to_json(), details.got.to_json())
            } else {
                (details.wanted.to_string(), details.got.to_string())
            };
            let _ = writeln!(out, "#  expected: {}", want);
            let _ = writeln!(out, "#       got: {}", got);
            if let Some(op) = &details.comparator {
                let _ = writeln!(out, "#        op: {}", op);
            }
        }

        out
    }
}

fn render_frame(out: &mut String, frame: &StackFrame, spacing: usize) {
    let space = "  ".repeat(spacing);
    let _ = writeln!(out, "#{}file: {}", space, frame.file);
    let _ = writeln!(out, "#{}line: {}", space, frame.line);
    let _ = writeln!(out, "#{}function: {}", space, frame.function);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_pass_and_fail_lines() {
        assert_eq!(ResultLog::new(true).render(1), "ok 1\n");
        assert_eq!(ResultLog::new(false).render(2), "not ok 2\n");
    }

    #[test]
    fn directive_priority_text_beats_skip_marker() {
        let mut log = ResultLog::new(true);
        log.skipped = true;
        log.reason = "later".into();
        log.directive = Some(Directive::Text("explicit".into()));
        assert_eq!(log.render(1), "ok 1 # explicit\n");
    }

    #[test]
    fn thrown_directive_renders_kind_and_message() {
        let mut log = ResultLog::new(true);
        log.desc = Some("it died".into());
        log.directive = Some(Directive::Thrown(Thrown::Exception("boom".into())));
        assert_eq!(log.render(3), "ok 3 - it died # Exception: boom\n");
    }

    #[test]
    fn failed_comparison_renders_expected_got_op() {
        let mut log = ResultLog::new(false);
        log.details = Some(CmpDetails {
            got: Value::Int(1),
            wanted: Value::Int(2),
            comparator: Some("===".into()),
            stringify: true,
        });
        assert_eq!(
            log.render(1),
            "not ok 1\n#  expected: 2\n#       got: 1\n#        op: ===\n"
        );
    }
}
