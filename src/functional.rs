//! Free-function facade over a thread-local [`Session`].
//!
//! Test unit bodies read better without threading a session through every
//! call. [`start`] installs a session for the current thread, the free
//! functions below forward to it, and [`finish`] takes it back out so the
//! unit can return it as its structured result:
//!
//! ```rust
//! use tapkit::functional as t;
//! use tapkit::{SessionConfig, Value};
//!
//! t::start(SessionConfig::default());
//! t::plan(2);
//! t::ok(true, Some("it works"));
//! t::is(&Value::Int(2), &Value::Int(2), None);
//! let session = t::finish();
//! assert!(session.success(true));
//! ```
//!
//! The state is thread-local, never process-global. Every function here
//! panics with a clear message when no session has been started; that is a
//! caller bug, mirroring the fatal the source library produces.

use crate::errors::TapError;
use crate::log::Directive;
use crate::session::{CatchPolicy, Outcome, Session, SessionConfig, TraceMode};
use crate::value::Value;
use std::cell::RefCell;
use std::panic::UnwindSafe;

thread_local! {
    static CURRENT: RefCell<Option<Session>> = const { RefCell::new(None) };
}

const NOT_STARTED: &str =
    "tapkit::functional: no session active; call functional::start() first";

fn with<R>(f: impl FnOnce(&mut Session) -> R) -> R {
    CURRENT.with(|current| {
        let mut slot = current.borrow_mut();
        let session = slot.as_mut().expect(NOT_STARTED);
        f(session)
    })
}

/// Installs a fresh session for the current thread, replacing any previous
/// one.
pub fn start(config: SessionConfig) {
    CURRENT.with(|current| {
        *current.borrow_mut() = Some(Session::with_config(config));
    });
}

/// Removes and returns the current thread's session.
pub fn finish() -> Session {
    CURRENT.with(|current| current.borrow_mut().take().expect(NOT_STARTED))
}

/// True when a session is active on this thread.
pub fn started() -> bool {
    CURRENT.with(|current| current.borrow().is_some())
}

pub fn plan(count: usize) {
    with(|s| {
        s.plan(count);
    })
}

pub fn trace(mode: TraceMode) {
    with(|s| {
        s.trace(mode);
    })
}

pub fn version(ver: u32) -> Result<(), TapError> {
    with(|s| s.version(ver).map(|_| ()))
}

pub fn ok(test: bool, desc: Option<&str>) -> bool {
    with(|s| s.ok(test, desc, None).ok)
}

pub fn fail(desc: Option<&str>) {
    with(|s| {
        s.fail(desc, None);
    })
}

pub fn pass(desc: Option<&str>) {
    with(|s| {
        s.pass(desc, None);
    })
}

pub fn dies<F>(test: F, desc: Option<&str>, policy: CatchPolicy) -> bool
where
    F: FnOnce() -> Outcome + UnwindSafe,
{
    with(|s| s.dies(test, desc, policy).ok)
}

pub fn cmp_ok(got: &Value, want: &Value, token: &str, desc: Option<&str>) -> bool {
    with(|s| s.cmp_ok(got, want, token, desc, true).ok)
}

pub fn is(got: &Value, want: &Value, desc: Option<&str>) -> bool {
    with(|s| s.is(got, want, desc).ok)
}

pub fn isnt(got: &Value, want: &Value, desc: Option<&str>) -> bool {
    with(|s| s.isnt(got, want, desc).ok)
}

pub fn is_json(got: &Value, want: &Value, desc: Option<&str>) -> bool {
    with(|s| s.is_json(got, want, desc).ok)
}

pub fn is_serialized(got: &Value, want: &Value, desc: Option<&str>, raw_output: bool) -> bool {
    with(|s| s.is_serialized(got, want, desc, raw_output).ok)
}

pub fn is_type(got: &Value, want_name: &str, desc: Option<&str>) -> bool {
    with(|s| s.is_type(got, want_name, desc).ok)
}

pub fn skip(reason: Option<&str>, desc: Option<&str>) {
    with(|s| {
        s.skip(reason, desc);
    })
}

pub fn todo(reason: Option<&str>, desc: Option<&str>) {
    with(|s| {
        s.todo_mark(reason, desc);
    })
}

pub fn diag(message: &str) {
    with(|s| {
        s.diag(message);
    })
}

pub fn diag_value(payload: &Value) {
    with(|s| {
        s.diag_value(payload);
    })
}

/// Adds an explicit directive to an unconditional failure.
pub fn fail_with(desc: Option<&str>, directive: Directive) {
    with(|s| {
        s.fail(desc, Some(directive));
    })
}

/// Renders the current session as TAP without ending it.
pub fn tap() -> String {
    with(|s| s.tap())
}
