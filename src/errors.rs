//! The crate-wide error type.
//!
//! Assertion failures are never errors: they are recorded as failed log
//! entries and test execution continues. Only two things surface as
//! `TapError` from the core API: invalid configuration (an unsupported TAP
//! version) and executor-level faults, and the harness absorbs the latter
//! into its aggregate session rather than letting them propagate.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TapError {
    /// Only TAP versions 12 and 13 exist; anything else is a configuration
    /// error raised synchronously at the call that requested it.
    #[error("Invalid TAP version {requested}, must be 12 or 13.")]
    #[diagnostic(code(tapkit::config::unsupported_version))]
    UnsupportedVersion { requested: u32 },

    /// A unit raised an error while executing. The harness converts this
    /// into a single aggregate failure naming the unit.
    #[error("test unit '{unit}' failed: {message}")]
    #[diagnostic(code(tapkit::harness::unit_failed))]
    UnitFailed { unit: String, message: String },

    /// An executor could not reach its unit (unreadable file, spawn
    /// failure). Absorbed by the harness like any other unit fault.
    #[error(transparent)]
    #[diagnostic(code(tapkit::exec::io))]
    Io(#[from] std::io::Error),
}
