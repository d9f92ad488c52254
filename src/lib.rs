//! tapkit: a lightweight TAP assertion library and test harness.
//!
//! A [`Session`] accumulates pass/fail results for individual checks and
//! renders them in the Test Anything Protocol text format. A [`Harness`]
//! runs a list of test units through a pluggable [`UnitExecutor`], decides
//! each unit's pass/fail from its returned result object or its parsed TAP
//! output, and aggregates the roll-up into its own session.
//!
//! ```rust
//! use tapkit::{Session, Value};
//!
//! let mut test = Session::new();
//! test.plan(2);
//! test.is(&Value::Int(2), &Value::Int(2), Some("two is two"));
//! test.ok(true, Some("still fine"), None);
//! assert!(test.success(true));
//! print!("{}", test.tap());
//! ```

pub mod cli;
pub mod errors;
pub mod exec;
pub mod functional;
pub mod harness;
pub mod log;
pub mod output;
pub mod parser;
pub mod session;
pub mod summary;
pub mod value;

pub use errors::TapError;
pub use harness::{Execution, Harness, UnitExecutor, UnitResult};
pub use log::{CmpDetails, Directive, ResultLog, StackFrame, Thrown};
pub use output::{OutputBuffer, OutputSink, StdoutSink};
pub use parser::TapParser;
pub use session::{
    CatchPolicy, Comparator, Outcome, Session, SessionConfig, TapVersion, TraceMode, Verbosity,
};
pub use summary::ResultSummary;
pub use value::{TypeRegistry, Value};
