//! Lenient TAP text parser.
//!
//! Recovers summary counts from the TAP output of a sub-unit that did not
//! return a structured result. The scan is deliberately forgiving: lines
//! that match nothing are ignored, and malformed text yields zero counts
//! rather than an error, so a garbled unit simply reads as "ran nothing".

use crate::summary::ResultSummary;
use once_cell::sync::Lazy;
use regex::Regex;

static PLAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^1\.\.(\d+)$").unwrap());
static NOT_OK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^not\s+ok.*$").unwrap());
static OK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^ok.*$").unwrap());
static TODO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)#\s+TODO").unwrap());
static SKIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)#\s+SKIP").unwrap());

/// Parses a TAP text blob into summary counts.
pub struct TapParser;

impl TapParser {
    /// Scans `tap` for a plan line and `ok`/`not ok` result lines.
    ///
    /// Each `not ok` line counts as ran and failed, plus todo when the line
    /// carries a case-insensitive `# TODO` directive. Each `ok` line counts
    /// as ran, plus skipped on `# SKIP`. Never fails.
    pub fn parse(tap: &str) -> ResultSummary {
        let mut summary = ResultSummary::default();

        if let Some(captures) = PLAN.captures(tap) {
            summary.planned = captures[1].parse().unwrap_or(0);
        }

        for line in NOT_OK.find_iter(tap) {
            summary.ran += 1;
            summary.failed += 1;
            if TODO.is_match(line.as_str()) {
                summary.todo += 1;
            }
        }

        for line in OK.find_iter(tap) {
            summary.ran += 1;
            if SKIP.is_match(line.as_str()) {
                summary.skipped += 1;
            }
        }

        summary
    }
}
