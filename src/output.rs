//! Output sinks for unit execution.
//!
//! Units never write to a global stream. The executor hands each unit a
//! sink for the duration of its run, so capture is scoped to the unit and
//! released on every exit path by construction.

use std::io::Write;

/// Destination for a test unit's textual output.
pub trait OutputSink {
    fn emit(&mut self, text: &str);
}

/// Collects output into a String for capture by the harness.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    buffer: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

impl OutputSink for OutputBuffer {
    fn emit(&mut self, text: &str) {
        self.buffer.push_str(text);
        if !text.ends_with('\n') {
            self.buffer.push('\n');
        }
    }
}

/// Writes output straight to stdout, for standalone unit programs.
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, text: &str) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        let _ = writeln!(handle, "{}", text.trim_end_matches('\n'));
    }
}
