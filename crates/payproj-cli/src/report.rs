//! Notice output for the CLI
//!
//! - `TerminalEmitter`: one `level: message` line per notice
//! - `JsonEmitter`: collects notices for a machine-readable report
//!
//! ## Exit Code Semantics
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success: the last notice is not an error |
//! | 1 | Failure: the last notice is an error |
//!
//! `--quiet` hides success and info notices; it does not affect the exit code.

use std::io::{self, Write};
use std::process;

use payproj_grid::{Notice, NoticeLevel};
use serde::Serialize;

// ============================================================================
// Exit Code
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
}

impl ExitCode {
    /// Exit code for a command whose final outcome is `last`
    pub fn from_last_notice(last: Option<&Notice>) -> Self {
        match last {
            Some(notice) if notice.is_error() => ExitCode::Failure,
            _ => ExitCode::Success,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code as u8)
    }
}

// ============================================================================
// Emitters
// ============================================================================

/// Where command notices go
pub trait NoticeEmitter {
    fn emit(&mut self, notice: Notice);

    /// Last notice emitted, shown or not
    fn last(&self) -> Option<&Notice>;

    fn exit_code(&self) -> ExitCode {
        ExitCode::from_last_notice(self.last())
    }
}

fn should_show(quiet: bool, level: NoticeLevel) -> bool {
    !quiet || level >= NoticeLevel::Warning
}

pub struct TerminalEmitter<W: Write> {
    writer: W,
    quiet: bool,
    last: Option<Notice>,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W, quiet: bool) -> Self {
        Self {
            writer,
            quiet,
            last: None,
        }
    }
}

impl<W: Write> NoticeEmitter for TerminalEmitter<W> {
    fn emit(&mut self, notice: Notice) {
        if should_show(self.quiet, notice.level) {
            // stderr may be closed
            let _ = writeln!(self.writer, "{notice}");
        }
        self.last = Some(notice);
    }

    fn last(&self) -> Option<&Notice> {
        self.last.as_ref()
    }
}

#[derive(Default)]
pub struct JsonEmitter {
    notices: Vec<Notice>,
    quiet: bool,
    last: Option<Notice>,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    ok: bool,
    notices: &'a [Notice],
}

impl JsonEmitter {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            ..Self::default()
        }
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        let report = JsonReport {
            ok: self.exit_code().is_success(),
            notices: &self.notices,
        };
        serde_json::to_value(report).unwrap_or(serde_json::Value::Null)
    }
}

impl NoticeEmitter for JsonEmitter {
    fn emit(&mut self, notice: Notice) {
        if should_show(self.quiet, notice.level) {
            self.notices.push(notice.clone());
        }
        self.last = Some(notice);
    }

    fn last(&self) -> Option<&Notice> {
        self.last.as_ref()
    }
}

/// Emitter chosen by `--format`
pub enum Reporter {
    Terminal(TerminalEmitter<io::Stderr>),
    Json(JsonEmitter),
}

impl Reporter {
    /// Print the JSON report (with `result` unless null) and return the exit code
    pub fn finish(self, result: serde_json::Value) -> ExitCode {
        match self {
            Reporter::Terminal(emitter) => emitter.exit_code(),
            Reporter::Json(emitter) => {
                let mut report = emitter.to_json_value();
                if let (Some(fields), false) = (report.as_object_mut(), result.is_null()) {
                    fields.insert("result".into(), result);
                }
                println!("{report}");
                emitter.exit_code()
            }
        }
    }
}

impl NoticeEmitter for Reporter {
    fn emit(&mut self, notice: Notice) {
        match self {
            Reporter::Terminal(emitter) => emitter.emit(notice),
            Reporter::Json(emitter) => emitter.emit(notice),
        }
    }

    fn last(&self) -> Option<&Notice> {
        match self {
            Reporter::Terminal(emitter) => emitter.last(),
            Reporter::Json(emitter) => emitter.last(),
        }
    }
}
