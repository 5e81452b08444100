//! The core diagnostic type and its builder methods.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A single event reported by the coverage or relocation engine.
///
/// Unlike compiler diagnostics there is no source text to point into; the
/// `location` names the fabric place the event concerns, e.g. `X10Y20`,
/// `X10Y20 cut 3` or `min_config_2 @ X0Y1`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// How serious this event is.
    pub severity: Severity,
    /// Structured code identifying the kind of event.
    pub code: DiagnosticCode,
    /// The main message.
    pub message: String,
    /// Where in the fabric or run the event happened.
    pub location: Option<String>,
    /// Additional lines of context.
    pub notes: Vec<String>,
    /// Operator hints.
    pub help: Vec<String>,
}

impl Diagnostic {
    fn with_severity(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            location: None,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates an error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, code, message)
    }

    /// Creates a warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, code, message)
    }

    /// Creates a progress note.
    pub fn note(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Note, code, message)
    }

    /// Creates a debug-level diagnostic.
    pub fn debug(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Debug, code, message)
    }

    /// Sets the location.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Appends a note line.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Appends a help line.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{CUT_ABANDONED, RUN_DONE, UNREACHABLE_PIPS};

    #[test]
    fn builders_set_severity() {
        assert_eq!(Diagnostic::error(RUN_DONE, "x").severity, Severity::Error);
        assert_eq!(Diagnostic::warning(RUN_DONE, "x").severity, Severity::Warning);
        assert_eq!(Diagnostic::note(RUN_DONE, "x").severity, Severity::Note);
        assert_eq!(Diagnostic::debug(RUN_DONE, "x").severity, Severity::Debug);
    }

    #[test]
    fn builder_chain() {
        let diag = Diagnostic::warning(UNREACHABLE_PIPS, "12 PIPs unreachable")
            .at("X1Y1")
            .with_note("INT_X1Y1/NN1END0 -> NN1BEG0")
            .with_help("increase window_radius");
        assert_eq!(diag.location.as_deref(), Some("X1Y1"));
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(diag.help, vec!["increase window_radius".to_string()]);
    }

    #[test]
    fn serde_roundtrip() {
        let diag = Diagnostic::debug(CUT_ABANDONED, "no path").at("X2Y3 cut 4");
        let json = serde_json::to_string(&diag).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(diag, back);
    }
}
