//! Structured progress and diagnostic reporting.
//!
//! Routing and relocation runs are long and mostly silent; an operator needs
//! to tell an expected slow-down from a stuck run. Every noteworthy event is
//! a [`Diagnostic`] with a severity, a category-prefixed [`DiagnosticCode`]
//! and an optional location (coordinate, Cut, destination configuration).
//! The thread-safe [`DiagnosticSink`] collects them from the core and from
//! relocation workers; the CLI renders them with [`TerminalRenderer`].

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
