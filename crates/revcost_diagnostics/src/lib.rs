//! Diagnostic creation, severity management, and rendering.
//!
//! This crate provides structured [`Diagnostic`] messages with severity levels,
//! codes, an optional subject (the operation node concerned), notes and help
//! text. The thread-safe [`DiagnosticSink`] accumulates diagnostics while call
//! graphs are expanded, possibly from several rayon workers, and
//! [`DiagnosticRenderer`] implementations format them for a terminal or JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
