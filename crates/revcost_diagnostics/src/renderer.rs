//! Diagnostic rendering backends for human-readable and machine-readable output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// ```text
/// warning[K001]: symbolic constant; load cost is an upper bound
///   --> AddK(n, k)
///    = note: ...
///    = help: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, severity: Severity, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[1;{}m{text}\x1b[0m", severity.ansi_color())
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let header = format!("{}[{}]", diag.severity, diag.code);
        let mut out = format!("{}: {}\n", self.paint(diag.severity, &header), diag.message);
        if let Some(subject) = &diag.subject {
            out.push_str(&format!("  --> {subject}\n"));
        }
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }
        out
    }
}

/// Renders each diagnostic as one line of JSON.
pub struct JsonRenderer;

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        serde_json::to_string(diag).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};

    fn sample() -> Diagnostic {
        Diagnostic::warning(DiagnosticCode::new(Category::Cost, 1), "load cost is an upper bound")
            .with_subject("AddK(n, k)")
            .with_note("k is symbolic")
            .with_help("bind k")
    }

    #[test]
    fn terminal_plain() {
        let out = TerminalRenderer::new(false).render(&sample());
        assert_eq!(
            out,
            "warning[K001]: load cost is an upper bound\n  --> AddK(n, k)\n   = note: k is symbolic\n   = help: bind k\n"
        );
    }

    #[test]
    fn terminal_color_wraps_header() {
        let out = TerminalRenderer::new(true).render(&sample());
        assert!(out.starts_with("\x1b[1;33mwarning[K001]\x1b[0m: "));
    }

    #[test]
    fn terminal_without_subject() {
        let diag = Diagnostic::error(DiagnosticCode::new(Category::Error, 3), "cycle");
        assert_eq!(TerminalRenderer::new(false).render(&diag), "error[E003]: cycle\n");
    }

    #[test]
    fn json_roundtrip() {
        let line = JsonRenderer.render(&sample());
        let back: Diagnostic = serde_json::from_str(&line).unwrap();
        assert_eq!(back, sample());
    }
}
