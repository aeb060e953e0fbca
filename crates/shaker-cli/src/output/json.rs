//! JSON output formatter for diagnostic display
//!
//! Provides a structured JSON document for programmatic integration.

use serde::Serialize;
use shaker_core::diagnostic::{Diagnostic, Severity};

#[derive(Serialize)]
pub struct JsonOutput<'a> {
    pub version: &'static str,
    pub summary: JsonSummary,
    pub diagnostics: &'a [Diagnostic],
}

#[derive(Serialize)]
pub struct JsonSummary {
    pub total_files: usize,
    pub total_diagnostics: usize,
    pub errors: usize,
    pub warnings: usize,
}

pub struct JsonFormatter {
    total_files: usize,
}

impl JsonFormatter {
    pub fn new(total_files: usize) -> Self {
        Self { total_files }
    }

    pub fn format(&self, diagnostics: &[Diagnostic]) -> serde_json::Result<String> {
        let output = JsonOutput {
            version: env!("CARGO_PKG_VERSION"),
            summary: JsonSummary {
                total_files: self.total_files,
                total_diagnostics: diagnostics.len(),
                errors: count(diagnostics, Severity::Error),
                warnings: count(diagnostics, Severity::Warning),
            },
            diagnostics,
        };
        serde_json::to_string_pretty(&output)
    }
}

fn count(diagnostics: &[Diagnostic], severity: Severity) -> usize {
    diagnostics.iter().filter(|d| d.severity == severity).count()
}
