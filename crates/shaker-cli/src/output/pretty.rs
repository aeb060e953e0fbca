//! Pretty formatter for human-readable terminal output
//!
//! Displays diagnostics with colors, source code context, and a summary.

use std::collections::HashMap;
use std::fs;

use colored::{ColoredString, Colorize};
use shaker_core::diagnostic::{Diagnostic, Severity};

pub struct PrettyFormatter {
    sources: HashMap<String, String>,
}

impl PrettyFormatter {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    #[cfg(test)]
    fn with_sources(sources: HashMap<String, String>) -> Self {
        Self { sources }
    }

    pub fn format(&self, diagnostics: &[Diagnostic], file_count: usize) -> String {
        let mut output = String::new();

        for diag in diagnostics {
            output.push_str(&self.format_diagnostic(diag));
            output.push('\n');
        }

        output.push_str(&self.format_summary(diagnostics, file_count));
        output
    }

    fn format_diagnostic(&self, diag: &Diagnostic) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{}[{}]: {}",
            colorize_severity(diag.severity),
            diag.rule_id.dimmed(),
            diag.message
        ));
        lines.push(format!(
            "  {} {}:{}:{}",
            "-->".blue(),
            diag.file,
            diag.line,
            diag.column
        ));

        if let Some(source_line) = self.source_line(&diag.file, diag.line) {
            let gutter = " ".repeat(diag.line.to_string().len());
            lines.push(format!("{} {}", gutter, "|".blue()));
            lines.push(format!(
                "{} {} {}",
                diag.line.to_string().blue(),
                "|".blue(),
                source_line
            ));
            lines.push(format!("{} {}", gutter, "|".blue()));
        }

        if let Some(suggestion) = &diag.suggestion {
            let gutter = " ".repeat(diag.line.to_string().len());
            lines.push(format!(
                "{} {} {} {}",
                gutter,
                "=".blue(),
                "suggestion:".green(),
                suggestion
            ));
        }

        lines.join("\n")
    }

    fn source_line(&self, file: &str, line: usize) -> Option<String> {
        if let Some(source) = self.sources.get(file) {
            return source.lines().nth(line - 1).map(|s| s.to_string());
        }
        if let Ok(content) = fs::read_to_string(file) {
            return content.lines().nth(line - 1).map(|s| s.to_string());
        }
        None
    }

    fn format_summary(&self, diagnostics: &[Diagnostic], file_count: usize) -> String {
        let files_str = if file_count == 1 { "file" } else { "files" };

        if diagnostics.is_empty() {
            return format!(
                "{} No unreachable functions in {} {}\n",
                "✓".green().bold(),
                file_count,
                files_str
            );
        }

        let errors = count(diagnostics, Severity::Error);
        let warnings = count(diagnostics, Severity::Warning);
        let problems_str = if diagnostics.len() == 1 {
            "problem"
        } else {
            "problems"
        };

        format!(
            "\nFound {} {} in {} {} ({}, {})\n",
            diagnostics.len().to_string().bold(),
            problems_str,
            file_count,
            files_str,
            pluralize(errors, "error").red(),
            pluralize(warnings, "warning").yellow()
        )
    }
}

fn count(diagnostics: &[Diagnostic], severity: Severity) -> usize {
    diagnostics.iter().filter(|d| d.severity == severity).count()
}

fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn colorize_severity(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Info => "info".blue().bold(),
    }
}

impl Default for PrettyFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dead_function_diagnostic(line: usize) -> Diagnostic {
        Diagnostic::new(
            "D001",
            Severity::Warning,
            "Function 'dead' is never reachable from any root",
            "test.js",
            line,
            1,
        )
        .with_suggestion("Remove 'dead' or export it if it is part of the public API")
    }

    #[test]
    fn formats_diagnostic_with_location_and_message() {
        let formatter = PrettyFormatter::new();
        let output = formatter.format(&[dead_function_diagnostic(2)], 1);

        assert!(output.contains("warning"));
        assert!(output.contains("D001"));
        assert!(output.contains("never reachable"));
        assert!(output.contains("test.js:2:1"));
    }

    #[test]
    fn shows_source_context_when_available() {
        let mut sources = HashMap::new();
        sources.insert(
            "test.js".to_string(),
            "function used() {}\nfunction dead() {}\n".to_string(),
        );
        let formatter = PrettyFormatter::with_sources(sources);

        let output = formatter.format(&[dead_function_diagnostic(2)], 1);

        assert!(output.contains("function dead() {}"));
    }

    #[test]
    fn shows_suggestion() {
        let formatter = PrettyFormatter::new();
        let output = formatter.format(&[dead_function_diagnostic(2)], 1);

        assert!(output.contains("suggestion:"));
        assert!(output.contains("Remove 'dead'"));
    }

    #[test]
    fn summary_counts_problems_and_files() {
        let formatter = PrettyFormatter::new();
        let diags = vec![dead_function_diagnostic(1), dead_function_diagnostic(2)];

        let output = formatter.format(&diags, 3);

        assert!(output.contains("Found"));
        assert!(output.contains("2"));
        assert!(output.contains("problems"));
        assert!(output.contains("3 files"));
        assert!(output.contains("2 warnings"));
    }

    #[test]
    fn clean_run_prints_success_summary() {
        let formatter = PrettyFormatter::new();
        let output = formatter.format(&[], 5);

        assert!(output.contains("No unreachable functions"));
        assert!(output.contains("5 files"));
    }

    #[test]
    fn singular_forms_are_used() {
        let formatter = PrettyFormatter::new();
        let output = formatter.format(&[dead_function_diagnostic(1)], 1);

        assert!(output.contains("1 problem"));
        assert!(output.contains("1 file"));
        assert!(output.contains("1 warning"));
    }
}
