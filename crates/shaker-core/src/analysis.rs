//! Analysis engine for dead-function detection
//!
//! Drives the value-flow analysis and reachability marking over a parsed
//! file and turns the results into diagnostics for CLI and other consumers.

use crate::config::Config;
use crate::diagnostic::{Diagnostic, Severity};
use crate::flow::{FlowAnalysis, FlowOptions};
use crate::parser::ParsedFile;
use crate::reach::Reachability;

pub const DEAD_FUNCTION_RULE: &str = "D001";

pub struct AnalysisEngine {
    config: Config,
}

impl AnalysisEngine {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn analyze(&self, file: &ParsedFile) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let filename = &file.metadata().filename;

        for error in file.errors() {
            diagnostics.push(Diagnostic::new(
                "PARSE",
                Severity::Error,
                &error.message,
                filename,
                error.line,
                error.column,
            ));
        }

        let Some(module) = file.module() else {
            return diagnostics;
        };

        let options = FlowOptions {
            var_init_flow: self.config.analysis.var_init_flow,
        };
        let analysis = FlowAnalysis::build_with_options(module, options);
        let roots = self.roots(&analysis);
        let reach = Reachability::compute(&analysis, &roots);

        tracing::debug!(
            file = %filename,
            functions = analysis.functions().count(),
            live = reach.live_count(),
            roots = roots.len(),
            "reachability computed"
        );

        for record in analysis.functions() {
            if reach.is_live(record.id) {
                continue;
            }

            let (line, column, end_line, end_column) = file.span_to_range(record.span);
            let display_name = record.name.as_deref().unwrap_or("<anonymous>");

            let diagnostic = Diagnostic::new(
                DEAD_FUNCTION_RULE,
                Severity::Warning,
                format!("Function '{display_name}' is never reachable from any root"),
                filename,
                line,
                column,
            )
            .with_end(end_line, end_column)
            .with_suggestion(format!(
                "Remove '{display_name}' or export it if it is part of the public API"
            ));

            diagnostics.push(diagnostic);
        }

        diagnostics
    }

    /// Root selection: configured entries first, then exported names, then
    /// every top-level binding.
    fn roots(&self, analysis: &FlowAnalysis) -> Vec<String> {
        if !self.config.roots.entries.is_empty() {
            return self.config.roots.entries.clone();
        }
        if !analysis.exports().is_empty() {
            return analysis.exports().to_vec();
        }
        analysis
            .bindings()
            .map(|(name, _)| name.to_string())
            .collect()
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RootsConfig;

    fn engine_with_roots(roots: &[&str]) -> AnalysisEngine {
        AnalysisEngine::with_config(Config {
            roots: RootsConfig {
                entries: roots.iter().map(|s| s.to_string()).collect(),
            },
            ..Config::default()
        })
    }

    #[test]
    fn syntax_errors_become_diagnostics() {
        let engine = AnalysisEngine::new();
        let file = ParsedFile::from_source("test.js", "const = ;");

        let diagnostics = engine.analyze(&file);

        assert!(
            diagnostics.iter().any(|d| d.rule_id == "PARSE"),
            "Expected PARSE diagnostic for syntax error"
        );
    }

    #[test]
    fn dead_function_is_reported() {
        let engine = engine_with_roots(&["entry"]);
        let file = ParsedFile::from_source(
            "test.js",
            "function used() {}\nfunction dead() {}\nvar entry = used;\n",
        );

        let diagnostics = engine.analyze(&file);

        assert_eq!(diagnostics.len(), 1);
        let diagnostic = &diagnostics[0];
        assert_eq!(diagnostic.rule_id, DEAD_FUNCTION_RULE);
        assert!(diagnostic.message.contains("dead"));
        assert_eq!(diagnostic.line, 2);
        assert!(diagnostic.suggestion.is_some());
    }

    #[test]
    fn reachable_functions_are_not_reported() {
        let engine = engine_with_roots(&["entry"]);
        let file = ParsedFile::from_source(
            "test.js",
            "function used() {}\nvar entry = { run: used };\n",
        );

        let diagnostics = engine.analyze(&file);

        assert!(diagnostics.is_empty());
    }

    #[test]
    fn exports_serve_as_default_roots() {
        let engine = AnalysisEngine::new();
        let file = ParsedFile::from_source(
            "test.js",
            "export function api() {}\nfunction dead() {}\n",
        );

        let diagnostics = engine.analyze(&file);

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("dead"));
    }

    #[test]
    fn without_roots_or_exports_all_bindings_are_roots() {
        let engine = AnalysisEngine::new();
        let file = ParsedFile::from_source("test.js", "function a() {}\nfunction b() {}\n");

        let diagnostics = engine.analyze(&file);

        assert!(diagnostics.is_empty(), "every binding is a root");
    }

    #[test]
    fn anonymous_dead_functions_are_named_in_the_message() {
        let engine = engine_with_roots(&["entry"]);
        let file = ParsedFile::from_source(
            "test.js",
            "var entry = 1;\n[1].map(() => {});\n",
        );

        let diagnostics = engine.analyze(&file);

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("<anonymous>"));
    }

    #[test]
    fn var_init_flow_toggle_changes_results() {
        let code = "function f() {}\nvar entry = f;\n";
        let strict = AnalysisEngine::with_config(Config {
            roots: RootsConfig {
                entries: vec!["entry".to_string()],
            },
            analysis: crate::config::AnalysisConfig {
                var_init_flow: false,
            },
            ..Config::default()
        });
        let file = ParsedFile::from_source("test.js", code);

        let diagnostics = strict.analyze(&file);

        assert_eq!(
            diagnostics.len(),
            1,
            "without the initializer edge the function never reaches the root"
        );
    }
}
