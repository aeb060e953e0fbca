//! Shaker Core - Value-flow dead-code analysis for JavaScript/TypeScript
//!
//! This crate provides the core analysis functionality including:
//! - Parser integration with SWC
//! - Value-flow graph construction and saturation
//! - Reachability marking for dead-code detection
//! - Diagnostic reporting
//! - Configuration loading

pub mod analysis;
pub mod config;
pub mod diagnostic;
pub mod flow;
pub mod parser;
pub mod reach;

#[cfg(test)]
mod tests {
    #[test]
    fn parser_module_accessible() {
        let _ = crate::parser::Parser::new();
    }

    #[test]
    fn flow_module_accessible() {
        let _ = crate::flow::FlowGraph::new();
    }

    #[test]
    fn diagnostic_module_accessible() {
        let _ = crate::diagnostic::Severity::Warning;
    }

    #[test]
    fn swc_parser_is_available() {
        use swc_ecma_parser::{Parser, StringInput, Syntax};

        let src = "const x = 1;";
        let input = StringInput::new(src, Default::default(), Default::default());
        let syntax = Syntax::Es(Default::default());
        let _ = Parser::new(syntax, input, None);
    }
}
