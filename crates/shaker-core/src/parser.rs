//! Parser module for JavaScript/TypeScript source code
//!
//! Integrates with SWC for parsing source files into AST. `ParsedFile`
//! keeps the source map around so analysis results can be mapped back to
//! line/column positions.

use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap, Span, Spanned};
use swc_ecma_parser::{EsSyntax, Syntax, TsSyntax, parse_file_as_module};

pub use swc_ecma_ast::{EsVersion, Module};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
}

pub fn detect_language(filename: &str) -> Language {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    match ext.as_str() {
        "ts" | "mts" | "cts" => Language::TypeScript,
        "tsx" => Language::Tsx,
        "jsx" => Language::Jsx,
        _ => Language::JavaScript,
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} at {line}:{column}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParserBuilder {
    jsx: bool,
    typescript: bool,
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jsx(mut self, enabled: bool) -> Self {
        self.jsx = enabled;
        self
    }

    pub fn typescript(mut self, enabled: bool) -> Self {
        self.typescript = enabled;
        self
    }

    pub fn build(self) -> Parser {
        let syntax = if self.typescript {
            Syntax::Typescript(TsSyntax {
                tsx: self.jsx,
                ..Default::default()
            })
        } else {
            Syntax::Es(EsSyntax {
                jsx: self.jsx,
                ..Default::default()
            })
        };

        Parser { syntax }
    }
}

#[derive(Debug, Clone)]
pub struct Parser {
    syntax: Syntax,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            syntax: Syntax::Es(Default::default()),
        }
    }

    pub fn for_file(filename: &str) -> Self {
        match detect_language(filename) {
            Language::JavaScript => Self::new(),
            Language::TypeScript => Self::builder().typescript(true).build(),
            Language::Jsx => Self::builder().jsx(true).build(),
            Language::Tsx => Self::builder().typescript(true).jsx(true).build(),
        }
    }

    pub fn builder() -> ParserBuilder {
        ParserBuilder::new()
    }

    /// Parse with error recovery, collecting recoverable errors instead of
    /// aborting on the first one.
    fn parse_into(
        &self,
        filename: &str,
        code: &str,
        source_map: &Lrc<SourceMap>,
    ) -> (Option<Module>, Vec<ParseError>) {
        let fm = source_map.new_source_file(
            FileName::Custom(filename.to_string()).into(),
            code.to_string(),
        );

        let mut recovered = Vec::new();
        let result = parse_file_as_module(&fm, self.syntax, EsVersion::latest(), None, &mut recovered);

        let to_parse_error = |e: &swc_ecma_parser::error::Error| {
            let loc = source_map.lookup_char_pos(e.span().lo);
            ParseError {
                line: loc.line,
                column: loc.col_display,
                message: e.kind().msg().to_string(),
            }
        };

        let mut errors: Vec<ParseError> = recovered.iter().map(to_parse_error).collect();

        match result {
            Ok(module) => (Some(module), errors),
            Err(e) => {
                errors.push(to_parse_error(&e));
                (None, errors)
            }
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub filename: String,
    pub language: Language,
}

/// A parsed source file together with its source map and any parse errors.
pub struct ParsedFile {
    metadata: FileMetadata,
    source_map: Lrc<SourceMap>,
    module: Option<Module>,
    errors: Vec<ParseError>,
}

impl ParsedFile {
    pub fn from_source(filename: &str, code: &str) -> Self {
        let source_map: Lrc<SourceMap> = Default::default();
        let parser = Parser::for_file(filename);
        let (module, errors) = parser.parse_into(filename, code, &source_map);

        Self {
            metadata: FileMetadata {
                filename: filename.to_string(),
                language: detect_language(filename),
            },
            source_map,
            module,
            errors,
        }
    }

    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    pub fn module(&self) -> Option<&Module> {
        self.module.as_ref()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn is_ok(&self) -> bool {
        self.module.is_some() && self.errors.is_empty()
    }

    /// Resolve a span to 1-based (line, column, end_line, end_column).
    pub fn span_to_range(&self, span: Span) -> (usize, usize, usize, usize) {
        let lo = self.source_map.lookup_char_pos(span.lo);
        let hi = self.source_map.lookup_char_pos(span.hi);
        (lo.line, lo.col_display, hi.line, hi.col_display)
    }
}
