//! Route-pattern engine.
//!
//! # Data Flow
//! ```text
//! pattern string ("/api/:id(\\d+)")
//!     → lexer.rs (flat token stream)
//!     → parser.rs (literal / parameter segments)
//!     → compiler.rs (one regular expression + ordered keys)
//!     → matcher.rs (path → matched text, offset, params)
//! ```
//!
//! # Design Decisions
//! - Patterns compile once at table construction, never per request
//! - Default parameter patterns exclude the delimiter set; when the text
//!   before a parameter carries no delimiter the compiler emits a
//!   negative-lookahead pattern instead, so the parameter cannot swallow
//!   the literal that terminates it
//! - fancy-regex as the engine: the compiled expressions rely on
//!   lookaheads, which the plain regex crate rejects

pub(crate) mod lexer;

pub mod compiler;
pub mod matcher;
pub mod parser;

pub use compiler::{compile, CompiledPattern};
pub use matcher::{Matcher, ParamValue, Params, PathMatch};
pub use parser::parse;

use thiserror::Error;

/// Pattern syntax or compilation failure. Raised while a route table is
/// being built, never during request handling.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("missing parameter name at {0}")]
    MissingParameterName(usize),
    #[error("pattern cannot start with \"?\" at {0}")]
    PatternStart(usize),
    #[error("capturing groups are not allowed at {0}")]
    CapturingGroup(usize),
    #[error("unbalanced pattern at {0}")]
    UnbalancedPattern(usize),
    #[error("missing pattern at {0}")]
    MissingPattern(usize),
    #[error("dangling escape at {0}")]
    DanglingEscape(usize),
    #[error("must have text between two parameters, missing text after \"{0}\"")]
    MissingSeparator(String),
    #[error("unexpected {found} at {index}, expected {expected}")]
    UnexpectedToken {
        index: usize,
        found: &'static str,
        expected: &'static str,
    },
    #[error("delimiter must not be empty")]
    EmptyDelimiter,
    #[error("compiled pattern {pattern:?} is not a valid regular expression")]
    Regex {
        pattern: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },
}

/// Options shared by the parser and the compiler.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Disallow the optional trailing delimiter.
    pub strict: bool,
    /// Anchor the expression at the start of the path.
    pub start: bool,
    /// Anchor the expression at the end of the path; `false` selects
    /// prefix matching with a segment-boundary guard.
    pub end: bool,
    /// Match case-sensitively.
    pub sensitive: bool,
    /// Characters that terminate a default parameter match.
    pub delimiter: String,
    /// Characters eligible to become an implicit parameter prefix.
    pub prefixes: String,
    /// Optional set of characters treated as an end of input.
    pub ends_with: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            strict: false,
            start: true,
            end: true,
            sensitive: false,
            delimiter: "/#?".to_string(),
            prefixes: "./".to_string(),
            ends_with: String::new(),
        }
    }
}

impl CompileOptions {
    /// Options for prefix matching: identical to the defaults except that
    /// the expression is not end-anchored.
    pub fn prefix() -> Self {
        Self {
            end: false,
            ..Self::default()
        }
    }
}

/// How often a parameter may repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modifier {
    #[default]
    None,
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

impl Modifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::None => "",
            Modifier::Optional => "?",
            Modifier::ZeroOrMore => "*",
            Modifier::OneOrMore => "+",
        }
    }

    /// True for `*` and `+`, whose single capture holds the full repeated
    /// run and is split back into values by the matcher.
    pub fn repeats(self) -> bool {
        matches!(self, Modifier::ZeroOrMore | Modifier::OneOrMore)
    }

    pub(crate) fn from_token(token: &str) -> Self {
        match token {
            "?" => Modifier::Optional,
            "*" => Modifier::ZeroOrMore,
            "+" => Modifier::OneOrMore,
            _ => Modifier::None,
        }
    }
}

/// Parameter descriptor: capture metadata for one named or ordinal
/// parameter. An empty `pattern` marks a bare group that captures nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    /// Explicit name, or the parameter's ordinal rendered in decimal.
    pub name: String,
    pub prefix: String,
    pub suffix: String,
    /// Regular-expression fragment the parameter must match.
    pub pattern: String,
    pub modifier: Modifier,
}

/// One parsed piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Parameter(Key),
}

/// Escape regex metacharacters in literal pattern text.
pub(crate) fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(
            c,
            '.' | '+'
                | '*'
                | '?'
                | '='
                | '^'
                | '!'
                | ':'
                | '$'
                | '{'
                | '}'
                | '('
                | ')'
                | '['
                | ']'
                | '|'
                | '/'
                | '\\'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
