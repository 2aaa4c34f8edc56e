//! Token stream → ordered segment list.
//!
//! # Responsibilities
//! - Fold literal runs into literal segments
//! - Attach an implicit prefix character (from the configured prefix set)
//!   to the parameter that follows it
//! - Derive the default "safe" pattern for parameters without an explicit
//!   one, refusing ambiguous adjacent parameters
//! - Parse `{prefix:name(pattern)suffix}` groups into single segments,
//!   optional by construction

use crate::pattern::lexer::{self, Token, TokenKind};
use crate::pattern::{escape, CompileOptions, Key, Modifier, PatternError, Segment};

/// Parse a pattern string into segments. Only the `prefixes` and
/// `delimiter` options participate.
pub fn parse(pattern: &str, options: &CompileOptions) -> Result<Vec<Segment>, PatternError> {
    if options.delimiter.is_empty() {
        return Err(PatternError::EmptyDelimiter);
    }
    let tokens = lexer::tokenize(pattern)?;
    Parser {
        tokens,
        index: 0,
        next_ordinal: 0,
        path: String::new(),
        segments: Vec::new(),
        default_pattern: format!("[^{}]+?", escape(&options.delimiter)),
    }
    .run(options)
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    next_ordinal: usize,
    /// Pending literal text, flushed at parameter and group boundaries.
    path: String,
    segments: Vec<Segment>,
    default_pattern: String,
}

impl Parser {
    fn run(mut self, options: &CompileOptions) -> Result<Vec<Segment>, PatternError> {
        loop {
            let char_value = self.try_consume(TokenKind::Char);
            let name = self.try_consume(TokenKind::Name);
            let pattern = self.try_consume(TokenKind::Pattern);

            if name.is_some() || pattern.is_some() {
                let mut prefix = char_value.unwrap_or_default();
                if !prefix.is_empty() && !options.prefixes.contains(&prefix) {
                    self.path.push_str(&prefix);
                    prefix = String::new();
                }
                self.flush_path();

                let pattern = match pattern {
                    Some(pattern) => pattern,
                    None => self.safe_pattern(&prefix, &options.delimiter)?,
                };
                let name = name.unwrap_or_else(|| self.ordinal());
                let modifier = self.modifier().unwrap_or(Modifier::None);
                self.segments.push(Segment::Parameter(Key {
                    name,
                    prefix,
                    suffix: String::new(),
                    pattern,
                    modifier,
                }));
                continue;
            }

            if let Some(value) = char_value.or_else(|| self.try_consume(TokenKind::EscapedChar)) {
                self.path.push_str(&value);
                continue;
            }
            self.flush_path();

            if self.try_consume(TokenKind::Open).is_some() {
                let prefix = self.consume_text();
                let name = self.try_consume(TokenKind::Name).unwrap_or_default();
                let pattern = self.try_consume(TokenKind::Pattern).unwrap_or_default();
                let suffix = self.consume_text();
                self.must_consume(TokenKind::Close)?;

                let key_name = if !name.is_empty() {
                    name.clone()
                } else if !pattern.is_empty() {
                    self.ordinal()
                } else {
                    String::new()
                };
                let key_pattern = if !name.is_empty() && pattern.is_empty() {
                    self.default_pattern.clone()
                } else {
                    pattern
                };
                // A group is optional unless an explicit modifier says
                // otherwise.
                let modifier = self.modifier().unwrap_or(Modifier::Optional);
                self.segments.push(Segment::Parameter(Key {
                    name: key_name,
                    prefix,
                    suffix,
                    pattern: key_pattern,
                    modifier,
                }));
                continue;
            }

            self.must_consume(TokenKind::End)?;
            return Ok(self.segments);
        }
    }

    /// Default pattern for a parameter with no explicit one: any run of
    /// non-delimiter characters, narrowed by a negative lookahead when the
    /// text just before the parameter carries no delimiter of its own.
    fn safe_pattern(&self, prefix: &str, delimiter: &str) -> Result<String, PatternError> {
        let preceding = if !prefix.is_empty() {
            prefix.to_string()
        } else {
            match self.segments.last() {
                Some(Segment::Literal(text)) => text.clone(),
                Some(Segment::Parameter(key)) => {
                    return Err(PatternError::MissingSeparator(key.name.clone()));
                }
                None => String::new(),
            }
        };
        if preceding.is_empty() || delimiter.chars().any(|d| preceding.contains(d)) {
            return Ok(self.default_pattern.clone());
        }
        Ok(format!(
            "(?:(?!{})[^{}])+?",
            escape(&preceding),
            escape(delimiter)
        ))
    }

    fn try_consume(&mut self, kind: TokenKind) -> Option<String> {
        let token = &self.tokens[self.index];
        if token.kind == kind && kind != TokenKind::End {
            self.index += 1;
            return Some(token.value.clone());
        }
        None
    }

    fn must_consume(&mut self, kind: TokenKind) -> Result<(), PatternError> {
        let token = &self.tokens[self.index];
        if token.kind == kind {
            self.index += 1;
            return Ok(());
        }
        Err(PatternError::UnexpectedToken {
            index: token.index,
            found: token.kind.describe(),
            expected: kind.describe(),
        })
    }

    fn consume_text(&mut self) -> String {
        let mut text = String::new();
        loop {
            match self
                .try_consume(TokenKind::Char)
                .or_else(|| self.try_consume(TokenKind::EscapedChar))
            {
                Some(value) => text.push_str(&value),
                None => return text,
            }
        }
    }

    fn modifier(&mut self) -> Option<Modifier> {
        self.try_consume(TokenKind::Modifier)
            .map(|m| Modifier::from_token(&m))
    }

    fn ordinal(&mut self) -> String {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        ordinal.to_string()
    }

    fn flush_path(&mut self) {
        if !self.path.is_empty() {
            self.segments
                .push(Segment::Literal(std::mem::take(&mut self.path)));
        }
    }
}
