//! Segment list → one regular expression plus ordered keys.

use fancy_regex::{Regex, RegexBuilder};

use crate::pattern::{escape, parser, CompileOptions, Key, Modifier, PatternError, Segment};

/// A pattern rendered to a regular expression. Immutable once built;
/// building is idempotent and side-effect-free.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub(crate) regex: Regex,
    keys: Vec<Key>,
    source: String,
}

impl CompiledPattern {
    /// Ordered parameter descriptors, one per capturing group.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// The rendered regular expression text.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Tokenize, parse, and render a pattern in one call.
pub fn compile(pattern: &str, options: &CompileOptions) -> Result<CompiledPattern, PatternError> {
    let segments = parser::parse(pattern, options)?;
    render(&segments, options)
}

/// Render parsed segments under the given options.
pub fn render(segments: &[Segment], options: &CompileOptions) -> Result<CompiledPattern, PatternError> {
    if options.delimiter.is_empty() {
        return Err(PatternError::EmptyDelimiter);
    }
    let delimiter = format!("[{}]", escape(&options.delimiter));
    let boundary = if options.ends_with.is_empty() {
        "$".to_string()
    } else {
        format!("[{}]|$", escape(&options.ends_with))
    };

    let mut source = if options.start {
        "^".to_string()
    } else {
        String::new()
    };
    let mut keys = Vec::new();

    for segment in segments {
        match segment {
            Segment::Literal(text) => source.push_str(&escape(text)),
            Segment::Parameter(key) => {
                let prefix = escape(&key.prefix);
                let suffix = escape(&key.suffix);

                if key.pattern.is_empty() {
                    source.push_str(&format!("(?:{prefix}{suffix}){}", key.modifier.as_str()));
                    continue;
                }
                keys.push(key.clone());

                if prefix.is_empty() && suffix.is_empty() {
                    if key.modifier.repeats() {
                        source.push_str(&format!(
                            "((?:{}){})",
                            key.pattern,
                            key.modifier.as_str()
                        ));
                    } else {
                        source.push_str(&format!("({}){}", key.pattern, key.modifier.as_str()));
                    }
                    continue;
                }

                if key.modifier.repeats() {
                    // Inline the repetition so one capture holds the full
                    // run, separated by the parameter's own prefix+suffix.
                    let optional = if key.modifier == Modifier::ZeroOrMore {
                        "?"
                    } else {
                        ""
                    };
                    source.push_str(&format!(
                        "(?:{prefix}((?:{pattern})(?:{suffix}{prefix}(?:{pattern}))*){suffix}){optional}",
                        pattern = key.pattern,
                    ));
                } else {
                    source.push_str(&format!(
                        "(?:{prefix}({}){suffix}){}",
                        key.pattern,
                        key.modifier.as_str()
                    ));
                }
            }
        }
    }

    if options.end {
        if !options.strict {
            source.push_str(&format!("{delimiter}?"));
        }
        if options.ends_with.is_empty() {
            source.push('$');
        } else {
            source.push_str(&format!("(?={boundary})"));
        }
    } else {
        let end_delimited = match segments.last() {
            Some(Segment::Literal(text)) => text
                .chars()
                .last()
                .is_some_and(|c| options.delimiter.contains(c)),
            Some(Segment::Parameter(_)) => false,
            None => true,
        };
        if !options.strict {
            source.push_str(&format!("(?:{delimiter}(?={boundary}))?"));
        }
        if !end_delimited {
            source.push_str(&format!("(?={delimiter}|{boundary})"));
        }
    }

    let regex = RegexBuilder::new(&source)
        .case_insensitive(!options.sensitive)
        .build()
        .map_err(|error| PatternError::Regex {
            pattern: source.clone(),
            source: Box::new(error),
        })?;

    Ok(CompiledPattern {
        regex,
        keys,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(pattern: &str, options: &CompileOptions) -> String {
        compile(pattern, options).unwrap().source().to_string()
    }

    #[test]
    fn literal_end_anchored() {
        assert_eq!(
            source("/api", &CompileOptions::default()),
            "^\\/api[\\/#\\?]?$"
        );
    }

    #[test]
    fn named_parameter_wrapped_in_prefix() {
        assert_eq!(
            source("/api/:id", &CompileOptions::default()),
            "^\\/api(?:\\/([^\\/#\\?]+?))[\\/#\\?]?$"
        );
    }

    #[test]
    fn strict_drops_trailing_delimiter() {
        let options = CompileOptions {
            strict: true,
            ..CompileOptions::default()
        };
        assert_eq!(source("/api", &options), "^\\/api$");
    }

    #[test]
    fn prefix_mode_requires_segment_boundary() {
        assert_eq!(
            source("/api", &CompileOptions::prefix()),
            "^\\/api(?:[\\/#\\?](?=$))?(?=[\\/#\\?]|$)"
        );
    }

    #[test]
    fn prefix_mode_skips_boundary_after_delimiter_literal() {
        assert_eq!(
            source("/", &CompileOptions::prefix()),
            "^\\/(?:[\\/#\\?](?=$))?"
        );
    }

    #[test]
    fn repeated_parameter_inlines_separator() {
        assert_eq!(
            source("/:part+", &CompileOptions::default()),
            "^(?:\\/((?:[^\\/#\\?]+?)(?:\\/(?:[^\\/#\\?]+?))*))[\\/#\\?]?$"
        );
    }

    #[test]
    fn zero_or_more_makes_the_group_optional() {
        assert_eq!(
            source("/:part*", &CompileOptions::default()),
            "^(?:\\/((?:[^\\/#\\?]+?)(?:\\/(?:[^\\/#\\?]+?))*))?[\\/#\\?]?$"
        );
    }

    #[test]
    fn ends_with_becomes_a_lookahead() {
        let options = CompileOptions {
            ends_with: "?".to_string(),
            ..CompileOptions::default()
        };
        assert_eq!(source("/api", &options), "^\\/api[\\/#\\?]?(?=[\\?]|$)");
    }

    #[test]
    fn bare_group_compiles_without_a_key() {
        let compiled = compile("/api{/v1}", &CompileOptions::default()).unwrap();
        assert!(compiled.keys().is_empty());
        assert_eq!(compiled.source(), "^\\/api(?:\\/v1)?[\\/#\\?]?$");
    }

    #[test]
    fn case_insensitive_by_default() {
        let compiled = compile("/API", &CompileOptions::default()).unwrap();
        assert!(compiled.regex.is_match("/api").unwrap());

        let sensitive = CompileOptions {
            sensitive: true,
            ..CompileOptions::default()
        };
        let compiled = compile("/API", &sensitive).unwrap();
        assert!(!compiled.regex.is_match("/api").unwrap());
    }

    #[test]
    fn empty_delimiter_is_rejected() {
        let options = CompileOptions {
            delimiter: String::new(),
            ..CompileOptions::default()
        };
        assert!(matches!(
            compile("/api", &options),
            Err(PatternError::EmptyDelimiter)
        ));
    }

    #[test]
    fn compiling_is_idempotent() {
        let first = compile("/api/:id", &CompileOptions::default()).unwrap();
        let second = compile("/api/:id", &CompileOptions::default()).unwrap();
        assert_eq!(first.source(), second.source());
        assert_eq!(first.keys(), second.keys());
    }
}
