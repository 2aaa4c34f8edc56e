//! Compiled pattern → path match with extracted parameters.

use crate::pattern::CompiledPattern;

/// An ordered parameter map extracted from one match. Insertion order
/// follows capture order; inserting an existing name replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

/// A single captured value, or the ordered values of a repeated (`*`/`+`)
/// parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Value(String),
    Values(Vec<String>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Value(value) => Some(value),
            ParamValue::Values(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ParamValue::Value(_) => None,
            ParamValue::Values(values) => Some(values),
        }
    }
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

/// A successful match: the matched substring, its offset in the candidate
/// path, and the extracted parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    pub text: String,
    pub offset: usize,
    pub params: Params,
}

/// Runs a compiled pattern against candidate paths.
#[derive(Debug, Clone)]
pub struct Matcher {
    pattern: CompiledPattern,
}

impl Matcher {
    pub fn new(pattern: CompiledPattern) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    /// Match without decoding values.
    pub fn matches(&self, path: &str) -> Option<PathMatch> {
        self.matches_with(path, |value| value.to_string())
    }

    /// Match, applying `decode` to every extracted value. Repeated
    /// parameters are split on their own prefix+suffix before decoding;
    /// an empty separator yields the whole run as a single value.
    pub fn matches_with<F>(&self, path: &str, decode: F) -> Option<PathMatch>
    where
        F: Fn(&str) -> String,
    {
        let captures = match self.pattern.regex.captures(path) {
            Ok(Some(captures)) => captures,
            Ok(None) => return None,
            Err(error) => {
                tracing::warn!(
                    pattern = %self.pattern.source(),
                    path = %path,
                    error = %error,
                    "pattern evaluation failed"
                );
                return None;
            }
        };

        let full = captures.get(0)?;
        let mut params = Params::new();
        for (position, key) in self.pattern.keys().iter().enumerate() {
            let Some(group) = captures.get(position + 1) else {
                continue;
            };
            let text = group.as_str();
            if key.modifier.repeats() {
                let separator = format!("{}{}", key.prefix, key.suffix);
                let values = if separator.is_empty() {
                    vec![decode(text)]
                } else {
                    text.split(separator.as_str()).map(|v| decode(v)).collect()
                };
                params.insert(key.name.clone(), ParamValue::Values(values));
            } else {
                params.insert(key.name.clone(), ParamValue::Value(decode(text)));
            }
        }

        Some(PathMatch {
            text: full.as_str().to_string(),
            offset: full.start(),
            params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{compile, CompileOptions};

    fn matcher(pattern: &str) -> Matcher {
        Matcher::new(compile(pattern, &CompileOptions::default()).unwrap())
    }

    fn prefix_matcher(pattern: &str) -> Matcher {
        Matcher::new(compile(pattern, &CompileOptions::prefix()).unwrap())
    }

    #[test]
    fn scalar_parameter() {
        let m = matcher("/api/widgets/:id").matches("/api/widgets/42").unwrap();
        assert_eq!(m.text, "/api/widgets/42");
        assert_eq!(m.offset, 0);
        assert_eq!(m.params.get("id").unwrap().as_str(), Some("42"));
    }

    #[test]
    fn custom_pattern_rejects_mismatch() {
        let m = matcher("/:id(\\d+)");
        assert!(m.matches("/42").is_some());
        assert!(m.matches("/fourty-two").is_none());
    }

    #[test]
    fn optional_parameter_may_be_absent() {
        let m = matcher("/:id?");
        let hit = m.matches("/42").unwrap();
        assert_eq!(hit.params.get("id").unwrap().as_str(), Some("42"));
        let empty = m.matches("").unwrap();
        assert!(empty.params.get("id").is_none());
    }

    #[test]
    fn repeated_parameter_splits_on_prefix() {
        let m = matcher("/:path+").matches("/a/b/c").unwrap();
        assert_eq!(
            m.params.get("path").unwrap().as_list(),
            Some(&["a".to_string(), "b".to_string(), "c".to_string()][..])
        );
    }

    #[test]
    fn zero_or_more_allows_empty() {
        let m = matcher("/:path*");
        assert!(m.matches("").unwrap().params.get("path").is_none());
        assert_eq!(
            m.matches("/x/y").unwrap().params.get("path").unwrap().as_list(),
            Some(&["x".to_string(), "y".to_string()][..])
        );
    }

    #[test]
    fn optional_group_round_trips() {
        let m = matcher("{/:lang}");
        assert_eq!(
            m.matches("/en").unwrap().params.get("lang").unwrap().as_str(),
            Some("en")
        );
        assert!(m.matches("").unwrap().params.get("lang").is_none());
    }

    #[test]
    fn group_with_suffix_splits_repeats_on_both() {
        let m = matcher("{-:part}+").matches("-a-b").unwrap();
        assert_eq!(
            m.params.get("part").unwrap().as_list(),
            Some(&["a".to_string(), "b".to_string()][..])
        );
    }

    #[test]
    fn prefix_mode_reports_matched_text_only() {
        let m = prefix_matcher("/api").matches("/api/x").unwrap();
        assert_eq!(m.text, "/api");
        assert_eq!(m.offset, 0);
    }

    #[test]
    fn prefix_mode_refuses_partial_segment() {
        assert!(prefix_matcher("/api").matches("/apiextra").is_none());
    }

    #[test]
    fn prefix_mode_accepts_exact_and_trailing_slash() {
        let m = prefix_matcher("/api");
        assert!(m.matches("/api").is_some());
        assert_eq!(m.matches("/api/").unwrap().text, "/api/");
    }

    #[test]
    fn decode_hook_applies_per_value() {
        let m = matcher("/:name");
        let hit = m
            .matches_with("/a%20b", |value| value.replace("%20", " "))
            .unwrap();
        assert_eq!(hit.params.get("name").unwrap().as_str(), Some("a b"));
    }

    #[test]
    fn ordinal_keys_are_stringified() {
        let m = matcher("/(\\d+)").matches("/7").unwrap();
        assert_eq!(m.params.get("0").unwrap().as_str(), Some("7"));
    }
}
