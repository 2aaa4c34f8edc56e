//! Pattern string → flat token stream.

use crate::pattern::PatternError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Char,
    EscapedChar,
    Name,
    Pattern,
    Modifier,
    Open,
    Close,
    End,
}

impl TokenKind {
    pub(crate) fn describe(self) -> &'static str {
        match self {
            TokenKind::Char => "character",
            TokenKind::EscapedChar => "escaped character",
            TokenKind::Name => "parameter name",
            TokenKind::Pattern => "pattern",
            TokenKind::Modifier => "modifier",
            TokenKind::Open => "{",
            TokenKind::Close => "}",
            TokenKind::End => "end of pattern",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) index: usize,
    pub(crate) value: String,
}

impl Token {
    fn new(kind: TokenKind, index: usize, value: impl Into<String>) -> Self {
        Self {
            kind,
            index,
            value: value.into(),
        }
    }
}

/// Scan a pattern into tokens, terminated by an `End` token. Indices are
/// character positions.
pub(crate) fn tokenize(pattern: &str) -> Result<Vec<Token>, PatternError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            c @ ('*' | '+' | '?') => {
                tokens.push(Token::new(TokenKind::Modifier, i, c));
                i += 1;
            }
            '\\' => {
                let value = *chars.get(i + 1).ok_or(PatternError::DanglingEscape(i))?;
                tokens.push(Token::new(TokenKind::EscapedChar, i, value));
                i += 2;
            }
            '{' => {
                tokens.push(Token::new(TokenKind::Open, i, '{'));
                i += 1;
            }
            '}' => {
                tokens.push(Token::new(TokenKind::Close, i, '}'));
                i += 1;
            }
            ':' => {
                let mut name = String::new();
                let mut j = i + 1;
                while j < chars.len() {
                    let c = chars[j];
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        j += 1;
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    return Err(PatternError::MissingParameterName(i));
                }
                tokens.push(Token::new(TokenKind::Name, i, name));
                i = j;
            }
            '(' => {
                let mut depth = 1;
                let mut value = String::new();
                let mut j = i + 1;
                if chars.get(j) == Some(&'?') {
                    return Err(PatternError::PatternStart(j));
                }
                while j < chars.len() {
                    if chars[j] == '\\' {
                        value.push(chars[j]);
                        value.push(*chars.get(j + 1).ok_or(PatternError::DanglingEscape(j))?);
                        j += 2;
                        continue;
                    }
                    if chars[j] == ')' {
                        depth -= 1;
                        if depth == 0 {
                            j += 1;
                            break;
                        }
                    } else if chars[j] == '(' {
                        depth += 1;
                        // Only non-capturing style nesting is tolerated.
                        if chars.get(j + 1) != Some(&'?') {
                            return Err(PatternError::CapturingGroup(j));
                        }
                    }
                    value.push(chars[j]);
                    j += 1;
                }
                if depth != 0 {
                    return Err(PatternError::UnbalancedPattern(i));
                }
                if value.is_empty() {
                    return Err(PatternError::MissingPattern(i));
                }
                tokens.push(Token::new(TokenKind::Pattern, i, value));
                i = j;
            }
            c => {
                tokens.push(Token::new(TokenKind::Char, i, c));
                i += 1;
            }
        }
    }

    tokens.push(Token::new(TokenKind::End, i, ""));
    Ok(tokens)
}
