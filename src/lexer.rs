//! Indentation-sensitive tokenizer (component B). Converts a registered
//! source unit into a finite token sequence terminated by `EndFile`,
//! synthesizing `Indent`/`Dedent` from column-0 whitespace the way
//! `nyan_lexer.cpp`'s `handle_indent` does.
//!
//! Unlike the teacher's pluggable `ILexeme`/`Tokenizer` composition (built
//! for arbitrary state-machine grammars), nyan's token grammar is fixed, so
//! this is a single hand-written scan loop — unused match arms would be the
//! only thing a generic `ILexeme` pipeline bought us here. The regex-backed
//! pattern matching it used for `Pattern`/`Punctuations` is kept, though:
//! identifiers, numbers and strings are each recognized by one precompiled
//! [regex::Regex].

use crate::config::LexConfig;
use crate::diagnostics::Trace;
use crate::error::{LangError, LangResult};
use crate::source::{SourceId, SourceRegistry};
use crate::token::{Token, TokenKind};
use once_cell::sync::Lazy;
use regex::Regex;

static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").unwrap());
static FLOAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[0-9]+\.[0-9]*(?:[eE][+-]?[0-9]+)?|\.[0-9]+(?:[eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+)").unwrap()
});
static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:0x[0-9A-Fa-f]+|0|[1-9][0-9]*)").unwrap());
static DQ_STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^"(?:[^"\\]|\\.)*""#).unwrap());
static SQ_STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^'(?:[^'\\]|\\.)*'").unwrap());

/// Characters after which a bare `+`/`-` can plausibly start a signed
/// numeral rather than stand alone as an operator token — i.e. anywhere a
/// value is expected to begin. nyan has no binary arithmetic expressions, so
/// this lookbehind is unambiguous: an operand never directly precedes a sign.
fn value_may_start_after(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c) => matches!(c, ' ' | '\t' | '\n' | '=' | '+' | '-' | '*' | '/' | '|' | '&' | '<' | '>' | ',' | '(' | '[' | '{' | ':'),
    }
}

pub struct Lexer {
    config: LexConfig,
    trace: Trace,
}

impl Lexer {
    pub fn new(config: LexConfig) -> Self {
        Self {
            config,
            trace: Trace::None,
        }
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.trace = trace;
        self
    }

    pub fn tokenize(&self, sources: &SourceRegistry, id: SourceId) -> LangResult<Vec<Token>> {
        let text = sources.get(id).text();
        let bytes = text.as_bytes();
        let len = bytes.len();
        let width = self.config.indent_width;

        let loc = |offset: usize| sources.location_at(id, offset);

        let mut tokens = Vec::new();
        let mut indent_stack: Vec<usize> = vec![0];
        let mut pos = 0usize;

        while pos < len {
            // --- indentation at start of line ---
            let line_start = pos;
            let mut spaces = 0usize;
            let mut saw_tab = false;
            while pos < len {
                match bytes[pos] {
                    b' ' => {
                        spaces += 1;
                        pos += 1;
                    }
                    b'\t' => {
                        saw_tab = true;
                        pos += 1;
                    }
                    _ => break,
                }
            }
            if saw_tab {
                return Err(LangError::tokenize(loc(line_start), "tabs are illegal; use spaces for indentation"));
            }

            let blank_or_comment = pos >= len || bytes[pos] == b'\n' || bytes[pos] == b'#';
            if blank_or_comment {
                // comment-only or blank line: does not affect the indent stack.
                while pos < len && bytes[pos] != b'\n' {
                    pos += 1;
                }
                if pos < len {
                    pos += 1; // consume the newline, no EndLine emitted
                }
                continue;
            }

            if spaces % width != 0 {
                return Err(LangError::tokenize(
                    loc(line_start),
                    format!("indentation must be a multiple of {} spaces, found {}", width, spaces),
                ));
            }
            let top = *indent_stack.last().unwrap();
            if spaces > top {
                let levels = (spaces - top) / width;
                self.trace.emit(Trace::Default, "lexer", || format!("indent +{} at {}", levels, loc(line_start)));
                indent_stack.push(spaces);
                for _ in 0..levels {
                    tokens.push(Token::new(TokenKind::Indent, "", loc(line_start)));
                }
            } else if spaces < top {
                let mut levels = 0usize;
                while *indent_stack.last().unwrap() > spaces {
                    indent_stack.pop();
                    levels += 1;
                }
                if *indent_stack.last().unwrap() != spaces {
                    return Err(LangError::tokenize(
                        loc(line_start),
                        "unindent does not match any outer indentation level",
                    ));
                }
                self.trace.emit(Trace::Default, "lexer", || format!("dedent -{} at {}", levels, loc(line_start)));
                for _ in 0..levels {
                    tokens.push(Token::new(TokenKind::Dedent, "", loc(line_start)));
                }
            }

            // --- tokenize the remainder of this non-blank line ---
            let mut prev_char: Option<char> = None;
            loop {
                if pos >= len {
                    break;
                }
                let c = bytes[pos] as char;
                if c == '\n' {
                    pos += 1;
                    tokens.push(Token::new(TokenKind::EndLine, "", loc(pos.saturating_sub(1))));
                    break;
                }
                if c == ' ' {
                    pos += 1;
                    prev_char = Some(' ');
                    continue;
                }
                if c == '\t' {
                    return Err(LangError::tokenize(loc(pos), "tabs are illegal"));
                }
                if c == '#' {
                    while pos < len && bytes[pos] != b'\n' {
                        pos += 1;
                    }
                    continue;
                }

                let start = pos;
                let start_loc = loc(start);
                let rest = &text[pos..];

                if c == '"' {
                    let m = DQ_STRING_RE.find(rest).ok_or_else(|| {
                        LangError::tokenize(start_loc.clone(), "unterminated string literal")
                    })?;
                    let content = unescape(&rest[1..m.end() - 1], start_loc)?;
                    tokens.push(Token::new(TokenKind::String, content, start_loc));
                    pos += m.end();
                } else if c == '\'' {
                    let m = SQ_STRING_RE.find(rest).ok_or_else(|| {
                        LangError::tokenize(start_loc.clone(), "unterminated string literal")
                    })?;
                    let content = unescape(&rest[1..m.end() - 1], start_loc)?;
                    tokens.push(Token::new(TokenKind::String, content, start_loc));
                    pos += m.end();
                } else if c.is_ascii_digit() || ((c == '+' || c == '-') && value_may_start_after(prev_char) && rest.as_bytes().get(1).map_or(false, |b| b.is_ascii_digit())) {
                    let (kind, consumed) = lex_number(rest, start_loc.clone())?;
                    tokens.push(Token::new(kind, &rest[..consumed], start_loc));
                    pos += consumed;
                } else if c.is_ascii_alphabetic() || c == '_' {
                    let m = IDENT_RE.find(rest).unwrap();
                    let kind = if m.as_str() == "pass" { TokenKind::Pass } else { TokenKind::Id };
                    tokens.push(Token::new(kind, m.as_str(), start_loc));
                    pos += m.end();
                } else if let Some((kind, width)) = lex_punct_or_op(rest) {
                    tokens.push(Token::new(kind, &rest[..width], start_loc));
                    pos += width;
                } else {
                    return Err(LangError::tokenize(start_loc, format!("unknown character '{}'", c)));
                }
                prev_char = rest[..pos - start].chars().last();
            }
        }

        // EOF: unwind remaining indentation, then finish.
        let eof_loc = loc(len);
        let levels = indent_stack.len() - 1;
        if levels > 0 {
            self.trace.emit(Trace::Default, "lexer", || format!("eof dedent -{}", levels));
        }
        for _ in 0..levels {
            tokens.push(Token::new(TokenKind::Dedent, "", eof_loc.clone()));
        }
        tokens.push(Token::new(TokenKind::EndFile, "", eof_loc));
        Ok(tokens)
    }
}

fn lex_number(s: &str, loc: crate::source::Location) -> LangResult<(TokenKind, usize)> {
    let (sign, body) = match s.as_bytes().first() {
        Some(b'+') => (1i128, &s[1..]),
        Some(b'-') => (-1i128, &s[1..]),
        _ => (1i128, s),
    };
    let sign_len = s.len() - body.len();

    if let Some(m) = FLOAT_RE.find(body) {
        if m.start() == 0 {
            return Ok((TokenKind::Float, sign_len + m.end()));
        }
    }
    if let Some(m) = INT_RE.find(body) {
        if m.start() == 0 {
            let digits = m.as_str();
            let magnitude: i128 = if let Some(hex) = digits.strip_prefix("0x") {
                i128::from_str_radix(hex, 16)
                    .map_err(|_| LangError::tokenize(loc.clone(), "integer literal out of range"))?
            } else {
                digits
                    .parse::<i128>()
                    .map_err(|_| LangError::tokenize(loc.clone(), "integer literal out of range"))?
            };
            let value = sign * magnitude;
            if value < i64::MIN as i128 || value > i64::MAX as i128 {
                return Err(LangError::tokenize(loc, "integer literal out of range"));
            }
            return Ok((TokenKind::Int, sign_len + m.end()));
        }
    }
    // A lone sign with no following digit match falls through to operator lexing.
    Err(LangError::tokenize(loc, "expected a numeric literal"))
}

fn lex_punct_or_op(s: &str) -> Option<(TokenKind, usize)> {
    let mut chars = s.chars();
    let first = chars.next()?;
    let second = chars.next();

    let two_char = second.map(|c| format!("{}{}", first, c));
    if let Some(op) = &two_char {
        if matches!(op.as_str(), "+=" | "-=" | "*=" | "/=" | "|=" | "&=") {
            return Some((TokenKind::Operator, 2));
        }
    }

    match first {
        '=' | '+' | '-' | '*' | '/' => Some((TokenKind::Operator, 1)),
        ':' => Some((TokenKind::Colon, 1)),
        ',' => Some((TokenKind::Comma, 1)),
        '<' => Some((TokenKind::LAngle, 1)),
        '>' => Some((TokenKind::RAngle, 1)),
        '{' => Some((TokenKind::LBrace, 1)),
        '}' => Some((TokenKind::RBrace, 1)),
        '[' => Some((TokenKind::LBracket, 1)),
        ']' => Some((TokenKind::RBracket, 1)),
        '(' => Some((TokenKind::LParen, 1)),
        ')' => Some((TokenKind::RParen, 1)),
        _ => None,
    }
}

fn unescape(inner: &str, loc: crate::source::Location) -> LangResult<String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => {
                return Err(LangError::tokenize(loc, format!("unknown escape sequence '\\{}'", other)));
            }
            None => return Err(LangError::tokenize(loc, "unterminated escape sequence")),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(src: &str) -> Vec<TokenKind> {
        let mut reg = SourceRegistry::new();
        let id = reg.register("t", src);
        let toks = Lexer::new(LexConfig::default()).tokenize(&reg, id).unwrap();
        toks.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_object_skeleton() {
        let kinds = tokenize("First():\n    pass\n");
        use TokenKind::*;
        assert_eq!(
            kinds,
            vec![Id, LParen, RParen, Colon, EndLine, Indent, Pass, EndLine, Dedent, EndFile]
        );
    }

    #[test]
    fn indent_must_be_multiple_of_width() {
        let mut reg = SourceRegistry::new();
        let id = reg.register("t", "A():\n   x : int = 1\n");
        let err = Lexer::new(LexConfig::default()).tokenize(&reg, id).unwrap_err();
        assert_eq!(err.kind, crate::error::LangErrorKind::Tokenize);
        assert_eq!(err.location.unwrap().line, 2);
    }

    #[test]
    fn signed_integer_after_assign() {
        let kinds_and_text: Vec<_> = {
            let mut reg = SourceRegistry::new();
            let id = reg.register("t", "A():\n    x : int = -5\n");
            Lexer::new(LexConfig::default())
                .tokenize(&reg, id)
                .unwrap()
                .into_iter()
                .map(|t| (t.kind, t.text))
                .collect()
        };
        assert!(kinds_and_text.iter().any(|(k, t)| *k == TokenKind::Int && t == "-5"));
    }

    #[test]
    fn blank_and_comment_lines_do_not_affect_indent() {
        let kinds = tokenize("A():\n    # comment\n\n    pass\n");
        use TokenKind::*;
        assert_eq!(kinds, vec![Id, LParen, RParen, Colon, EndLine, Indent, Pass, EndLine, Dedent, EndFile]);
    }

    #[test]
    fn dedent_mismatch_is_an_error() {
        let mut reg = SourceRegistry::new();
        let id = reg.register("t", "A():\n        x : int = 1\n    y : int = 2\n");
        let err = Lexer::new(LexConfig::default()).tokenize(&reg, id).unwrap_err();
        assert_eq!(err.kind, crate::error::LangErrorKind::Tokenize);
    }

    #[test]
    fn string_escapes() {
        let mut reg = SourceRegistry::new();
        let id = reg.register("t", r#"A():
    s : text = "a\nb\"c"
"#);
        let toks = Lexer::new(LexConfig::default()).tokenize(&reg, id).unwrap();
        let s = toks.iter().find(|t| t.kind == TokenKind::String).unwrap();
        assert_eq!(s.text, "a\nb\"c");
    }
}
