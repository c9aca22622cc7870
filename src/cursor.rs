//! Forward-only token cursor (component C), handed to the parser in place
//! of the teacher's `FilteredStream`/`WrapperIndex` combinator plumbing —
//! nyan's grammar needs nothing fancier than "peek" and "advance".

use crate::error::{LangError, LangResult};
use crate::token::{Token, TokenKind};

pub struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn last_location(&self) -> crate::source::Location {
        self.tokens
            .last()
            .map(|t| t.location)
            .expect("token stream always ends with EndFile")
    }

    /// The current token without consuming it.
    pub fn peek(&self) -> LangResult<&Token> {
        self.tokens
            .get(self.pos)
            .ok_or_else(|| LangError::ast(self.last_location(), "unexpected end of file"))
    }

    pub fn peek_kind(&self) -> LangResult<TokenKind> {
        Ok(self.peek()?.kind)
    }

    /// Consume and return the current token.
    pub fn advance(&mut self) -> LangResult<Token> {
        let tok = self.peek()?.clone();
        self.pos += 1;
        Ok(tok)
    }

    /// Consume the current token if it matches `kind`, else error.
    pub fn expect(&mut self, kind: TokenKind) -> LangResult<Token> {
        let tok = self.peek()?.clone();
        if tok.kind != kind {
            return Err(LangError::ast(
                tok.location,
                format!("expected {}, found {}", kind, tok.kind),
            ));
        }
        self.pos += 1;
        Ok(tok)
    }

    pub fn at(&self, kind: TokenKind) -> bool {
        matches!(self.peek_kind(), Ok(k) if k == kind)
    }

    pub fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), Ok(TokenKind::EndFile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceRegistry;

    fn tok(kind: TokenKind) -> Token {
        let mut reg = SourceRegistry::new();
        let id = reg.register("t", "");
        Token::new(kind, "", reg.location_at(id, 0))
    }

    #[test]
    fn advances_in_order() {
        let mut c = Cursor::new(vec![tok(TokenKind::Id), tok(TokenKind::Colon), tok(TokenKind::EndFile)]);
        assert_eq!(c.advance().unwrap().kind, TokenKind::Id);
        assert_eq!(c.advance().unwrap().kind, TokenKind::Colon);
        assert!(c.is_at_end());
    }

    #[test]
    fn expect_mismatch_is_ast_error() {
        let mut c = Cursor::new(vec![tok(TokenKind::Id), tok(TokenKind::EndFile)]);
        let err = c.expect(TokenKind::Colon).unwrap_err();
        assert_eq!(err.kind, crate::error::LangErrorKind::Ast);
    }

    #[test]
    fn past_end_of_file_is_an_error() {
        let mut c = Cursor::new(vec![tok(TokenKind::EndFile)]);
        c.advance().unwrap();
        let err = c.peek().unwrap_err();
        assert_eq!(err.message, "unexpected end of file");
    }
}
