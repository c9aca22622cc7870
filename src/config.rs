//! Tunables for the lexer. The original C++ source hard-codes
//! `SPACES_PER_INDENT` as a preprocessor constant; spec.md calls it "the
//! configured indent width" so this crate exposes it as a small config
//! struct instead of a constant.

/// Lexer configuration. `indent_width` must be a positive multiple of one;
/// every INDENT/DEDENT level change must be a multiple of it (spec §3
/// invariant 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexConfig {
    pub indent_width: usize,
}

impl Default for LexConfig {
    fn default() -> Self {
        Self { indent_width: 4 }
    }
}
