//! Leveled debug tracing, in the same style as the teacher's lexeme-level
//! `Log<T>`: a total order of verbosity, gated entirely behind
//! `#[cfg(debug_assertions)]` so release builds pay nothing for it.

use std::fmt::Display;

/// Verbosity level for internal tracing of the lexer, linearizer and loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trace {
    None,
    Default,
    Success,
    Result,
    Verbose,
}

impl Trace {
    fn order(self) -> u8 {
        match self {
            Trace::None => 0,
            Trace::Default => 1,
            Trace::Success => 2,
            Trace::Result => 3,
            Trace::Verbose => 4,
        }
    }

    /// Print `message()` if `self` is at least as verbose as `level`.
    /// The closure is only invoked (and only in debug builds) when the
    /// level actually passes, so formatting a trace line never costs
    /// anything in a release build.
    #[inline]
    pub fn emit<F: FnOnce() -> String>(self, level: Trace, label: &str, message: F) {
        #[cfg(debug_assertions)]
        if self.order() >= level.order() {
            println!("[{}] {}", label, message());
        }
        #[cfg(not(debug_assertions))]
        {
            let _ = (level, label, message);
        }
    }
}

impl Default for Trace {
    fn default() -> Self {
        Trace::None
    }
}

impl Display for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Trace::None => "none",
            Trace::Default => "default",
            Trace::Success => "success",
            Trace::Result => "result",
            Trace::Verbose => "verbose",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_monotonic() {
        assert!(Trace::Verbose.order() > Trace::Result.order());
        assert!(Trace::Result.order() > Trace::Success.order());
        assert!(Trace::Success.order() > Trace::Default.order());
        assert!(Trace::Default.order() > Trace::None.order());
    }
}
