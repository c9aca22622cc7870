//! Source text registry and diagnostic locations (component A: Source & Location).
//!
//! A [SourceUnit] owns the text of a single logical file. Line/column lookup
//! is computed lazily and cached, the same way the teacher's `Code` type
//! lazily derives line breaks from the raw byte slice.

use once_cell::unsync::OnceCell;
use std::fmt::{Display, Formatter};

/// One loaded piece of nyan source, keyed by a logical name (not necessarily
/// a filesystem path — the core never touches the filesystem itself).
pub struct SourceUnit {
    name: String,
    text: String,
    line_breaks: OnceCell<Vec<usize>>,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            line_breaks: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn line_breaks(&self) -> &Vec<usize> {
        self.line_breaks.get_or_init(|| {
            self.text
                .bytes()
                .enumerate()
                .filter_map(|(i, b)| if b == b'\n' { Some(i) } else { None })
                .collect()
        })
    }

    /// 1-based line content, without the trailing newline.
    pub fn line(&self, line: usize) -> Option<&str> {
        if line == 0 {
            return None;
        }
        let breaks = self.line_breaks();
        let start = if line == 1 {
            0
        } else {
            *breaks.get(line - 2)? + 1
        };
        let end = breaks.get(line - 1).copied().unwrap_or(self.text.len());
        self.text.get(start..end)
    }

    /// Resolve a byte offset into the text to a 1-based (line, column) pair.
    pub fn position_at(&self, offset: usize) -> (usize, usize) {
        let breaks = self.line_breaks();
        let index = match breaks.binary_search(&offset) {
            Ok(i) | Err(i) => i,
        };
        if index == 0 {
            (1, offset + 1)
        } else {
            let line_start = breaks[index - 1] + 1;
            (index + 1, offset - line_start + 1)
        }
    }
}

/// A diagnostic handle: which source, and where in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub source: SourceId,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(source: SourceId, line: usize, column: usize) -> Self {
        Self {
            source,
            line,
            column,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.source.0, self.line, self.column)
    }
}

/// Opaque index into a [SourceRegistry]. Carried on every token and AST node
/// instead of a borrowed reference, so lexer/parser/AST stay free of
/// lifetimes tied to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(usize);

/// Owns every [SourceUnit] ever registered with a [crate::Database]. Sources
/// are immutable once registered (spec invariant: "Sources are immutable
/// once registered").
#[derive(Default)]
pub struct SourceRegistry {
    units: Vec<SourceUnit>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, text: impl Into<String>) -> SourceId {
        let id = SourceId(self.units.len());
        self.units.push(SourceUnit::new(name, text));
        id
    }

    pub fn get(&self, id: SourceId) -> &SourceUnit {
        &self.units[id.0]
    }

    pub fn location_at(&self, id: SourceId, offset: usize) -> Location {
        let (line, column) = self.get(id).position_at(offset);
        Location::new(id, line, column)
    }

    /// The logical name and line text for a location, for error display.
    pub fn describe(&self, loc: Location) -> (&str, Option<&str>) {
        let unit = self.get(loc.source);
        (unit.name(), unit.line(loc.line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_at_first_line() {
        let unit = SourceUnit::new("t", "abc\ndef");
        assert_eq!(unit.position_at(0), (1, 1));
        assert_eq!(unit.position_at(2), (1, 3));
    }

    #[test]
    fn position_at_second_line() {
        let unit = SourceUnit::new("t", "abc\ndef");
        assert_eq!(unit.position_at(4), (2, 1));
        assert_eq!(unit.position_at(6), (2, 3));
    }

    #[test]
    fn line_lookup() {
        let unit = SourceUnit::new("t", "first\nsecond\nthird");
        assert_eq!(unit.line(1), Some("first"));
        assert_eq!(unit.line(2), Some("second"));
        assert_eq!(unit.line(3), Some("third"));
        assert_eq!(unit.line(4), None);
    }

    #[test]
    fn registry_round_trip() {
        let mut reg = SourceRegistry::new();
        let id = reg.register("a.nyan", "x\ny");
        let loc = reg.location_at(id, 2);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 1);
        let (name, line) = reg.describe(loc);
        assert_eq!(name, "a.nyan");
        assert_eq!(line, Some("y"));
    }
}
