//! `nyan_core` — object graph, type system and patch-resolution engine for
//! the nyan configuration language: a lexer, a recursive-descent parser, a
//! C3-linearized multi-inheritance object graph, and the two-pass loader
//! that ties them together (spec §2 System Overview).
//!
//! The crate is organized the way the teacher's `lang_pt` is — one module
//! per pipeline stage, wired together by a small top-level driver (here,
//! [Database] in place of the teacher's `Parser`).

pub mod ast;
pub mod config;
pub mod cursor;
pub mod diagnostics;
pub mod error;
pub mod lexer;
pub mod linearize;
pub mod loader;
pub mod namespace;
pub mod object;
pub mod ops;
pub mod parser;
pub mod source;
pub mod token;
pub mod tree;
pub mod types;
pub mod value;

pub use config::LexConfig;
pub use diagnostics::Trace;
pub use error::{LangError, LangErrorKind, LangResult};
pub use loader::{Database, ObjectHandle};
pub use object::{Member, ObjectRef, ObjectState};
pub use ops::Op;
pub use source::{Location, SourceId, SourceRegistry};
pub use types::{ContainerKind, Type};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_load_and_query() {
        let mut db = Database::new();
        db.load(
            "main.nyan",
            "Unit():\n    hp : int = 10\nVeteran<Unit>():\n    hp += 5\n",
        )
        .unwrap();
        let unit = db.get("Unit").unwrap();
        assert_eq!(unit.effective_value("hp").unwrap(), Value::Int(15));
        assert!(unit.has_member("hp"));
        assert!(db.get("Nonexistent").is_none());
    }

    #[test]
    fn a_failed_load_does_not_partially_populate_the_database() {
        let mut db = Database::new();
        let err = db.load("bad.nyan", "A(Missing):\n    pass\n").unwrap_err();
        assert_eq!(err.kind, LangErrorKind::Name);
        assert!(db.get("A").is_none());
    }

    #[test]
    fn render_includes_source_line() {
        let mut db = Database::new();
        let err = db.load("bad.nyan", "A():\n  x : int = 1\n").unwrap_err();
        let rendered = err.render(&db.sources);
        assert!(rendered.contains("bad.nyan"));
        assert!(rendered.contains("x : int = 1"));
    }
}
