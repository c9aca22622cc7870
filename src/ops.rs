//! Member operation kinds (component D/E), the exact table from
//! `nyan_ops.cpp`: each source-level operator token maps to one `Op`
//! variant, with `Invalid` standing in for the C++ `op_t::INVALID`
//! sentinel used when a member has no operation at all yet.

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
    UnionAssign,
    IntersectAssign,
    Invalid,
}

impl Op {
    pub fn from_str(s: &str) -> Op {
        match s {
            "=" => Op::Assign,
            "+" => Op::Add,
            "-" => Op::Subtract,
            "*" => Op::Multiply,
            "/" => Op::Divide,
            "+=" => Op::AddAssign,
            "-=" => Op::SubtractAssign,
            "*=" => Op::MultiplyAssign,
            "/=" => Op::DivideAssign,
            "|=" => Op::UnionAssign,
            "&=" => Op::IntersectAssign,
            _ => Op::Invalid,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Op::Assign => "=",
            Op::Add => "+",
            Op::Subtract => "-",
            Op::Multiply => "*",
            Op::Divide => "/",
            Op::AddAssign => "+=",
            Op::SubtractAssign => "-=",
            Op::MultiplyAssign => "*=",
            Op::DivideAssign => "/=",
            Op::UnionAssign => "|=",
            Op::IntersectAssign => "&=",
            Op::Invalid => "<invalid>",
        }
    }

    /// Whether this op is one a top-level member declaration may carry.
    /// Plain `Add`/`Subtract`/`Multiply`/`Divide` only ever appear as the
    /// right-hand side of an assign-with-op token (`+=` etc.); a bare `+`
    /// or `-` standing alone in a member declaration is not meaningful.
    pub fn is_member_operation(self) -> bool {
        !matches!(self, Op::Invalid | Op::Add | Op::Subtract | Op::Multiply | Op::Divide)
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_operator_token() {
        for s in ["=", "+", "-", "*", "/", "+=", "-=", "*=", "/=", "|=", "&="] {
            assert_eq!(Op::from_str(s).as_str(), s);
        }
    }

    #[test]
    fn unknown_text_is_invalid() {
        assert_eq!(Op::from_str("%="), Op::Invalid);
    }
}
