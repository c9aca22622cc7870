//! Value model (component E): the tagged union of runtime values and their
//! `apply` semantics. A closed `enum` matched exhaustively everywhere,
//! deliberately avoiding the original's downcast-and-typeid dispatch (spec
//! §9 design note).
//!
//! `apply` trusts that the caller already checked `(lhs_type, op, rhs_type)`
//! against [crate::types::permitted] — it only surfaces the runtime
//! failures the table can't rule out statically: division by zero, integer
//! overflow, and hashing a non-hashable element.

use crate::object::ObjectRef;
use crate::ops::Op;
use crate::source::Location;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Filename(String),
    ObjectRef(ObjectRef),
    /// Unordered; equality is element-set equality regardless of storage order.
    Set(Vec<Value>),
    /// Order is significant; equality requires both equal elements and equal order.
    OrderedSet(Vec<Value>),
}

/// A hashable projection of a value, used to dedupe set/orderedset
/// elements. Floats and nested containers have no stable hash and are
/// rejected — "sets of non-hashable values are rejected" (spec §4.E).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ValueKey {
    Int(i64),
    Text(String),
    Filename(String),
    ObjectRef(ObjectRef),
}

impl Value {
    pub fn copy(&self) -> Value {
        self.clone()
    }

    /// Set equality ignores order; everything else uses structural equality.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| x.equals(y)))
            }
            (Value::OrderedSet(a), Value::OrderedSet(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y)),
            _ => self == other,
        }
    }

    fn hash_key(&self, loc: Location) -> crate::error::LangResult<ValueKey> {
        match self {
            Value::Int(i) => Ok(ValueKey::Int(*i)),
            Value::Text(s) => Ok(ValueKey::Text(s.clone())),
            Value::Filename(s) => Ok(ValueKey::Filename(s.clone())),
            Value::ObjectRef(r) => Ok(ValueKey::ObjectRef(*r)),
            Value::Float(_) => Err(crate::error::LangError::value(loc, "a float value is not hashable and cannot be a set element")),
            Value::Set(_) | Value::OrderedSet(_) => {
                Err(crate::error::LangError::value(loc, "a container value is not hashable and cannot be a set element"))
            }
        }
    }

    pub fn to_display(&self) -> String {
        format!("{}", self)
    }

    pub fn to_repr(&self) -> String {
        match self {
            Value::Text(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            other => other.to_display(),
        }
    }

    /// Apply `op` with right-hand operand `rhs`, yielding the new effective
    /// value. `self` is the value accumulated so far (the seed, or the
    /// previous layer's result); `op` is never `Assign` for any value but
    /// the first in a member's patch chain (the loader enforces that).
    pub fn apply(&self, op: Op, rhs: &Value, loc: Location) -> crate::error::LangResult<Value> {
        use crate::error::LangError;
        match op {
            Op::Assign => Ok(rhs.clone()),
            Op::AddAssign => match (self, rhs) {
                (Value::Int(a), Value::Int(b)) => a.checked_add(*b).map(Value::Int).ok_or_else(|| LangError::value(loc, "integer overflow in +=")),
                (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 + b)),
                (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + *b as f64)),
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
                (Value::Text(a), Value::Text(b)) => Ok(Value::Text(format!("{}{}", a, b))),
                (Value::Set(a), Value::Set(b)) => Ok(Value::Set(set_union(a, b, loc)?)),
                (Value::OrderedSet(a), Value::OrderedSet(b)) => Ok(Value::OrderedSet(ordered_set_append_unique(a, b, loc)?)),
                _ => Err(LangError::internal("apply: AddAssign on an unsupported operand pair")),
            },
            Op::UnionAssign => match (self, rhs) {
                (Value::Set(a), Value::Set(b)) => Ok(Value::Set(set_union(a, b, loc)?)),
                _ => Err(LangError::internal("apply: UnionAssign on an unsupported operand pair")),
            },
            Op::SubtractAssign => match (self, rhs) {
                (Value::Int(a), Value::Int(b)) => a.checked_sub(*b).map(Value::Int).ok_or_else(|| LangError::value(loc, "integer overflow in -=")),
                (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 - b)),
                (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a - *b as f64)),
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
                (Value::Set(a), Value::Set(b)) | (Value::OrderedSet(a), Value::OrderedSet(b)) => {
                    let kept: Vec<Value> = a.iter().filter(|x| !b.iter().any(|y| x.equals(y))).cloned().collect();
                    if matches!(self, Value::Set(_)) {
                        Ok(Value::Set(kept))
                    } else {
                        Ok(Value::OrderedSet(kept))
                    }
                }
                _ => Err(LangError::internal("apply: SubtractAssign on an unsupported operand pair")),
            },
            Op::MultiplyAssign => match (self, rhs) {
                (Value::Int(a), Value::Int(b)) => a.checked_mul(*b).map(Value::Int).ok_or_else(|| LangError::value(loc, "integer overflow in *=")),
                (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 * b)),
                (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a * *b as f64)),
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
                _ => Err(LangError::internal("apply: MultiplyAssign on an unsupported operand pair")),
            },
            Op::DivideAssign => match (self, rhs) {
                (Value::Int(_), Value::Int(0)) => Err(LangError::value(loc, "division by zero")),
                // Truncating toward zero, per spec §9(c): rounding mode unspecified upstream.
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a / b)),
                (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 / b)),
                (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a / *b as f64)),
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a / b)),
                _ => Err(LangError::internal("apply: DivideAssign on an unsupported operand pair")),
            },
            Op::IntersectAssign => match (self, rhs) {
                (Value::Set(a), Value::Set(b)) => Ok(Value::Set(a.iter().filter(|x| b.iter().any(|y| x.equals(y))).cloned().collect())),
                (Value::OrderedSet(a), Value::OrderedSet(b)) => {
                    // Preserves the left operand's order (spec §4.E).
                    Ok(Value::OrderedSet(a.iter().filter(|x| b.iter().any(|y| x.equals(y))).cloned().collect()))
                }
                _ => Err(LangError::internal("apply: IntersectAssign on an unsupported operand pair")),
            },
            Op::Add | Op::Subtract | Op::Multiply | Op::Divide | Op::Invalid => {
                Err(LangError::internal(format!("apply: '{}' is not a member operation", op)))
            }
        }
    }
}

fn set_union(a: &[Value], b: &[Value], loc: Location) -> crate::error::LangResult<Vec<Value>> {
    for v in a.iter().chain(b.iter()) {
        v.hash_key(loc)?;
    }
    let mut out = a.to_vec();
    for v in b {
        if !out.iter().any(|x| x.equals(v)) {
            out.push(v.clone());
        }
    }
    Ok(out)
}

/// `OrderedSet` `+=`: an element already present moves to the end instead
/// of being skipped (spec §4.E, confirmed against `nyan_value_orderedset`).
fn ordered_set_append_unique(a: &[Value], b: &[Value], loc: Location) -> crate::error::LangResult<Vec<Value>> {
    for v in a.iter().chain(b.iter()) {
        v.hash_key(loc)?;
    }
    let mut out: Vec<Value> = a.to_vec();
    for v in b {
        out.retain(|x| !x.equals(v));
        out.push(v.clone());
    }
    Ok(out)
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::Filename(s) => write!(f, "{}", s),
            Value::ObjectRef(r) => write!(f, "object#{}", r.index()),
            Value::Set(items) => {
                write!(f, "{{{}}}", items.iter().map(|v| v.to_display()).collect::<Vec<_>>().join(", "))
            }
            Value::OrderedSet(items) => {
                write!(f, "<{}>", items.iter().map(|v| v.to_display()).collect::<Vec<_>>().join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceRegistry;

    fn loc() -> Location {
        let mut reg = SourceRegistry::new();
        let id = reg.register("t", "");
        reg.location_at(id, 0)
    }

    #[test]
    fn primitive_addition_and_overflow() {
        let l = loc();
        assert_eq!(Value::Int(17).apply(Op::AddAssign, &Value::Int(7), l).unwrap(), Value::Int(24));
        let err = Value::Int(i64::MAX).apply(Op::AddAssign, &Value::Int(1), l).unwrap_err();
        assert_eq!(err.kind, crate::error::LangErrorKind::Value);
    }

    #[test]
    fn division_by_zero_is_a_value_error() {
        let l = loc();
        let err = Value::Int(1).apply(Op::DivideAssign, &Value::Int(0), l).unwrap_err();
        assert_eq!(err.kind, crate::error::LangErrorKind::Value);
    }

    #[test]
    fn integer_division_truncates_toward_zero() {
        let l = loc();
        assert_eq!(Value::Int(-7).apply(Op::DivideAssign, &Value::Int(2), l).unwrap(), Value::Int(-3));
    }

    #[test]
    fn ordered_set_add_assign_moves_existing_to_end() {
        let l = loc();
        let base = Value::OrderedSet(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let patch = Value::OrderedSet(vec![Value::Int(2), Value::Int(4)]);
        let result = base.apply(Op::AddAssign, &patch, l).unwrap();
        assert_eq!(result, Value::OrderedSet(vec![Value::Int(1), Value::Int(3), Value::Int(2), Value::Int(4)]));
    }

    #[test]
    fn set_union_assign_is_commutative_on_membership() {
        let l = loc();
        let a = Value::Set(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::Set(vec![Value::Int(2), Value::Int(3)]);
        let result = a.apply(Op::UnionAssign, &b, l).unwrap();
        assert!(result.equals(&Value::Set(vec![Value::Int(1), Value::Int(2), Value::Int(3)])));
    }

    #[test]
    fn set_equality_ignores_order() {
        let a = Value::Set(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::Set(vec![Value::Int(2), Value::Int(1)]);
        assert!(a.equals(&b));
    }

    #[test]
    fn ordered_set_equality_requires_matching_order() {
        let a = Value::OrderedSet(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::OrderedSet(vec![Value::Int(2), Value::Int(1)]);
        assert!(!a.equals(&b));
    }
}
