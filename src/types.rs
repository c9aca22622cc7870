//! Type model (component F). `Type` is built once from an AST `TypeExpr`
//! during the loader's pass 2 and then only ever compared against, never
//! mutated — the same closed, exhaustively-matched shape the teacher
//! favors over the original's runtime `typeid` dispatch (spec §9 design
//! note: the original's pointer/typeid comparisons were a bug, not a
//! behavior to reproduce).

use crate::ast::TypeExpr;
use crate::error::{LangError, LangResult};
use crate::object::ObjectRef;
use crate::ops::Op;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Set,
    OrderedSet,
}

impl Display for ContainerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerKind::Set => write!(f, "set"),
            ContainerKind::OrderedSet => write!(f, "orderedset"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Text,
    Filename,
    Int,
    Float,
    /// `None` is the unconstrained "any object" top type, used as the
    /// `u` side of an `is_child_of` check that should always succeed.
    Object(Option<ObjectRef>),
    Container(ContainerKind, Box<Type>),
}

impl Type {
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Text | Type::Filename | Type::Int | Type::Float)
    }

    pub fn is_container(&self, kind: ContainerKind) -> bool {
        matches!(self, Type::Container(k, _) if *k == kind)
    }

    /// `t.is_child_of(u)`, per spec §4.F. `is_descendant(d, a)` answers
    /// "is `d` a descendant of (or equal to) `a` in the object inheritance
    /// graph" and is supplied by whoever holds the namespace.
    pub fn is_child_of(&self, other: &Type, is_descendant: &dyn Fn(ObjectRef, ObjectRef) -> bool) -> bool {
        match (self, other) {
            (Type::Object(_), Type::Object(None)) => true,
            (Type::Object(Some(t)), Type::Object(Some(u))) => is_descendant(*t, *u),
            (Type::Object(None), Type::Object(Some(_))) => false,
            (Type::Container(tk, te), Type::Container(uk, ue)) => tk == uk && te.is_child_of(ue, is_descendant),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other) || self == other,
        }
    }

    pub fn can_be_in(&self, container: &Type, is_descendant: &dyn Fn(ObjectRef, ObjectRef) -> bool) -> bool {
        match container {
            Type::Container(_, element) => self.is_child_of(element, is_descendant),
            _ => false,
        }
    }

    pub fn from_type_expr(expr: &TypeExpr, resolve: &dyn Fn(&str) -> Option<ObjectRef>) -> LangResult<Type> {
        match expr.name.as_str() {
            "text" => no_payload(expr, Type::Text),
            "file" => no_payload(expr, Type::Filename),
            "int" => no_payload(expr, Type::Int),
            "float" => no_payload(expr, Type::Float),
            "set" | "orderedset" => {
                let kind = if expr.name == "set" { ContainerKind::Set } else { ContainerKind::OrderedSet };
                let payload = expr.payload.as_ref().ok_or_else(|| {
                    LangError::type_error(expr.location, format!("'{}' requires an element type, e.g. {}(int)", expr.name, expr.name))
                })?;
                let element = Type::from_type_expr(payload, resolve)?;
                Ok(Type::Container(kind, Box::new(element)))
            }
            name => {
                if expr.payload.is_some() {
                    return Err(LangError::type_error(
                        expr.location,
                        format!("'{}' is not a container type and cannot take a payload", name),
                    ));
                }
                let target = resolve(name).ok_or_else(|| LangError::name(expr.location, format!("unresolved type name '{}'", name)))?;
                Ok(Type::Object(Some(target)))
            }
        }
    }
}

fn no_payload(expr: &TypeExpr, ty: Type) -> LangResult<Type> {
    if expr.payload.is_some() {
        return Err(LangError::type_error(expr.location, format!("'{}' does not take a payload", expr.name)));
    }
    Ok(ty)
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Text => write!(f, "text"),
            Type::Filename => write!(f, "filename"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Object(Some(r)) => write!(f, "object#{}", r.index()),
            Type::Object(None) => write!(f, "object"),
            Type::Container(kind, elem) => write!(f, "{}({})", kind, elem),
        }
    }
}

/// The permitted-operation table of spec §4.E, keyed on the declared type
/// of the left-hand side.
pub fn permitted(lhs: &Type, op: Op, rhs: &Type, is_descendant: &dyn Fn(ObjectRef, ObjectRef) -> bool) -> bool {
    use Op::*;
    match lhs {
        Type::Int | Type::Float => {
            matches!(op, Assign | AddAssign | SubtractAssign | MultiplyAssign | DivideAssign) && matches!(rhs, Type::Int | Type::Float)
        }
        Type::Text => matches!(op, Assign | AddAssign) && matches!(rhs, Type::Text),
        Type::Filename => matches!(op, Assign) && matches!(rhs, Type::Filename | Type::Text),
        Type::Object(_) => matches!(op, Assign) && rhs.is_child_of(lhs, is_descendant),
        Type::Container(ContainerKind::Set, elem) => {
            matches!(op, Assign | AddAssign | UnionAssign | SubtractAssign | IntersectAssign)
                && matches!(rhs, Type::Container(ContainerKind::Set, relem) if relem.is_child_of(elem, is_descendant))
        }
        Type::Container(ContainerKind::OrderedSet, elem) => {
            matches!(op, Assign | AddAssign | SubtractAssign | IntersectAssign)
                && matches!(rhs, Type::Container(ContainerKind::OrderedSet, relem) if relem.is_child_of(elem, is_descendant))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_objects(_: ObjectRef, _: ObjectRef) -> bool {
        false
    }

    #[test]
    fn primitives_are_child_of_themselves_only() {
        assert!(Type::Int.is_child_of(&Type::Int, &no_objects));
        assert!(!Type::Int.is_child_of(&Type::Float, &no_objects));
    }

    #[test]
    fn int_assign_and_compound_ops_permitted() {
        assert!(permitted(&Type::Int, Op::Assign, &Type::Int, &no_objects));
        assert!(permitted(&Type::Int, Op::AddAssign, &Type::Float, &no_objects));
        assert!(!permitted(&Type::Int, Op::UnionAssign, &Type::Int, &no_objects));
    }

    #[test]
    fn text_rejects_filename_rhs_for_add_assign() {
        assert!(!permitted(&Type::Text, Op::AddAssign, &Type::Filename, &no_objects));
    }

    #[test]
    fn orderedset_rejects_union_assign() {
        let t = Type::Container(ContainerKind::OrderedSet, Box::new(Type::Int));
        assert!(!permitted(&t, Op::UnionAssign, &t, &no_objects));
        assert!(permitted(&t, Op::AddAssign, &t, &no_objects));
    }

    #[test]
    fn object_top_type_accepts_anything() {
        let top = Type::Object(None);
        let concrete = Type::Object(Some(ObjectRef(0)));
        assert!(concrete.is_child_of(&top, &no_objects));
    }
}
