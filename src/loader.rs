//! Database / two-pass semantic loader (component J) and the public Store
//! API surface (spec §6). `Database::load` is the one transaction
//! boundary: declare everything, resolve and type-check everything, and on
//! the first error roll the namespace back to exactly how it looked before
//! the call (spec §5, §8 property 8).

use crate::ast::{File, ObjectDecl, ValueExpr};
use crate::config::LexConfig;
use crate::diagnostics::Trace;
use crate::error::{LangError, LangResult};
use crate::lexer::Lexer;
use crate::linearize;
use crate::namespace::Namespace;
use crate::object::{Member, ObjectRef, ObjectState};
use crate::ops::Op;
use crate::parser::parse_file;
use crate::source::{Location, SourceRegistry};
use crate::token::TokenKind;
use crate::types::{permitted, Type};
use crate::value::Value;

pub struct Database {
    pub sources: SourceRegistry,
    namespace: Namespace,
    lex_config: LexConfig,
    trace: Trace,
}

impl Database {
    pub fn new() -> Self {
        Self {
            sources: SourceRegistry::new(),
            namespace: Namespace::new(),
            lex_config: LexConfig::default(),
            trace: Trace::None,
        }
    }

    pub fn with_lex_config(mut self, config: LexConfig) -> Self {
        self.lex_config = config;
        self
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.trace = trace;
        self
    }

    /// Load one source unit. Either every declaration in it lands in the
    /// namespace fully type-checked, or none does.
    pub fn load(&mut self, logical_name: impl Into<String>, text: impl Into<String>) -> LangResult<()> {
        let source_id = self.sources.register(logical_name, text);
        let tokens = Lexer::new(self.lex_config).with_trace(self.trace).tokenize(&self.sources, source_id)?;
        let file: File = parse_file(tokens)?;

        let checkpoint = self.namespace.checkpoint();
        match self.load_file(file) {
            Ok(()) => {
                self.namespace.invalidate_all_caches();
                Ok(())
            }
            Err(e) => {
                self.namespace.rollback(checkpoint);
                Err(e)
            }
        }
    }

    fn load_file(&mut self, file: File) -> LangResult<()> {
        // Pass 1 — declare.
        let mut pending: Vec<(ObjectRef, ObjectDecl)> = Vec::with_capacity(file.objects.len());
        for decl in file.objects {
            self.trace.emit(Trace::Default, "loader", || format!("declare '{}'", decl.name));
            let r = self.namespace.declare(decl.name.clone(), decl.location)?;
            pending.push((r, decl));
        }

        // Pass 2, step 1 — resolve every name reference for every object
        // declared in this file before any type-checking, since any one
        // of them may refer to any other (forward references are legal).
        for (r, decl) in &pending {
            let resolve_one = |name: &str, loc: Location| -> LangResult<ObjectRef> {
                self.namespace.resolve(name).ok_or_else(|| LangError::name(loc, format!("unresolved name '{}'", name)))
            };
            let mut parents = Vec::with_capacity(decl.parents.len());
            for name in &decl.parents {
                parents.push(resolve_one(name, decl.location)?);
            }
            let mut patch_targets = Vec::with_capacity(decl.patch_targets.len());
            for name in &decl.patch_targets {
                patch_targets.push(resolve_one(name, decl.location)?);
            }
            let mut inheritance_add = Vec::with_capacity(decl.inheritance_add.len());
            for name in &decl.inheritance_add {
                inheritance_add.push(resolve_one(name, decl.location)?);
            }

            let obj = self.namespace.get_mut(*r);
            obj.parent_names = decl.parents.clone();
            obj.parents = parents;
            obj.patch_target_names = decl.patch_targets.clone();
            obj.patch_targets = patch_targets.clone();
            obj.inheritance_add_names = decl.inheritance_add.clone();
            obj.inheritance_add = inheritance_add.clone();

            // Applying a patch's `[+Parent]` clause means adding `Parent`
            // to each target's own parent list.
            for target in &patch_targets {
                let t = self.namespace.get_mut(*target);
                for add in &inheritance_add {
                    if !t.parents.contains(add) {
                        t.parents.push(*add);
                    }
                }
            }
            // Register this object as a patch on each of its targets, in
            // load order, so `effective_value` can layer it on afterward.
            for target in &patch_targets {
                self.namespace.get_mut(*target).patches.push(*r);
            }
        }

        // Pass 2, step 2 — type-check member declarations, processing
        // objects in an order where every parent is resolved before its
        // children (the linearizer's cycle detection doubles as the
        // topological driver here, per spec §4.J).
        for (r, _) in &pending {
            linearize::linearization(&self.namespace, *r)?;
        }

        for (r, decl) in pending {
            self.resolve_members(r, &decl)?;
            self.namespace.get_mut(r).state = ObjectState::Resolved;
        }

        Ok(())
    }

    fn resolve_members(&mut self, r: ObjectRef, decl: &ObjectDecl) -> LangResult<()> {
        let is_patch = !decl.patch_targets.is_empty();

        for member in &decl.members {
            let op = member.operation;

            let target_declared_type: Option<Type> = if is_patch {
                let mut found: Option<Type> = None;
                for target_name in &decl.patch_targets {
                    let target = self
                        .namespace
                        .resolve(target_name)
                        .ok_or_else(|| LangError::name(member.location, format!("unresolved patch target '{}'", target_name)))?;
                    let inherited = self.inherited_member_type(target, &member.name)?.ok_or_else(|| {
                        LangError::type_error(member.location, format!("patch target '{}' has no member '{}'", target_name, member.name))
                    })?;
                    match &found {
                        None => found = Some(inherited),
                        Some(existing) if *existing == inherited => {}
                        Some(_) => {
                            return Err(LangError::type_error(
                                member.location,
                                format!("patch targets disagree on the type of member '{}'", member.name),
                            ))
                        }
                    }
                }
                found
            } else {
                None
            };

            let declared_type = match &member.declared_type {
                Some(expr) => {
                    let resolve = |name: &str| self.namespace.resolve(name);
                    Some(Type::from_type_expr(expr, &resolve)?)
                }
                None => target_declared_type.clone(),
            };

            let declared_type = declared_type.ok_or_else(|| {
                LangError::type_error(
                    member.location,
                    format!("member '{}' has no declared type and introduces nothing to inherit one from", member.name),
                )
            })?;

            if !is_patch && op != Some(Op::Assign) {
                return Err(LangError::type_error(
                    member.location,
                    format!("member '{}' on a root object must be introduced with '='", member.name),
                ));
            }

            let value = match &member.value {
                Some(expr) => Some(self.build_value(expr, &declared_type)?),
                None => None,
            };

            if let (Some(op), Some(value)) = (op, &value) {
                // Every container element was already checked against its
                // declared element type in `build_value`, so for a
                // container the declared type itself is the precise rhs
                // type — inferring it from the stored elements would guess
                // wrong on an empty sequence (see DESIGN.md).
                let rhs_type = match value {
                    Value::Set(_) | Value::OrderedSet(_) => declared_type.clone(),
                    other => self.value_type(other),
                };
                if !permitted(&declared_type, op, &rhs_type, &|a, b| self.namespace.is_descendant(a, b)) {
                    return Err(LangError::type_error(
                        member.location,
                        format!("operator '{}' is not permitted between {} and {}", op, declared_type, rhs_type),
                    ));
                }
            }

            self.namespace.get_mut(r).insert_member(
                member.name.clone(),
                Member {
                    declared_type: Some(declared_type),
                    operation: op,
                    value,
                    location: member.location,
                },
            );
        }
        Ok(())
    }

    /// The declared type of `name` as introduced anywhere in `o`'s
    /// linearization — used by a patch to inherit its target's member type.
    fn inherited_member_type(&self, o: ObjectRef, name: &str) -> LangResult<Option<Type>> {
        let l = linearize::linearization(&self.namespace, o)?;
        for r in l {
            if let Some(m) = self.namespace.get(r).get_member(name) {
                if let Some(t) = &m.declared_type {
                    return Ok(Some(t.clone()));
                }
            }
        }
        Ok(None)
    }

    fn value_type(&self, v: &Value) -> Type {
        match v {
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Text(_) => Type::Text,
            Value::Filename(_) => Type::Filename,
            Value::ObjectRef(r) => Type::Object(Some(*r)),
            Value::Set(items) => Type::Container(crate::types::ContainerKind::Set, Box::new(self.value_type(items.first().unwrap_or(&Value::Int(0))))),
            Value::OrderedSet(items) => {
                Type::Container(crate::types::ContainerKind::OrderedSet, Box::new(self.value_type(items.first().unwrap_or(&Value::Int(0)))))
            }
        }
    }

    fn build_value(&self, expr: &ValueExpr, declared_type: &Type) -> LangResult<Value> {
        match expr {
            ValueExpr::Scalar { token_kind, literal_text, location } => match token_kind {
                TokenKind::Int => literal_text
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| LangError::value(*location, format!("'{}' is not a valid integer literal", literal_text))),
                TokenKind::Float => parse_float(literal_text).map(Value::Float).ok_or_else(|| {
                    LangError::value(*location, format!("'{}' is not a valid float literal", literal_text))
                }),
                TokenKind::String => match declared_type {
                    Type::Filename => Ok(Value::Filename(literal_text.clone())),
                    _ => Ok(Value::Text(literal_text.clone())),
                },
                TokenKind::Id => {
                    // `inf`/`nan` lex as ordinary identifiers (spec §4.B)
                    // but are reinterpreted as float literals wherever the
                    // grammar demands a numeric value — i.e. when this
                    // atom's declared type is `float`.
                    if *declared_type == Type::Float {
                        match literal_text.as_str() {
                            "inf" => return Ok(Value::Float(f64::INFINITY)),
                            "-inf" => return Ok(Value::Float(f64::NEG_INFINITY)),
                            "nan" => return Ok(Value::Float(f64::NAN)),
                            _ => {}
                        }
                    }
                    let r = self
                        .namespace
                        .resolve(literal_text)
                        .ok_or_else(|| LangError::name(*location, format!("unresolved name '{}'", literal_text)))?;
                    Ok(Value::ObjectRef(r))
                }
                other => Err(LangError::internal(format!("build_value: unexpected scalar token kind {:?}", other))),
            },
            ValueExpr::Sequence { elements, location } => {
                let element_type = match declared_type {
                    Type::Container(_, elem) => elem.as_ref().clone(),
                    _ => return Err(LangError::type_error(*location, "a sequence literal requires a set or orderedset declared type")),
                };
                let mut values = Vec::with_capacity(elements.len());
                for e in elements {
                    let v = self.build_value(e, &element_type)?;
                    let v_type = self.value_type(&v);
                    if !v_type.is_child_of(&element_type, &|a, b| self.namespace.is_descendant(a, b)) {
                        return Err(LangError::type_error(
                            e.location(),
                            format!("sequence element of type {} is not a {}", v_type, element_type),
                        ));
                    }
                    values.push(v);
                }
                match declared_type {
                    Type::Container(crate::types::ContainerKind::Set, _) => Ok(Value::Set(values)),
                    Type::Container(crate::types::ContainerKind::OrderedSet, _) => Ok(Value::OrderedSet(values)),
                    _ => unreachable!(),
                }
            }
        }
    }

    pub fn get(&self, fqon: &str) -> Option<ObjectHandle<'_>> {
        self.namespace.resolve(fqon).map(|r| ObjectHandle { db: self, r })
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_float(text: &str) -> Option<f64> {
    text.parse::<f64>().ok()
}

/// A handle to a loaded object plus the database it lives in — the Store
/// API's `Object::get_member` / `has_member` / `parents` / `linearization`
/// / `effective_value` family (spec §6), split out from `Object` itself
/// since `Object` carries no back-reference to its namespace.
#[derive(Clone, Copy)]
pub struct ObjectHandle<'a> {
    db: &'a Database,
    r: ObjectRef,
}

impl<'a> ObjectHandle<'a> {
    pub fn fqon(&self) -> &'a str {
        self.db.namespace.fqon(self.r)
    }

    pub fn get_member(&self, name: &str) -> Option<&'a Member> {
        self.db.namespace.get(self.r).get_member(name)
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.db.namespace.get(self.r).has_member(name)
    }

    pub fn member_names(&self) -> &'a [String] {
        self.db.namespace.get(self.r).member_names()
    }

    pub fn parents(&self) -> Vec<ObjectHandle<'a>> {
        self.db.namespace.get(self.r).parents().iter().map(|&r| ObjectHandle { db: self.db, r }).collect()
    }

    pub fn linearization(&self) -> LangResult<Vec<ObjectHandle<'a>>> {
        Ok(linearize::linearization(&self.db.namespace, self.r)?.into_iter().map(|r| ObjectHandle { db: self.db, r }).collect())
    }

    pub fn effective_value(&self, name: &str) -> LangResult<Value> {
        effective_value(&self.db.namespace, self.r, name)
    }

    /// Dump this object's fqon, resolved parents and effective member table
    /// as an indented tree (spec §2.6's "informative pretty-print").
    pub fn print_tree(&self) -> std::io::Result<()> {
        crate::tree::print(&crate::tree::build::object(self))
    }
}

/// `effective(o, name)` (spec §4.J): the linearized base value, with every
/// patch targeting `o` layered on top in load order.
pub fn effective_value(ns: &Namespace, o: ObjectRef, name: &str) -> LangResult<Value> {
    if let Some(cached) = ns.get(o).cached_effective(name) {
        return Ok(cached);
    }

    let l = linearize::linearization(ns, o)?;
    let mut value: Option<Value> = None;
    for &r in l.iter().rev() {
        if let Some(m) = ns.get(r).get_member(name) {
            apply_member(&mut value, m.operation, m.value.as_ref(), m.location)?;
        }
    }

    for &patch_ref in &ns.get(o).patches {
        if let Some(m) = ns.get(patch_ref).get_member(name) {
            apply_member(&mut value, m.operation, m.value.as_ref(), m.location)?;
        }
    }

    let result = value.ok_or_else(|| LangError::name(ns.get(o).location, format!("object '{}' has no member '{}'", ns.fqon(o), name)))?;
    ns.get(o).cache_effective(name, result.clone());
    Ok(result)
}

fn apply_member(value: &mut Option<Value>, op: Option<Op>, rhs: Option<&Value>, loc: Location) -> LangResult<()> {
    let op = match op {
        Some(op) => op,
        None => return Ok(()),
    };
    let rhs = rhs.ok_or_else(|| LangError::internal("member operation without a value"))?;
    match (&value, op) {
        (None, _) => *value = Some(rhs.clone()),
        (Some(_), Op::Assign) => *value = Some(rhs.clone()),
        (Some(cur), _) => *value = Some(cur.apply(op, rhs, loc)?),
    }
    Ok(())
}
