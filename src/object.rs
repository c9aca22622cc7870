//! Object & Member (component G). An `Object` owns its members; parents and
//! patch targets are non-owning indices into the same `Namespace`'s object
//! table (spec §5 ownership model), never back-pointers — the same
//! index-not-pointer discipline the teacher's `wrapper_index.rs` used for
//! referring into a shared arena.

use crate::ops::Op;
use crate::source::Location;
use crate::types::Type;
use crate::value::Value;
use once_cell::unsync::OnceCell;
use std::collections::HashMap;

/// A non-owning reference to an object in some `Namespace`'s table. Only
/// valid while that namespace is alive (spec §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef(pub(crate) usize);

impl ObjectRef {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectState {
    Declared,
    Resolved,
    Errored,
}

#[derive(Debug, Clone)]
pub struct Member {
    pub declared_type: Option<Type>,
    pub operation: Option<Op>,
    pub value: Option<Value>,
    pub location: Location,
}

pub struct Object {
    pub fqon: String,
    pub location: Location,

    // Pass 1 raw names; pass 2 fills in the resolved counterparts.
    pub parent_names: Vec<String>,
    pub parents: Vec<ObjectRef>,
    pub patch_target_names: Vec<String>,
    pub patch_targets: Vec<ObjectRef>,
    pub inheritance_add_names: Vec<String>,
    pub inheritance_add: Vec<ObjectRef>,

    /// Patch objects that target this object, in the order they were
    /// loaded. Not part of the inheritance graph — patches aren't parents,
    /// so they never appear in `linearization()` — but `effective_value`
    /// layers them on top of the linearized base value (spec §1 "applying
    /// all accumulated patches in order").
    pub patches: Vec<ObjectRef>,

    pub(crate) members: HashMap<String, Member>,
    pub(crate) member_order: Vec<String>,

    pub state: ObjectState,

    linearization_cache: OnceCell<Vec<ObjectRef>>,
    effective_cache: std::cell::RefCell<HashMap<String, Value>>,
}

impl Object {
    pub fn new(fqon: impl Into<String>, location: Location) -> Self {
        Self {
            fqon: fqon.into(),
            location,
            parent_names: Vec::new(),
            parents: Vec::new(),
            patch_target_names: Vec::new(),
            patch_targets: Vec::new(),
            inheritance_add_names: Vec::new(),
            inheritance_add: Vec::new(),
            patches: Vec::new(),
            members: HashMap::new(),
            member_order: Vec::new(),
            state: ObjectState::Declared,
            linearization_cache: OnceCell::new(),
            effective_cache: std::cell::RefCell::new(HashMap::new()),
        }
    }

    pub fn is_patch(&self) -> bool {
        !self.patch_target_names.is_empty()
    }

    pub fn insert_member(&mut self, name: String, member: Member) {
        if !self.members.contains_key(&name) {
            self.member_order.push(name.clone());
        }
        self.members.insert(name, member);
    }

    pub fn get_member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn member_names(&self) -> &[String] {
        &self.member_order
    }

    pub fn parents(&self) -> &[ObjectRef] {
        &self.parents
    }

    pub(crate) fn cached_linearization(&self) -> Option<&Vec<ObjectRef>> {
        self.linearization_cache.get()
    }

    pub(crate) fn store_linearization(&self, l: Vec<ObjectRef>) -> &Vec<ObjectRef> {
        // `set` fails only if already initialized; invalidation always
        // clears first, so this never races with an existing value.
        let _ = self.linearization_cache.set(l);
        self.linearization_cache.get().unwrap()
    }

    pub(crate) fn cached_effective(&self, name: &str) -> Option<Value> {
        self.effective_cache.borrow().get(name).cloned()
    }

    pub(crate) fn cache_effective(&self, name: &str, value: Value) {
        self.effective_cache.borrow_mut().insert(name.to_string(), value);
    }

    pub(crate) fn invalidate_caches(&mut self) {
        self.linearization_cache = OnceCell::new();
        self.effective_cache.borrow_mut().clear();
    }
}
