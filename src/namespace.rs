//! Namespace tree (component H). Owns every `Object` ever declared; objects
//! refer to each other only through `ObjectRef` indices into `objects`
//! (spec §5 ownership model).

use crate::error::{LangError, LangResult};
use crate::object::{Object, ObjectRef};
use crate::source::Location;
use std::collections::HashMap;

#[derive(Default)]
struct NamespaceNode {
    objects: HashMap<String, ObjectRef>,
    children: HashMap<String, NamespaceNode>,
}

/// Flat object table plus the dotted-path tree used to resolve names like
/// `a.b.C`. The tree only ever holds the *last* segment's leaf name; nyan
/// doesn't nest namespaces implicitly, but `fqon`s are still dot-separated
/// so lookups walk the same way the declaring namespace would have.
pub struct Namespace {
    pub(crate) objects: Vec<Object>,
    root: NamespaceNode,
    by_fqon: HashMap<String, ObjectRef>,
}

impl Namespace {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            root: NamespaceNode::default(),
            by_fqon: HashMap::new(),
        }
    }

    /// Declare a fresh object. Errors if `fqon` is already taken (spec
    /// §4.H: "Adding an object with a name already present is a
    /// `SemanticError`" — surfaced here as `NameError`, the kind this
    /// crate uses for namespace collisions).
    pub fn declare(&mut self, fqon: String, location: Location) -> LangResult<ObjectRef> {
        if self.by_fqon.contains_key(&fqon) {
            return Err(LangError::name(location, format!("an object named '{}' already exists", fqon)));
        }
        let r = ObjectRef(self.objects.len());
        self.objects.push(Object::new(fqon.clone(), location));
        self.by_fqon.insert(fqon.clone(), r);

        let mut segments: Vec<&str> = fqon.split('.').collect();
        let leaf = segments.pop().unwrap();
        let mut node = &mut self.root;
        for seg in segments {
            node = node.children.entry(seg.to_string()).or_default();
        }
        node.objects.insert(leaf.to_string(), r);

        Ok(r)
    }

    /// `namespace.resolve("a.b.C")`: descend child namespaces, then
    /// consult the leaf's object map.
    pub fn resolve(&self, path: &str) -> Option<ObjectRef> {
        if let Some(r) = self.by_fqon.get(path) {
            return Some(*r);
        }
        let mut segments: Vec<&str> = path.split('.').collect();
        let leaf = segments.pop()?;
        let mut node = &self.root;
        for seg in segments {
            node = node.children.get(seg)?;
        }
        node.objects.get(leaf).copied()
    }

    pub fn get(&self, r: ObjectRef) -> &Object {
        &self.objects[r.index()]
    }

    pub fn get_mut(&mut self, r: ObjectRef) -> &mut Object {
        &mut self.objects[r.index()]
    }

    pub fn fqon(&self, r: ObjectRef) -> &str {
        &self.objects[r.index()].fqon
    }

    /// Whether `descendant` is `ancestor` or has it in its resolved parent
    /// chain (not just its linearization cache, so this is safe to call
    /// before a linearization exists). Used by `Type::is_child_of`.
    pub fn is_descendant(&self, descendant: ObjectRef, ancestor: ObjectRef) -> bool {
        if descendant == ancestor {
            return true;
        }
        let mut stack = vec![descendant];
        let mut seen = std::collections::HashSet::new();
        while let Some(cur) = stack.pop() {
            if !seen.insert(cur) {
                continue;
            }
            for &p in self.get(cur).parents() {
                if p == ancestor {
                    return true;
                }
                stack.push(p);
            }
        }
        false
    }

    /// Clear every derived cache (spec §9: "invalidated wholesale when the
    /// namespace is extended").
    pub fn invalidate_all_caches(&mut self) {
        for obj in &mut self.objects {
            obj.invalidate_caches();
        }
    }

    /// A mark to roll back to if the in-progress load fails partway
    /// through (spec §5: "either every declaration ... is installed, or
    /// none is"). Besides the object count, this snapshots the `parents`
    /// list of every already-existing object, since an in-progress load's
    /// `[+Parent]` inheritance-add clause can mutate a pre-existing patch
    /// target's `parents` in place (loader.rs) — truncating `objects` alone
    /// would leave that mutation in place, dangling a reference into rows
    /// that no longer exist once the new objects are truncated away.
    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            object_count: self.objects.len(),
            parents_snapshot: self.objects.iter().map(|o| o.parents.clone()).collect(),
        }
    }

    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.objects.truncate(checkpoint.object_count);
        for (obj, parents) in self.objects.iter_mut().zip(checkpoint.parents_snapshot) {
            obj.parents = parents;
        }
        self.by_fqon.retain(|_, r| r.index() < checkpoint.object_count);
        self.root = NamespaceNode::default();
        for (i, obj) in self.objects.iter().enumerate() {
            let r = ObjectRef(i);
            let mut segments: Vec<&str> = obj.fqon.split('.').collect();
            let leaf = segments.pop().unwrap();
            let mut node = &mut self.root;
            for seg in segments {
                node = node.children.entry(seg.to_string()).or_default();
            }
            node.objects.insert(leaf.to_string(), r);
        }
        // Any patch edge recorded on a still-present object but pointing
        // at a rolled-back one must go too.
        for obj in &mut self.objects {
            obj.patches.retain(|r| r.index() < checkpoint.object_count);
        }
    }
}

/// Snapshot taken by [Namespace::checkpoint] and consumed by
/// [Namespace::rollback].
pub(crate) struct Checkpoint {
    object_count: usize,
    parents_snapshot: Vec<Vec<ObjectRef>>,
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
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
    fn declare_and_resolve_round_trip() {
        let mut ns = Namespace::new();
        let r = ns.declare("gaben.units.Soldier".to_string(), loc()).unwrap();
        assert_eq!(ns.resolve("gaben.units.Soldier"), Some(r));
        assert_eq!(ns.resolve("nope"), None);
    }

    #[test]
    fn duplicate_declaration_is_a_name_error() {
        let mut ns = Namespace::new();
        ns.declare("A".to_string(), loc()).unwrap();
        let err = ns.declare("A".to_string(), loc()).unwrap_err();
        assert_eq!(err.kind, crate::error::LangErrorKind::Name);
    }

    #[test]
    fn is_descendant_walks_the_parent_chain() {
        let mut ns = Namespace::new();
        let a = ns.declare("A".to_string(), loc()).unwrap();
        let b = ns.declare("B".to_string(), loc()).unwrap();
        let c = ns.declare("C".to_string(), loc()).unwrap();
        ns.get_mut(b).parents = vec![a];
        ns.get_mut(c).parents = vec![b];
        assert!(ns.is_descendant(c, a));
        assert!(!ns.is_descendant(a, c));
    }
}
