//! The environment arena (§3.2, §9): every scope in one interpreter
//! invocation lives as a slot here, referenced by [`EnvHandle`]. This
//! replaces a parent-pointer ownership graph with index-based handles whose
//! lifetime is exactly the arena's.

use crate::handle::EnvHandle;
use crate::kind::EnvKind;
use crate::reserved::{is_reserved, ReservedValue};
use indexmap::IndexMap;
use mlld_errors::VariableError;
use mlld_value::{ModuleSnapshot, Value};
use std::collections::BTreeSet;

struct Slot {
    parent: Option<EnvHandle>,
    kind: EnvKind,
    bindings: IndexMap<String, Value>,
    reserved: IndexMap<String, ReservedValue>,
    /// `None` means "export all non-underscore top-level names" (legacy).
    export_manifest: Option<BTreeSet<String>>,
    generation: u32,
    alive: bool,
}

/// Arena of environment slots for one interpreter invocation (§9: "no
/// process-wide state ... constructed per interpreter instance").
#[derive(Default)]
pub struct EnvArena {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl EnvArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the program's root environment.
    pub fn root(&mut self) -> EnvHandle {
        self.alloc(None, EnvKind::Root)
    }

    /// Create a new environment whose parent is `parent` (§4.1 `child()`).
    pub fn child(&mut self, parent: EnvHandle, kind: EnvKind) -> EnvHandle {
        self.alloc(Some(parent), kind)
    }

    fn alloc(&mut self, parent: Option<EnvHandle>, kind: EnvKind) -> EnvHandle {
        let slot = Slot {
            parent,
            kind,
            bindings: IndexMap::new(),
            reserved: IndexMap::new(),
            export_manifest: None,
            generation: 0,
            alive: true,
        };
        if let Some(index) = self.free.pop() {
            let generation = self.slots[index].generation + 1;
            let mut slot = slot;
            slot.generation = generation;
            self.slots[index] = slot;
            EnvHandle { index, generation }
        } else {
            let index = self.slots.len();
            self.slots.push(slot);
            EnvHandle {
                index,
                generation: 0,
            }
        }
    }

    fn slot(&self, handle: EnvHandle) -> &Slot {
        let slot = &self.slots[handle.index];
        assert!(
            slot.alive && slot.generation == handle.generation,
            "use of destroyed environment handle"
        );
        slot
    }

    fn slot_mut(&mut self, handle: EnvHandle) -> &mut Slot {
        let generation = handle.generation;
        let slot = &mut self.slots[handle.index];
        assert!(
            slot.alive && slot.generation == generation,
            "use of destroyed environment handle"
        );
        slot
    }

    pub fn kind(&self, handle: EnvHandle) -> EnvKind {
        self.slot(handle).kind
    }

    pub fn parent(&self, handle: EnvHandle) -> Option<EnvHandle> {
        self.slot(handle).parent
    }

    /// Install a reserved slot (builtins table construction, §2 "installs
    /// built-in resolvers and transformers").
    pub fn install_reserved(&mut self, handle: EnvHandle, name: &str, value: ReservedValue) {
        debug_assert!(is_reserved(name), "not a reserved name: {name}");
        self.slot_mut(handle).reserved.insert(name.to_string(), value);
    }

    /// Look up `name`: reserved slots first, then local bindings, then walk
    /// the parent chain (§4.1 `get`).
    pub fn get(&self, handle: EnvHandle, name: &str) -> Option<Value> {
        let mut cursor = Some(handle);
        while let Some(h) = cursor {
            let slot = self.slot(h);
            if let Some(reserved) = slot.reserved.get(name) {
                return Some(reserved.resolve());
            }
            if let Some(value) = slot.bindings.get(name) {
                return Some(value.clone());
            }
            cursor = slot.parent;
        }
        None
    }

    /// True if `name` is bound (ordinary or reserved) anywhere in the chain.
    pub fn contains(&self, handle: EnvHandle, name: &str) -> bool {
        self.get(handle, name).is_some()
    }

    /// Bind `name` in `handle`'s own scope (§4.1 `set`). Fails
    /// `ReservedName` for any reserved name, `ImmutableRebinding` if already
    /// locally bound (bindings are immutable; `/var` never rebinds, and
    /// `let` always targets a fresh child scope instead of the same one).
    pub fn set(&mut self, handle: EnvHandle, name: &str, value: Value) -> Result<(), VariableError> {
        if is_reserved(name) {
            return Err(VariableError::ReservedName {
                name: name.to_string(),
            });
        }
        let slot = self.slot_mut(handle);
        if slot.bindings.contains_key(name) {
            return Err(VariableError::ImmutableRebinding {
                name: name.to_string(),
            });
        }
        slot.bindings.insert(name.to_string(), value);
        Ok(())
    }

    /// Record `names` as exported (§4.2 `/export`). Idempotent.
    pub fn add_exports(&mut self, handle: EnvHandle, names: impl IntoIterator<Item = String>) {
        let slot = self.slot_mut(handle);
        slot.export_manifest.get_or_insert_with(BTreeSet::new).extend(names);
    }

    /// Names this environment exports: the explicit manifest if one was
    /// ever recorded, else every non-underscore-prefixed local binding
    /// (legacy "export all" behavior, §3.2).
    pub fn exported_names(&self, handle: EnvHandle) -> Vec<String> {
        let slot = self.slot(handle);
        match &slot.export_manifest {
            Some(manifest) => manifest.iter().cloned().collect(),
            None => slot
                .bindings
                .keys()
                .filter(|name| !name.starts_with('_'))
                .cloned()
                .collect(),
        }
    }

    /// A read-only snapshot of every binding visible from `handle`,
    /// outermost first so inner scopes override outer ones (§4.1
    /// `capture()`), used when an exported executable captures its
    /// defining module's environment.
    pub fn capture(&self, handle: EnvHandle) -> ModuleSnapshot {
        let mut chain = Vec::new();
        let mut cursor = Some(handle);
        while let Some(h) = cursor {
            chain.push(h);
            cursor = self.slot(h).parent;
        }
        let mut bindings = IndexMap::new();
        for h in chain.into_iter().rev() {
            for (k, v) in &self.slot(h).bindings {
                bindings.insert(k.clone(), v.clone());
            }
        }
        ModuleSnapshot::new(bindings)
    }

    /// Copy `child`'s own (non-reserved) bindings into `parent` (§4.1
    /// `merge`, used by imports and block results). Colliding names are
    /// reported; callers (the import evaluator) decide whether that's fatal
    /// or, for reserved-adjacent namespaces, to be merged instead.
    pub fn merge(&mut self, parent: EnvHandle, child: EnvHandle) -> Vec<String> {
        let child_bindings: Vec<(String, Value)> = self
            .slot(child)
            .bindings
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let mut collisions = Vec::new();
        for (name, value) in child_bindings {
            let parent_slot = self.slot_mut(parent);
            if parent_slot.bindings.contains_key(&name) {
                collisions.push(name);
                continue;
            }
            parent_slot.bindings.insert(name, value);
        }
        collisions
    }

    /// Destroy a child environment (§4.1 lifecycle: "destroyed implicitly
    /// when their owning block evaluator returns"). The handle and any
    /// handles derived from it become invalid; reusing them panics.
    pub fn destroy(&mut self, handle: EnvHandle) {
        let slot = &mut self.slots[handle.index];
        slot.alive = false;
        slot.bindings.clear();
        slot.reserved.clear();
        self.free.push(handle.index);
    }
}

#[cfg(test)]
#[path = "arena_tests.rs"]
mod tests;
