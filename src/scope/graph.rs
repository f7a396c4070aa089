//! Scope bookkeeping for name binding during construction
//!
//! The scope manager tracks:
//! - Scope hierarchy (parent/child relationships) and the open scope stack
//! - The container node each scope links its declarations into
//! - Definitions within each scope
//! - Which nodes are already linked (their names are frozen)

use crate::node::NodeId;
use std::collections::{HashMap, HashSet};

/// Unique identifier for a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// The kind of scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// One source file
    TranslationUnit,
    /// Package/module level scope
    Namespace,
    /// Struct/class/interface scope
    Record,
    /// Function/method scope
    Function,
    /// Block scope (bodies, case arms)
    Block,
}

/// The list a declaration occupies inside its container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberSlot {
    Declaration,
    Include,
    Method,
    Field,
    Parameter,
}

/// Scope state of one translation unit
#[derive(Debug, Default)]
pub struct ScopeManager {
    /// Next scope ID to assign
    next_id: u32,
    /// Scope hierarchy (child → parent)
    parents: HashMap<ScopeId, ScopeId>,
    kinds: HashMap<ScopeId, ScopeKind>,
    /// Container node per scope; block scopes have none
    containers: HashMap<ScopeId, NodeId>,
    scope_of: HashMap<NodeId, ScopeId>,
    /// Definitions: (scope, name) → node
    definitions: HashMap<(ScopeId, String), NodeId>,
    /// Members linked per container: (container, slot, name) → node
    members: HashMap<(NodeId, MemberSlot, String), NodeId>,
    /// Open scopes, innermost last
    stack: Vec<ScopeId>,
    linked: HashSet<NodeId>,
    /// Names that may be declared repeatedly in one container; kept across resets
    repeatable: HashSet<String>,
}

impl ScopeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all state and open a fresh root scope
    pub fn reset(&mut self, kind: ScopeKind, container: NodeId) -> ScopeId {
        let repeatable = std::mem::take(&mut self.repeatable);
        *self = Self {
            repeatable,
            ..Self::default()
        };
        self.enter(kind, Some(container))
    }

    /// Open a child of the current scope and make it current
    pub fn enter(&mut self, kind: ScopeKind, container: Option<NodeId>) -> ScopeId {
        let id = ScopeId(self.next_id);
        self.next_id += 1;
        if let Some(parent) = self.current() {
            self.parents.insert(id, parent);
        }
        self.kinds.insert(id, kind);
        if let Some(container) = container {
            self.containers.insert(id, container);
            self.scope_of.insert(container, id);
        }
        self.stack.push(id);
        id
    }

    /// Close the current scope; the root scope stays open
    pub fn leave(&mut self) -> Option<ScopeId> {
        if self.stack.len() > 1 {
            self.stack.pop()
        } else {
            None
        }
    }

    pub fn current(&self) -> Option<ScopeId> {
        self.stack.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Get the parent of a scope
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.parents.get(&scope).copied()
    }

    /// Get the kind of a scope
    pub fn kind(&self, scope: ScopeId) -> Option<ScopeKind> {
        self.kinds.get(&scope).copied()
    }

    pub fn container(&self, scope: ScopeId) -> Option<NodeId> {
        self.containers.get(&scope).copied()
    }

    /// The scope opened for a container node
    pub fn scope_of(&self, container: NodeId) -> Option<ScopeId> {
        self.scope_of.get(&container).copied()
    }

    /// Innermost open scope of a kind
    pub fn nearest(&self, kind: ScopeKind) -> Option<ScopeId> {
        self.stack
            .iter()
            .rev()
            .copied()
            .find(|scope| self.kind(*scope) == Some(kind))
    }

    /// Add a definition to a scope
    pub fn define(&mut self, scope: ScopeId, name: impl Into<String>, node: NodeId) {
        self.definitions.insert((scope, name.into()), node);
    }

    /// Look up a definition in a scope (not walking parents)
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<NodeId> {
        self.definitions.get(&(scope, name.to_string())).copied()
    }

    /// Look up a definition walking up the scope chain
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<NodeId> {
        self.scope_chain(scope)
            .into_iter()
            .find_map(|s| self.lookup_local(s, name))
    }

    /// Look up a definition from the current scope outward
    pub fn resolve(&self, name: &str) -> Option<NodeId> {
        self.current().and_then(|scope| self.lookup(scope, name))
    }

    /// Get scope chain from a scope up to root
    pub fn scope_chain(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![scope];
        let mut current = scope;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    pub fn member(&self, container: NodeId, slot: MemberSlot, name: &str) -> Option<NodeId> {
        self.members
            .get(&(container, slot, name.to_string()))
            .copied()
    }

    pub(crate) fn record_member(&mut self, container: NodeId, slot: MemberSlot, name: &str, node: NodeId) {
        self.members.insert((container, slot, name.to_string()), node);
    }

    /// Let `name` be declared any number of times in a unit or namespace
    pub fn allow_repeated(&mut self, name: impl Into<String>) {
        self.repeatable.insert(name.into());
    }

    pub fn is_repeatable(&self, name: &str) -> bool {
        self.repeatable.contains(name)
    }

    pub fn is_linked(&self, node: NodeId) -> bool {
        self.linked.contains(&node)
    }

    pub(crate) fn mark_linked(&mut self, node: NodeId) {
        self.linked.insert(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_hierarchy() {
        let mut scopes = ScopeManager::new();

        let unit = scopes.reset(ScopeKind::TranslationUnit, NodeId(0));
        let record = scopes.enter(ScopeKind::Record, Some(NodeId(1)));
        let method = scopes.enter(ScopeKind::Function, Some(NodeId(2)));

        assert_eq!(scopes.parent(method), Some(record));
        assert_eq!(scopes.parent(record), Some(unit));
        assert_eq!(scopes.parent(unit), None);
        assert_eq!(scopes.scope_of(NodeId(1)), Some(record));
        assert_eq!(scopes.nearest(ScopeKind::Record), Some(record));
    }

    #[test]
    fn test_definition_lookup() {
        let mut scopes = ScopeManager::new();

        let unit = scopes.reset(ScopeKind::TranslationUnit, NodeId(0));
        let record = scopes.enter(ScopeKind::Record, Some(NodeId(1)));
        let method = scopes.enter(ScopeKind::Function, Some(NodeId(2)));

        scopes.define(unit, "global_func", NodeId(10));
        scopes.define(record, "method", NodeId(11));

        // Local lookup
        assert_eq!(scopes.lookup_local(record, "method"), Some(NodeId(11)));
        assert!(scopes.lookup_local(record, "global_func").is_none());

        // Chain lookup from method scope should find both
        assert!(scopes.lookup(method, "method").is_some());
        assert_eq!(scopes.resolve("global_func"), Some(NodeId(10)));
    }

    #[test]
    fn test_root_scope_stays_open() {
        let mut scopes = ScopeManager::new();
        let unit = scopes.reset(ScopeKind::TranslationUnit, NodeId(0));
        let block = scopes.enter(ScopeKind::Block, None);

        assert_eq!(scopes.leave(), Some(block));
        assert_eq!(scopes.leave(), None);
        assert_eq!(scopes.current(), Some(unit));
        assert_eq!(scopes.scope_chain(block), vec![block, unit]);
    }

    #[test]
    fn test_repeatable_names_survive_reset() {
        let mut scopes = ScopeManager::new();
        scopes.allow_repeated("init");
        scopes.reset(ScopeKind::TranslationUnit, NodeId(0));
        scopes.define(ScopeId(0), "helper", NodeId(3));

        scopes.reset(ScopeKind::TranslationUnit, NodeId(5));
        assert!(scopes.is_repeatable("init"));
        assert!(!scopes.is_repeatable("helper"));
        assert!(scopes.resolve("helper").is_none());
    }
}
