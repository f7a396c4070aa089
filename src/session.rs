//! Construction session - the explicit context of one translation run
//!
//! A session borrows the file set and the graph engine for the duration of a
//! unit's translation and carries the state construction needs along the way:
//! build options, the scope stack and the type cache. Every factory and
//! builder call takes the session by reference.

use crate::engine::GraphEngine;
use crate::node::{NodeId, NodeKind, Value};
use crate::position::{self, AstNode, FileSet, PhysicalLocation};
use crate::scope::ScopeManager;
use crate::types::TypeCache;
use crate::Result;
use serde::{Deserialize, Serialize};

/// What to do when the engine refuses a superclass edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuperClassPolicy {
    /// Return the engine's error to the caller
    #[default]
    Propagate,
    /// Log the failure and carry on without the edge
    Ignore,
}

/// Options that shape construction
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    pub super_class_policy: SuperClassPolicy,
}

/// Context threaded through every construction call
pub struct Session<'a> {
    fset: &'a FileSet,
    engine: &'a mut dyn GraphEngine,
    options: BuildOptions,
    pub(crate) scopes: ScopeManager,
    pub(crate) types: TypeCache,
}

impl<'a> Session<'a> {
    pub fn new(fset: &'a FileSet, engine: &'a mut dyn GraphEngine, options: BuildOptions) -> Self {
        Self {
            fset,
            engine,
            options,
            scopes: ScopeManager::new(),
            types: TypeCache::new(),
        }
    }

    pub fn fset(&self) -> &'a FileSet {
        self.fset
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn engine(&self) -> &dyn GraphEngine {
        &*self.engine
    }

    pub fn scopes(&self) -> &ScopeManager {
        &self.scopes
    }

    pub fn scopes_mut(&mut self) -> &mut ScopeManager {
        &mut self.scopes
    }

    /// Resolve a node's source text and location against the session's file set
    pub fn resolve<N: AstNode + ?Sized>(&self, node: &N) -> Result<(String, PhysicalLocation)> {
        position::resolve(self.fset, node)
    }

    pub(crate) fn create(&mut self, kind: NodeKind) -> Result<NodeId> {
        let id = self.engine.create_node(kind)?;
        tracing::trace!("created {} {}", kind, id);
        Ok(id)
    }

    pub(crate) fn set(&mut self, node: NodeId, field: &str, value: Value) -> Result<()> {
        self.engine.set_field(node, field, value)
    }

    pub(crate) fn get(&self, node: NodeId, field: &str) -> Result<Value> {
        self.engine.get_field(node, field)
    }

    pub(crate) fn invoke(&mut self, node: NodeId, method: &str, arg: impl Into<Value>) -> Result<Value> {
        self.engine.invoke(node, method, vec![arg.into()])
    }

    pub(crate) fn kind_of(&self, node: NodeId) -> Option<NodeKind> {
        self.engine.kind_of(node)
    }
}
