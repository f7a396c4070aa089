//! Graph engine boundary and the in-memory arena engine
//!
//! Construction talks to an engine through four primitives only: create a
//! node, write a field, read a field, invoke a schema method. [`MemoryGraph`]
//! implements them over an arena of [`NodeRecord`]s and checks every call
//! against the [`schema`](crate::schema).

use crate::edge::{Edge, EdgeKind};
use crate::node::{NodeId, NodeKind, NodeRecord, Value};
use crate::schema::{self, MethodOp, Slot};
use crate::{Error, Result};

/// Fields every node carries regardless of kind
pub const NAME: &str = "name";
pub const CODE: &str = "code";
pub const LOCATION: &str = "location";

/// The boundary to whatever stores the graph.
///
/// Every call may fail with [`Error::EngineRejected`]; callers treat that as
/// fatal for the unit being translated.
pub trait GraphEngine {
    /// Allocate a node of `kind` with an empty name and no fields
    fn create_node(&mut self, kind: NodeKind) -> Result<NodeId>;

    /// Overwrite one field
    fn set_field(&mut self, node: NodeId, field: &str, value: Value) -> Result<()>;

    /// Read one field; unset fields read as [`Value::Null`]
    fn get_field(&self, node: NodeId, field: &str) -> Result<Value>;

    /// Call a schema method with its arguments
    fn invoke(&mut self, node: NodeId, method: &str, args: Vec<Value>) -> Result<Value>;

    /// Kind of an existing node
    fn kind_of(&self, node: NodeId) -> Option<NodeKind>;

    fn contains(&self, node: NodeId) -> bool {
        self.kind_of(node).is_some()
    }
}

/// In-memory graph engine.
///
/// Nodes are never removed; a `NodeId` stays valid for the life of the graph.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    nodes: Vec<NodeRecord>,
    /// Maximum number of nodes, if bounded
    capacity: Option<usize>,
}

impl MemoryGraph {
    /// Create a new empty, unbounded graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph that rejects node creation beyond `max_nodes`
    pub fn with_node_limit(max_nodes: usize) -> Self {
        Self {
            nodes: Vec::new(),
            capacity: Some(max_nodes),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by its handle
    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id.index())
    }

    /// Get all nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.iter()
    }

    /// Get all nodes of one kind
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// Get outgoing edges from a node, in schema field order
    pub fn edges_from(&self, id: NodeId) -> Vec<Edge> {
        let Some(record) = self.node(id) else {
            return Vec::new();
        };

        let mut edges = Vec::new();
        for spec in schema::fields(record.kind) {
            let Some(kind) = EdgeKind::from_field(spec.name) else {
                continue;
            };
            match record.field(spec.name) {
                Value::Node(to) => edges.push(Edge::new(id, *to, kind)),
                Value::Nodes(targets) => edges.extend(
                    targets
                        .iter()
                        .enumerate()
                        .map(|(i, to)| Edge::at(id, *to, kind, i)),
                ),
                _ => {}
            }
        }
        edges
    }

    /// Get outgoing edges of a specific kind
    pub fn edges_from_by_kind(&self, id: NodeId, kind: EdgeKind) -> Vec<Edge> {
        self.edges_from(id)
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }

    /// Get incoming edges to a node
    pub fn edges_to(&self, id: NodeId) -> Vec<Edge> {
        self.edges().filter(|e| e.to == id).collect()
    }

    /// Get all edges
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.nodes.iter().flat_map(|n| self.edges_from(n.id))
    }

    /// Get statistics about the graph
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats::default();
        for record in &self.nodes {
            stats.total_nodes += 1;
            if record.kind.is_declaration() {
                stats.declarations += 1;
            } else if record.kind.is_statement() {
                stats.statements += 1;
            } else if record.kind.is_type() {
                stats.types += 1;
            }
            if record.kind == NodeKind::TranslationUnitDeclaration {
                stats.units += 1;
            }
        }
        for edge in self.edges() {
            stats.total_edges += 1;
            if edge.kind.is_ast() {
                stats.ast_edges += 1;
            } else {
                stats.reference_edges += 1;
            }
        }
        stats
    }

    fn record(&self, id: NodeId, operation: &str) -> Result<&NodeRecord> {
        self.node(id)
            .ok_or_else(|| Error::rejected(operation, id, "no such node"))
    }

    fn record_mut(&mut self, id: NodeId, operation: &str) -> Result<&mut NodeRecord> {
        self.nodes
            .get_mut(id.index())
            .ok_or_else(|| Error::rejected(operation, id, "no such node"))
    }

    /// Check a value against a slot, including the kinds of referenced nodes
    fn check_slot(&self, operation: &str, node: NodeId, slot: Slot, value: &Value) -> Result<()> {
        let admit = |category: schema::Category, target: NodeId| -> Result<()> {
            match self.kind_of(target) {
                Some(kind) if category.admits(kind) => Ok(()),
                Some(kind) => Err(Error::rejected(
                    operation,
                    node,
                    format!("{} {} is not a {:?}", kind, target, category),
                )),
                None => Err(Error::rejected(operation, node, format!("no such node {}", target))),
            }
        };

        match (slot, value) {
            (_, Value::Null) => Ok(()),
            (Slot::Text, Value::Text(_)) => Ok(()),
            (Slot::One(category), Value::Node(target)) => admit(category, *target),
            (Slot::Many(category), Value::Nodes(targets)) => targets
                .iter()
                .try_for_each(|target| admit(category, *target)),
            (slot, value) => Err(Error::rejected(
                operation,
                node,
                format!("expected {:?}, got {}", slot, value.shape()),
            )),
        }
    }
}

impl GraphEngine for MemoryGraph {
    fn create_node(&mut self, kind: NodeKind) -> Result<NodeId> {
        if let Some(max) = self.capacity {
            if self.nodes.len() >= max {
                return Err(Error::rejected(
                    format!("create {}", kind),
                    "graph",
                    format!("node capacity of {} exhausted", max),
                ));
            }
        }

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord::new(id, kind));
        Ok(id)
    }

    fn set_field(&mut self, node: NodeId, field: &str, value: Value) -> Result<()> {
        let operation = format!("set {}", field);
        let kind = self.record(node, &operation)?.kind;

        match (field, value) {
            (NAME, Value::Text(name)) => self.record_mut(node, &operation)?.name = name,
            (CODE, Value::Text(code)) => self.record_mut(node, &operation)?.code = Some(code),
            (CODE, Value::Null) => self.record_mut(node, &operation)?.code = None,
            (LOCATION, Value::Location(location)) => {
                let record = self.record_mut(node, &operation)?;
                if record.location.is_some() {
                    return Err(Error::rejected(operation, node, "location is already set"));
                }
                record.location = Some(location)
            }
            (NAME | CODE | LOCATION, value) => {
                return Err(Error::rejected(
                    operation,
                    node,
                    format!("{} cannot hold a {}", field, value.shape()),
                ));
            }
            (_, value) => {
                let spec = schema::field_spec(kind, field).ok_or_else(|| {
                    Error::rejected(&operation, node, format!("{} has no field {}", kind, field))
                })?;
                self.check_slot(&operation, node, spec.slot, &value)?;
                let record = self.record_mut(node, &operation)?;
                if value.is_null() {
                    record.fields.remove(field);
                } else {
                    record.fields.insert(field.to_string(), value);
                }
            }
        }
        Ok(())
    }

    fn get_field(&self, node: NodeId, field: &str) -> Result<Value> {
        let operation = format!("get {}", field);
        let record = self.record(node, &operation)?;

        match field {
            NAME => Ok(Value::Text(record.name.clone())),
            CODE => Ok(record.code.clone().map(Value::Text).unwrap_or(Value::Null)),
            LOCATION => Ok(record
                .location
                .clone()
                .map(Value::Location)
                .unwrap_or(Value::Null)),
            _ => {
                if schema::field_spec(record.kind, field).is_none() {
                    return Err(Error::rejected(
                        operation,
                        node,
                        format!("{} has no field {}", record.kind, field),
                    ));
                }
                Ok(record.field(field).clone())
            }
        }
    }

    fn invoke(&mut self, node: NodeId, method: &str, args: Vec<Value>) -> Result<Value> {
        let kind = self.record(node, method)?.kind;
        let spec = schema::method_spec(kind, method)
            .ok_or_else(|| Error::rejected(method, node, format!("{} has no method {}", kind, method)))?;

        let [arg]: [Value; 1] = args.try_into().map_err(|args: Vec<Value>| {
            Error::rejected(method, node, format!("expected 1 argument, got {}", args.len()))
        })?;
        if arg.is_null() {
            return Err(Error::rejected(method, node, "argument is null"));
        }
        self.check_slot(method, node, spec.arg, &arg)?;

        match (spec.op, arg) {
            (MethodOp::FindByName, Value::Text(name)) => {
                let record = self.record(node, method)?;
                let found = record
                    .field(spec.field)
                    .as_nodes()
                    .unwrap_or(&[])
                    .iter()
                    .copied()
                    .find(|id| self.node(*id).is_some_and(|n| n.name == name));
                Ok(found.into())
            }
            (MethodOp::Append, Value::Node(target)) => {
                let record = self.record_mut(node, method)?;
                let entry = record
                    .fields
                    .entry(spec.field.to_string())
                    .or_insert_with(|| Value::Nodes(Vec::new()));
                if let Value::Nodes(list) = entry {
                    if !list.contains(&target) {
                        list.push(target);
                    }
                }
                Ok(Value::Null)
            }
            (MethodOp::Remove, Value::Node(target)) => {
                let record = self.record_mut(node, method)?;
                if let Some(Value::Nodes(list)) = record.fields.get_mut(spec.field) {
                    list.retain(|id| *id != target);
                }
                Ok(Value::Null)
            }
            (MethodOp::Replace, Value::Nodes(list)) => {
                let record = self.record_mut(node, method)?;
                record.fields.insert(spec.field.to_string(), Value::Nodes(list));
                Ok(Value::Null)
            }
            (MethodOp::Set, Value::Node(target)) => {
                let record = self.record_mut(node, method)?;
                record.fields.insert(spec.field.to_string(), Value::Node(target));
                Ok(Value::Null)
            }
            (op, arg) => Err(Error::rejected(
                method,
                node,
                format!("{:?} cannot take a {}", op, arg.shape()),
            )),
        }
    }

    fn kind_of(&self, node: NodeId) -> Option<NodeKind> {
        self.node(node).map(|n| n.kind)
    }
}

/// Statistics about a graph
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct GraphStats {
    pub units: usize,
    pub total_nodes: usize,
    pub declarations: usize,
    pub statements: usize,
    pub types: usize,
    pub total_edges: usize,
    pub ast_edges: usize,
    pub reference_edges: usize,
}

impl GraphStats {
    /// Accumulate another graph's statistics
    pub fn merge(&mut self, other: &GraphStats) {
        self.units += other.units;
        self.total_nodes += other.total_nodes;
        self.declarations += other.declarations;
        self.statements += other.statements;
        self.types += other.types;
        self.total_edges += other.total_edges;
        self.ast_edges += other.ast_edges;
        self.reference_edges += other.reference_edges;
    }
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Code Property Graph Statistics:")?;
        writeln!(f, "  Units: {}", self.units)?;
        writeln!(
            f,
            "  Nodes: {} (declarations: {}, statements: {}, types: {})",
            self.total_nodes, self.declarations, self.statements, self.types
        )?;
        writeln!(
            f,
            "  Edges: {} (ast: {}, reference: {})",
            self.total_edges, self.ast_edges, self.reference_edges
        )
    }
}
