//! Node records - the graph's closed vocabulary
//!
//! Nodes live in an engine-owned arena and are addressed by [`NodeId`]
//! handles. Edges between nodes are node-valued fields holding handles,
//! never references.

use crate::engine::{CODE, LOCATION, NAME};
use crate::position::PhysicalLocation;
use crate::session::Session;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Stable handle of a node inside one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Every kind of node the graph schema knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    // Declarations
    TranslationUnitDeclaration,
    NamespaceDeclaration,
    IncludeDeclaration,
    FunctionDeclaration,
    MethodDeclaration,
    RecordDeclaration,
    FieldDeclaration,
    VariableDeclaration,
    ParamVariableDeclaration,
    // Statements
    CompoundStatement,
    DeclarationStatement,
    ReturnStatement,
    SwitchStatement,
    CaseStatement,
    DefaultStatement,
    // Expressions
    Literal,
    DeclaredReferenceExpression,
    MemberExpression,
    CallExpression,
    UnknownExpression,
    // Types
    ObjectType,
    PointerType,
    ArrayType,
    MapType,
    FunctionPointerType,
    UnknownType,
}

impl NodeKind {
    /// Get the string representation of the node kind
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::TranslationUnitDeclaration => "TranslationUnitDeclaration",
            NodeKind::NamespaceDeclaration => "NamespaceDeclaration",
            NodeKind::IncludeDeclaration => "IncludeDeclaration",
            NodeKind::FunctionDeclaration => "FunctionDeclaration",
            NodeKind::MethodDeclaration => "MethodDeclaration",
            NodeKind::RecordDeclaration => "RecordDeclaration",
            NodeKind::FieldDeclaration => "FieldDeclaration",
            NodeKind::VariableDeclaration => "VariableDeclaration",
            NodeKind::ParamVariableDeclaration => "ParamVariableDeclaration",
            NodeKind::CompoundStatement => "CompoundStatement",
            NodeKind::DeclarationStatement => "DeclarationStatement",
            NodeKind::ReturnStatement => "ReturnStatement",
            NodeKind::SwitchStatement => "SwitchStatement",
            NodeKind::CaseStatement => "CaseStatement",
            NodeKind::DefaultStatement => "DefaultStatement",
            NodeKind::Literal => "Literal",
            NodeKind::DeclaredReferenceExpression => "DeclaredReferenceExpression",
            NodeKind::MemberExpression => "MemberExpression",
            NodeKind::CallExpression => "CallExpression",
            NodeKind::UnknownExpression => "UnknownExpression",
            NodeKind::ObjectType => "ObjectType",
            NodeKind::PointerType => "PointerType",
            NodeKind::ArrayType => "ArrayType",
            NodeKind::MapType => "MapType",
            NodeKind::FunctionPointerType => "FunctionPointerType",
            NodeKind::UnknownType => "UnknownType",
        }
    }

    /// Get all node kinds
    pub fn all() -> &'static [NodeKind] {
        &[
            NodeKind::TranslationUnitDeclaration,
            NodeKind::NamespaceDeclaration,
            NodeKind::IncludeDeclaration,
            NodeKind::FunctionDeclaration,
            NodeKind::MethodDeclaration,
            NodeKind::RecordDeclaration,
            NodeKind::FieldDeclaration,
            NodeKind::VariableDeclaration,
            NodeKind::ParamVariableDeclaration,
            NodeKind::CompoundStatement,
            NodeKind::DeclarationStatement,
            NodeKind::ReturnStatement,
            NodeKind::SwitchStatement,
            NodeKind::CaseStatement,
            NodeKind::DefaultStatement,
            NodeKind::Literal,
            NodeKind::DeclaredReferenceExpression,
            NodeKind::MemberExpression,
            NodeKind::CallExpression,
            NodeKind::UnknownExpression,
            NodeKind::ObjectType,
            NodeKind::PointerType,
            NodeKind::ArrayType,
            NodeKind::MapType,
            NodeKind::FunctionPointerType,
            NodeKind::UnknownType,
        ]
    }

    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::TranslationUnitDeclaration
                | NodeKind::NamespaceDeclaration
                | NodeKind::IncludeDeclaration
                | NodeKind::FunctionDeclaration
                | NodeKind::MethodDeclaration
                | NodeKind::RecordDeclaration
                | NodeKind::FieldDeclaration
                | NodeKind::VariableDeclaration
                | NodeKind::ParamVariableDeclaration
        )
    }

    /// Expressions are statements too, so they can appear in statement lists
    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::CompoundStatement
                | NodeKind::DeclarationStatement
                | NodeKind::ReturnStatement
                | NodeKind::SwitchStatement
                | NodeKind::CaseStatement
                | NodeKind::DefaultStatement
        ) || self.is_expression()
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::Literal
                | NodeKind::DeclaredReferenceExpression
                | NodeKind::MemberExpression
                | NodeKind::CallExpression
                | NodeKind::UnknownExpression
        )
    }

    pub fn is_type(&self) -> bool {
        matches!(
            self,
            NodeKind::ObjectType
                | NodeKind::PointerType
                | NodeKind::ArrayType
                | NodeKind::MapType
                | NodeKind::FunctionPointerType
                | NodeKind::UnknownType
        )
    }

    /// Whether the kind is a function (methods refine functions)
    pub fn is_function(&self) -> bool {
        matches!(self, NodeKind::FunctionDeclaration | NodeKind::MethodDeclaration)
    }

    /// Whether the kind is a variable (parameters refine variables)
    pub fn is_variable(&self) -> bool {
        matches!(self, NodeKind::VariableDeclaration | NodeKind::ParamVariableDeclaration)
    }
}

impl FromStr for NodeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        NodeKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::Parse(format!("Unknown node kind: {}", s)))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A field value passed across the engine boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// Absent value; also the nil-sentinel returned by lookups
    Null,
    Text(String),
    Node(NodeId),
    Nodes(Vec<NodeId>),
    Location(PhysicalLocation),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// Node list; `Null` reads as an empty list
    pub fn as_nodes(&self) -> Option<&[NodeId]> {
        match self {
            Value::Nodes(ids) => Some(ids),
            Value::Null => Some(&[]),
            _ => None,
        }
    }

    pub fn as_location(&self) -> Option<&PhysicalLocation> {
        match self {
            Value::Location(l) => Some(l),
            _ => None,
        }
    }

    /// Short description used in rejection messages
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Node(_) => "node",
            Value::Nodes(_) => "node list",
            Value::Location(_) => "location",
        }
    }
}

impl From<PhysicalLocation> for Value {
    fn from(location: PhysicalLocation) -> Self {
        Value::Location(location)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::Node(id)
    }
}

impl From<Vec<NodeId>> for Value {
    fn from(ids: Vec<NodeId>) -> Self {
        Value::Nodes(ids)
    }
}

impl From<Option<NodeId>> for Value {
    fn from(id: Option<NodeId>) -> Self {
        id.map(Value::Node).unwrap_or(Value::Null)
    }
}

/// A node as stored by an engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Name, unique only within its declaring scope; empty until set
    pub name: String,
    /// Verbatim source text
    pub code: Option<String>,
    pub location: Option<PhysicalLocation>,
    /// Kind-specific fields, keyed by schema field name
    pub fields: BTreeMap<String, Value>,
}

impl NodeRecord {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            name: String::new(),
            code: None,
            location: None,
            fields: BTreeMap::new(),
        }
    }

    /// Read a kind-specific field, `Null` if unset
    pub fn field(&self, name: &str) -> &Value {
        self.fields.get(name).unwrap_or(&Value::Null)
    }
}

/// Typed handle to a node of a known kind.
///
/// Handles only ever wrap ids whose kind they accept, so each handle type
/// exposes exactly the builder operations that are valid for its kind.
pub trait Node: Copy {
    fn id(&self) -> NodeId;

    /// Whether a node of `kind` can sit behind this handle type
    fn accepts(kind: NodeKind) -> bool;

    #[doc(hidden)]
    fn wrap(id: NodeId) -> Self;

    /// Re-type a handle read back from the engine; `None` is the nil-sentinel
    fn from_node(s: &Session<'_>, id: NodeId) -> Option<Self> {
        s.kind_of(id).filter(|k| Self::accepts(*k)).map(|_| Self::wrap(id))
    }

    /// Nil-sentinel check: true if the handle does not refer to a live node
    fn is_nil(&self, s: &Session<'_>) -> bool {
        !s.engine().contains(self.id())
    }

    fn kind(&self, s: &Session<'_>) -> Option<NodeKind> {
        s.kind_of(self.id())
    }

    fn name(&self, s: &Session<'_>) -> Result<String> {
        Ok(s.get(self.id(), NAME)?.as_text().unwrap_or_default().to_string())
    }

    fn code(&self, s: &Session<'_>) -> Result<Option<String>> {
        Ok(s.get(self.id(), CODE)?.as_text().map(str::to_string))
    }

    fn location(&self, s: &Session<'_>) -> Result<Option<PhysicalLocation>> {
        Ok(s.get(self.id(), LOCATION)?.as_location().cloned())
    }
}

/// Define a handle newtype over one or more node kinds
macro_rules! handle {
    ($(#[$meta:meta])* $name:ident => $($kind:ident)|+) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub(crate) $crate::node::NodeId);

        impl $crate::node::Node for $name {
            fn id(&self) -> $crate::node::NodeId {
                self.0
            }

            fn accepts(kind: $crate::node::NodeKind) -> bool {
                matches!(kind, $($crate::node::NodeKind::$kind)|+)
            }

            fn wrap(id: $crate::node::NodeId) -> Self {
                Self(id)
            }
        }
    };
}

pub(crate) use handle;

/// Read a single node-valued field as a typed handle
pub(crate) fn read_one<T: Node>(s: &Session<'_>, node: NodeId, field: &str) -> Result<Option<T>> {
    Ok(s.get(node, field)?
        .as_node()
        .and_then(|id| T::from_node(s, id)))
}

/// Read a node-list field as typed handles, skipping entries of other kinds
pub(crate) fn read_many<T: Node>(s: &Session<'_>, node: NodeId, field: &str) -> Result<Vec<T>> {
    Ok(s.get(node, field)?
        .as_nodes()
        .unwrap_or(&[])
        .iter()
        .filter_map(|id| T::from_node(s, *id))
        .collect())
}
