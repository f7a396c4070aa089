//! Edge types - relationships between graph nodes
//!
//! Every edge is a node-valued schema field. The edge kind is named after
//! the field that holds it, so `FunctionDeclaration.parameters` yields
//! `Parameters` edges from the function to each parameter, in order.
//!
//! Edges are either:
//! - **AST edges**: structural containment (declarations, bodies, arguments)
//! - **Reference edges**: links to nodes owned elsewhere (types, call targets)

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// All relationships the schema can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    /// Unit/namespace/declaration statement owns a declaration
    Declarations,
    /// Translation unit owns an include
    Includes,
    /// Function owns a parameter
    Parameters,
    /// Function returns a type (ordered, multi-valued)
    ReturnTypes,
    /// Declaration has a type
    Type,
    /// Function or switch owns its body statement
    Body,
    /// Method owns its bound-instance variable
    Receiver,
    /// Record owns a method
    Methods,
    /// Record owns a field
    Fields,
    /// Record extends or implements a type
    SuperClasses,
    /// Variable owns its initializer expression
    Initializer,
    /// Case arm owns its test expression
    CaseExpression,
    /// Compound statement owns a statement
    Statements,
    /// Switch owns its tested expression
    Selector,
    /// Return owns its value
    ReturnValue,
    /// Call owns an argument
    Arguments,
    /// Call owns its callee expression
    Callee,
    /// Member access owns its base expression
    Base,
    /// Call invokes a function
    Invokes,
    /// Reference names a declaration
    RefersTo,
    /// Composite type wraps an element type
    ElementType,
    /// Map type keys
    KeyType,
}

impl EdgeKind {
    /// The schema field name carrying this edge
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Declarations => "declarations",
            EdgeKind::Includes => "includes",
            EdgeKind::Parameters => "parameters",
            EdgeKind::ReturnTypes => "returnTypes",
            EdgeKind::Type => "type",
            EdgeKind::Body => "body",
            EdgeKind::Receiver => "receiver",
            EdgeKind::Methods => "methods",
            EdgeKind::Fields => "fields",
            EdgeKind::SuperClasses => "superClasses",
            EdgeKind::Initializer => "initializer",
            EdgeKind::CaseExpression => "caseExpression",
            EdgeKind::Statements => "statements",
            EdgeKind::Selector => "selector",
            EdgeKind::ReturnValue => "returnValue",
            EdgeKind::Arguments => "arguments",
            EdgeKind::Callee => "callee",
            EdgeKind::Base => "base",
            EdgeKind::Invokes => "invokes",
            EdgeKind::RefersTo => "refersTo",
            EdgeKind::ElementType => "elementType",
            EdgeKind::KeyType => "keyType",
        }
    }

    /// Get all edge kinds
    pub fn all() -> &'static [EdgeKind] {
        &[
            EdgeKind::Declarations,
            EdgeKind::Includes,
            EdgeKind::Parameters,
            EdgeKind::ReturnTypes,
            EdgeKind::Type,
            EdgeKind::Body,
            EdgeKind::Receiver,
            EdgeKind::Methods,
            EdgeKind::Fields,
            EdgeKind::SuperClasses,
            EdgeKind::Initializer,
            EdgeKind::CaseExpression,
            EdgeKind::Statements,
            EdgeKind::Selector,
            EdgeKind::ReturnValue,
            EdgeKind::Arguments,
            EdgeKind::Callee,
            EdgeKind::Base,
            EdgeKind::Invokes,
            EdgeKind::RefersTo,
            EdgeKind::ElementType,
            EdgeKind::KeyType,
        ]
    }

    /// Check if this edge is structural containment rather than a reference
    pub fn is_ast(&self) -> bool {
        !matches!(
            self,
            EdgeKind::Type
                | EdgeKind::ReturnTypes
                | EdgeKind::SuperClasses
                | EdgeKind::Invokes
                | EdgeKind::RefersTo
                | EdgeKind::ElementType
                | EdgeKind::KeyType
        )
    }

    /// Look up the edge kind stored in a schema field
    pub fn from_field(field: &str) -> Option<EdgeKind> {
        EdgeKind::all().iter().copied().find(|k| k.as_str() == field)
    }
}

impl FromStr for EdgeKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeKind::from_field(s)
            .ok_or_else(|| crate::Error::Parse(format!("Unknown edge kind: {}", s)))
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An edge in the code property graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source node
    pub from: NodeId,
    /// Target node
    pub to: NodeId,
    /// Type of relationship
    pub kind: EdgeKind,
    /// Position among the source's edges of this kind (0 for single-valued fields)
    pub index: usize,
}

impl Edge {
    pub fn new(from: NodeId, to: NodeId, kind: EdgeKind) -> Self {
        Self {
            from,
            to,
            kind,
            index: 0,
        }
    }

    /// Create an edge at a position in an ordered field
    pub fn at(from: NodeId, to: NodeId, kind: EdgeKind, index: usize) -> Self {
        Self {
            from,
            to,
            kind,
            index,
        }
    }
}
