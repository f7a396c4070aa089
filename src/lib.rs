//! # cpgraph - Code Property Graph construction
//!
//! Maps a language-specific syntax tree, node by node, onto a uniform
//! cross-language graph of declarations, statements and types.
//!
//! cpgraph provides:
//! - A position resolver that turns AST offsets into file/line/column spans
//! - A node factory and typed declaration builders over a pluggable graph engine
//! - A scope/unit composer linking declarations into their containers
//! - A tree-sitter based Go frontend
//! - A two-phase, concurrent translation driver with cross-unit linking

pub mod position;
pub mod node;
pub mod edge;
pub mod schema;
pub mod engine;
pub mod session;
pub mod factory;
pub mod declarations;
pub mod statements;
pub mod types;
pub mod scope;
pub mod frontend;
pub mod translator;
pub mod linker;
pub mod output;
pub mod config;
pub mod ignore;
pub mod ui;

// Re-exports for convenient access
pub use position::{AstNode, FileSet, PhysicalLocation, Pos, Region};
pub use node::{NodeId, NodeKind, Value};
pub use edge::{Edge, EdgeKind};
pub use engine::{GraphEngine, MemoryGraph};
pub use session::{BuildOptions, Session, SuperClassPolicy};
pub use translator::{TranslationManager, TranslationResult};

/// Result type alias for cpgraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for graph construction
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("Graph engine rejected {operation} on {node}: {reason}")]
    EngineRejected {
        operation: String,
        node: String,
        reason: String,
    },

    #[error("Cannot rename {node} from '{from}' to '{to}' after it was linked into a scope")]
    RenameAfterLink {
        node: NodeId,
        from: String,
        to: String,
    },

    #[error("Method {0} has no receiver")]
    MissingReceiver(NodeId),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frontend error: {0}")]
    Frontend(String),

    #[error("Translation of {file} stopped at {line}:{column}: {source}")]
    Translation {
        file: String,
        line: u32,
        column: u32,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Build an `EngineRejected` error
    pub fn rejected(
        operation: impl Into<String>,
        node: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Error::EngineRejected {
            operation: operation.into(),
            node: node.to_string(),
            reason: reason.into(),
        }
    }

    /// The innermost error, skipping translation context
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Translation { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
