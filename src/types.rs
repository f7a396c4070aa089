//! Type binding - language type descriptors to graph Type nodes
//!
//! Frontends describe types as [`TypeDescriptor`]s parsed from source text.
//! A [`TypeBinder`] turns a descriptor into a [`Type`] node; the default
//! [`CachingTypeBinder`] keeps one node per distinct descriptor per session,
//! so every `int` in a unit points at the same `ObjectType`.

use crate::engine::NAME;
use crate::node::{handle, read_one, Node, NodeId, NodeKind};
use crate::session::Session;
use crate::Result;
use std::collections::HashMap;
use std::fmt;

handle!(
    /// Handle to any Type node
    Type => ObjectType | PointerType | ArrayType | MapType | FunctionPointerType | UnknownType
);

impl Type {
    /// Element type of a pointer, slice, array or map
    pub fn element_type(&self, s: &Session<'_>) -> Result<Option<Type>> {
        match s.kind_of(self.id()) {
            Some(NodeKind::PointerType | NodeKind::ArrayType | NodeKind::MapType) => {
                read_one(s, self.id(), "elementType")
            }
            _ => Ok(None),
        }
    }

    pub fn key_type(&self, s: &Session<'_>) -> Result<Option<Type>> {
        match s.kind_of(self.id()) {
            Some(NodeKind::MapType) => read_one(s, self.id(), "keyType"),
            _ => Ok(None),
        }
    }
}

/// Direction a channel type allows values to flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Receive,
}

/// A source-level type, independent of any graph
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// A plain or builtin type name (`int`, `Point`)
    Named(String),
    /// A type from another package (`pkg.Name`)
    Qualified { package: String, name: String },
    Pointer(Box<TypeDescriptor>),
    Slice(Box<TypeDescriptor>),
    Array { len: String, element: Box<TypeDescriptor> },
    Map { key: Box<TypeDescriptor>, value: Box<TypeDescriptor> },
    /// Function signature, kept as written
    Function(String),
    Channel { dir: ChanDir, element: Box<TypeDescriptor> },
    /// Anonymous struct literal type, kept as written
    Struct(String),
    /// Anonymous interface literal type, kept as written
    Interface(String),
    Unknown,
}

impl TypeDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        TypeDescriptor::Named(name.into())
    }

    /// Parse Go type syntax
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return TypeDescriptor::Unknown;
        }

        if let Some(rest) = text.strip_prefix('*') {
            return TypeDescriptor::Pointer(Box::new(Self::parse(rest)));
        }
        if let Some(rest) = text.strip_prefix("[]") {
            return TypeDescriptor::Slice(Box::new(Self::parse(rest)));
        }
        if let Some(rest) = text.strip_prefix("...") {
            return TypeDescriptor::Slice(Box::new(Self::parse(rest)));
        }
        if text.starts_with('[') {
            if let Some(close) = matching_bracket(text, 0) {
                return TypeDescriptor::Array {
                    len: text[1..close].trim().to_string(),
                    element: Box::new(Self::parse(&text[close + 1..])),
                };
            }
            return TypeDescriptor::Unknown;
        }
        if let Some(rest) = text.strip_prefix("map") {
            let rest = rest.trim_start();
            if rest.starts_with('[') {
                if let Some(close) = matching_bracket(rest, 0) {
                    return TypeDescriptor::Map {
                        key: Box::new(Self::parse(&rest[1..close])),
                        value: Box::new(Self::parse(&rest[close + 1..])),
                    };
                }
            }
        }
        for (prefix, dir) in [("<-chan", ChanDir::Receive), ("chan<-", ChanDir::Send), ("chan", ChanDir::Both)] {
            if let Some(rest) = keyword(text, prefix) {
                return TypeDescriptor::Channel {
                    dir,
                    element: Box::new(Self::parse(rest)),
                };
            }
        }
        if keyword(text, "func").is_some() {
            return TypeDescriptor::Function(collapse_whitespace(text));
        }
        if keyword(text, "struct").is_some() {
            return TypeDescriptor::Struct(collapse_whitespace(text));
        }
        if keyword(text, "interface").is_some() {
            return TypeDescriptor::Interface(collapse_whitespace(text));
        }
        if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
            return Self::parse(inner);
        }

        // Generic instantiations keep their arguments in the name
        let base = text.split('[').next().unwrap_or(text);
        match base.split_once('.') {
            Some((package, _)) if is_identifier(package) => TypeDescriptor::Qualified {
                package: package.to_string(),
                name: text[package.len() + 1..].to_string(),
            },
            _ if is_identifier(base) => TypeDescriptor::Named(text.to_string()),
            _ => TypeDescriptor::Unknown,
        }
    }

    /// Graph node kind a descriptor binds to
    pub fn node_kind(&self) -> NodeKind {
        match self {
            TypeDescriptor::Named(_)
            | TypeDescriptor::Qualified { .. }
            | TypeDescriptor::Channel { .. }
            | TypeDescriptor::Struct(_)
            | TypeDescriptor::Interface(_) => NodeKind::ObjectType,
            TypeDescriptor::Pointer(_) => NodeKind::PointerType,
            TypeDescriptor::Slice(_) | TypeDescriptor::Array { .. } => NodeKind::ArrayType,
            TypeDescriptor::Map { .. } => NodeKind::MapType,
            TypeDescriptor::Function(_) => NodeKind::FunctionPointerType,
            TypeDescriptor::Unknown => NodeKind::UnknownType,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TypeDescriptor::Unknown)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Named(name) => write!(f, "{}", name),
            TypeDescriptor::Qualified { package, name } => write!(f, "{}.{}", package, name),
            TypeDescriptor::Pointer(inner) => write!(f, "*{}", inner),
            TypeDescriptor::Slice(inner) => write!(f, "[]{}", inner),
            TypeDescriptor::Array { len, element } => write!(f, "[{}]{}", len, element),
            TypeDescriptor::Map { key, value } => write!(f, "map[{}]{}", key, value),
            TypeDescriptor::Channel { dir, element } => match dir {
                ChanDir::Both => write!(f, "chan {}", element),
                ChanDir::Send => write!(f, "chan<- {}", element),
                ChanDir::Receive => write!(f, "<-chan {}", element),
            },
            TypeDescriptor::Function(text)
            | TypeDescriptor::Struct(text)
            | TypeDescriptor::Interface(text) => write!(f, "{}", text),
            TypeDescriptor::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// The text after a leading type keyword, when the keyword stands alone
fn keyword<'t>(text: &'t str, word: &str) -> Option<&'t str> {
    text.strip_prefix(word)
        .filter(|rest| rest.starts_with(|c: char| c.is_whitespace() || c == '(' || c == '{'))
}

fn matching_bracket(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves type descriptors into graph Type nodes
pub trait TypeBinder: Send + Sync {
    fn bind(&self, s: &mut Session<'_>, descriptor: &TypeDescriptor) -> Result<Type>;
}

/// Per-session memo of bound types, keyed by rendered descriptor
#[derive(Debug, Default)]
pub struct TypeCache {
    bound: HashMap<String, NodeId>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.bound.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    fn insert(&mut self, name: String, id: NodeId) {
        self.bound.insert(name, id);
    }
}

/// Default binder backed by the session's [`TypeCache`]
#[derive(Debug, Default, Clone, Copy)]
pub struct CachingTypeBinder;

impl TypeBinder for CachingTypeBinder {
    fn bind(&self, s: &mut Session<'_>, descriptor: &TypeDescriptor) -> Result<Type> {
        let name = descriptor.to_string();
        if let Some(id) = s.types.get(&name) {
            return Ok(Type(id));
        }

        // Children first: both endpoints must exist before the edge
        let element = match descriptor {
            TypeDescriptor::Pointer(inner) | TypeDescriptor::Slice(inner) => {
                Some(self.bind(s, inner)?)
            }
            TypeDescriptor::Array { element, .. } => Some(self.bind(s, element)?),
            TypeDescriptor::Map { value, .. } => Some(self.bind(s, value)?),
            _ => None,
        };
        let key = match descriptor {
            TypeDescriptor::Map { key, .. } => Some(self.bind(s, key)?),
            _ => None,
        };

        let id = s.create(descriptor.node_kind())?;
        s.set(id, NAME, name.as_str().into())?;
        if let Some(element) = element {
            s.set(id, "elementType", element.id().into())?;
        }
        if let Some(key) = key {
            s.set(id, "keyType", key.id().into())?;
        }

        tracing::debug!("bound type {} to {}", name, id);
        s.types.insert(name, id);
        Ok(Type(id))
    }
}

/// Capability of declarations that carry a single type
pub trait HasType: Node {
    /// Overwrite the type edge
    fn set_type(&self, s: &mut Session<'_>, ty: Type) -> Result<()> {
        s.set(self.id(), "type", ty.id().into())
    }

    fn type_of(&self, s: &Session<'_>) -> Result<Option<Type>> {
        read_one(s, self.id(), "type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryGraph;
    use crate::position::FileSet;
    use crate::session::BuildOptions;

    #[test]
    fn test_parse_go_types() {
        assert_eq!(TypeDescriptor::parse("int"), TypeDescriptor::named("int"));
        assert_eq!(
            TypeDescriptor::parse("*Point"),
            TypeDescriptor::Pointer(Box::new(TypeDescriptor::named("Point")))
        );
        assert_eq!(
            TypeDescriptor::parse("fmt.Stringer"),
            TypeDescriptor::Qualified {
                package: "fmt".to_string(),
                name: "Stringer".to_string()
            }
        );
        assert_eq!(TypeDescriptor::parse("map[string][]int").to_string(), "map[string][]int");
        assert_eq!(TypeDescriptor::parse("[4]byte").to_string(), "[4]byte");
        assert_eq!(TypeDescriptor::parse("chan  int").to_string(), "chan int");
        assert_eq!(
            TypeDescriptor::parse("func(int)  error").node_kind(),
            NodeKind::FunctionPointerType
        );
        assert!(TypeDescriptor::parse("").is_unknown());
        assert!(TypeDescriptor::parse("[bad").is_unknown());
    }

    #[test]
    fn test_keyword_prefixed_names_stay_named() {
        for name in ["funcMap", "structField", "interfaceList", "channel", "mapper"] {
            assert_eq!(TypeDescriptor::parse(name), TypeDescriptor::named(name));
        }
        assert_eq!(TypeDescriptor::parse("funcMap").node_kind(), NodeKind::ObjectType);
        assert!(matches!(TypeDescriptor::parse("struct{ x int }"), TypeDescriptor::Struct(_)));
        assert!(matches!(TypeDescriptor::parse("interface{}"), TypeDescriptor::Interface(_)));
        assert!(matches!(TypeDescriptor::parse("func()"), TypeDescriptor::Function(_)));
    }

    #[test]
    fn test_channel_direction_is_kept() {
        assert_eq!(TypeDescriptor::parse("<-chan int").to_string(), "<-chan int");
        assert_eq!(TypeDescriptor::parse("chan<- int").to_string(), "chan<- int");
        assert_eq!(TypeDescriptor::parse("chan int").to_string(), "chan int");
        assert_eq!(
            TypeDescriptor::parse("chan<- string"),
            TypeDescriptor::Channel {
                dir: ChanDir::Send,
                element: Box::new(TypeDescriptor::named("string")),
            }
        );

        let fset = FileSet::new();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());
        let recv = CachingTypeBinder.bind(&mut s, &TypeDescriptor::parse("<-chan int")).unwrap();
        let send = CachingTypeBinder.bind(&mut s, &TypeDescriptor::parse("chan<- int")).unwrap();
        let both = CachingTypeBinder.bind(&mut s, &TypeDescriptor::parse("chan int")).unwrap();
        assert_ne!(recv, send);
        assert_ne!(recv, both);
        assert_ne!(send, both);
    }

    #[test]
    fn test_binding_is_cached_per_descriptor() {
        let fset = FileSet::new();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());
        let binder = CachingTypeBinder;

        let a = binder.bind(&mut s, &TypeDescriptor::parse("int")).unwrap();
        let b = binder.bind(&mut s, &TypeDescriptor::parse("int")).unwrap();
        let p = binder.bind(&mut s, &TypeDescriptor::parse("*int")).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, p);
        assert_eq!(p.element_type(&s).unwrap(), Some(a));
        assert_eq!(p.name(&s).unwrap(), "*int");
        assert_eq!(s.types.len(), 2);
    }

    #[test]
    fn test_map_binds_key_and_value() {
        let fset = FileSet::new();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let map = CachingTypeBinder
            .bind(&mut s, &TypeDescriptor::parse("map[string]float64"))
            .unwrap();

        assert_eq!(map.kind(&s), Some(NodeKind::MapType));
        let key = map.key_type(&s).unwrap().unwrap();
        let value = map.element_type(&s).unwrap().unwrap();
        assert_eq!(key.name(&s).unwrap(), "string");
        assert_eq!(value.name(&s).unwrap(), "float64");
    }
}
