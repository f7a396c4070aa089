//! Declaration handles and their builders
//!
//! Each declaration kind has its own handle type; a handle only offers the
//! builder operations valid for its kind. Shared capabilities are traits:
//! [`HasName`] for every declaration, [`HasType`] for typed storage and
//! functions, [`FunctionLike`] for functions and methods.

use crate::engine::NAME;
use crate::node::{handle, read_many, read_one, Node, NodeId, NodeKind, Value};
use crate::session::{Session, SuperClassPolicy};
use crate::statements::{Expression, Statement};
use crate::types::{HasType, Type};
use crate::{Error, Result};

handle!(
    /// Root container of one source file
    TranslationUnitDeclaration => TranslationUnitDeclaration
);
handle!(NamespaceDeclaration => NamespaceDeclaration);
handle!(
    /// Reference to another unit by textual name
    IncludeDeclaration => IncludeDeclaration
);
handle!(
    /// A function; also accepts methods, which refine functions
    FunctionDeclaration => FunctionDeclaration | MethodDeclaration
);
handle!(MethodDeclaration => MethodDeclaration);
handle!(RecordDeclaration => RecordDeclaration);
handle!(FieldDeclaration => FieldDeclaration);
handle!(
    /// A variable; also accepts parameters
    VariableDeclaration => VariableDeclaration | ParamVariableDeclaration
);
handle!(ParamVariableDeclaration => ParamVariableDeclaration);

/// Capability of nodes whose name builders may set
pub trait HasName: Node {
    /// Set the node's name.
    ///
    /// Setting the current name again is a no-op. Once the node is linked
    /// into a scope its name is frozen and a different name is refused.
    fn set_name(&self, s: &mut Session<'_>, name: &str) -> Result<()> {
        let current = self.name(s)?;
        if current == name {
            return Ok(());
        }
        if s.scopes().is_linked(self.id()) {
            return Err(Error::RenameAfterLink {
                node: self.id(),
                from: current,
                to: name.to_string(),
            });
        }
        s.set(self.id(), NAME, name.into())
    }
}

impl HasName for TranslationUnitDeclaration {}
impl HasName for NamespaceDeclaration {}
impl HasName for IncludeDeclaration {}
impl HasName for FunctionDeclaration {}
impl HasName for MethodDeclaration {}
impl HasName for RecordDeclaration {}
impl HasName for FieldDeclaration {}
impl HasName for VariableDeclaration {}
impl HasName for ParamVariableDeclaration {}

impl HasType for FunctionDeclaration {}
impl HasType for MethodDeclaration {}
impl HasType for FieldDeclaration {}
impl HasType for VariableDeclaration {}
impl HasType for ParamVariableDeclaration {}

/// Builders shared by functions and methods
pub trait FunctionLike: Node {
    /// Append a parameter; order mirrors the source
    fn add_parameter(&self, s: &mut Session<'_>, param: ParamVariableDeclaration) -> Result<()> {
        s.invoke(self.id(), "addParameter", param.id()).map(drop)
    }

    fn parameters(&self, s: &Session<'_>) -> Result<Vec<ParamVariableDeclaration>> {
        read_many(s, self.id(), "parameters")
    }

    /// Replace the whole return-type list
    fn set_return_types(&self, s: &mut Session<'_>, types: &[Type]) -> Result<()> {
        let ids: Vec<NodeId> = types.iter().map(|t| t.id()).collect();
        s.invoke(self.id(), "setReturnTypes", ids).map(drop)
    }

    fn return_types(&self, s: &Session<'_>) -> Result<Vec<Type>> {
        read_many(s, self.id(), "returnTypes")
    }

    /// Attach the body, replacing any previous one
    fn set_body(&self, s: &mut Session<'_>, body: impl Into<Statement>) -> Result<()> {
        s.invoke(self.id(), "setBody", body.into().id()).map(drop)
    }

    fn body(&self, s: &Session<'_>) -> Result<Option<Statement>> {
        read_one(s, self.id(), "body")
    }
}

impl FunctionLike for FunctionDeclaration {}
impl FunctionLike for MethodDeclaration {}

impl From<MethodDeclaration> for FunctionDeclaration {
    fn from(method: MethodDeclaration) -> Self {
        FunctionDeclaration(method.0)
    }
}

impl From<ParamVariableDeclaration> for VariableDeclaration {
    fn from(param: ParamVariableDeclaration) -> Self {
        VariableDeclaration(param.0)
    }
}

impl FunctionDeclaration {
    /// Narrow to a method handle, if this function is one
    pub fn as_method(&self, s: &Session<'_>) -> Option<MethodDeclaration> {
        MethodDeclaration::from_node(s, self.0)
    }
}

impl MethodDeclaration {
    /// Set the bound-instance variable, replacing any previous receiver
    pub fn set_receiver(&self, s: &mut Session<'_>, receiver: impl Into<VariableDeclaration>) -> Result<()> {
        s.set(self.0, "receiver", receiver.into().id().into())
    }

    pub fn receiver(&self, s: &Session<'_>) -> Result<Option<VariableDeclaration>> {
        read_one(s, self.0, "receiver")
    }
}

impl RecordDeclaration {
    /// Tag the record as struct, interface, class...
    pub fn set_kind(&self, s: &mut Session<'_>, kind: &str) -> Result<()> {
        s.set(self.0, "kind", kind.into())
    }

    pub fn record_kind(&self, s: &Session<'_>) -> Result<Option<String>> {
        Ok(s.get(self.0, "kind")?.as_text().map(str::to_string))
    }

    /// Append a method. The method must already have its receiver.
    pub fn add_method(&self, s: &mut Session<'_>, method: MethodDeclaration) -> Result<()> {
        if method.receiver(s)?.is_none() {
            return Err(Error::MissingReceiver(method.id()));
        }
        s.invoke(self.0, "addMethod", method.id()).map(drop)
    }

    pub fn methods(&self, s: &Session<'_>) -> Result<Vec<MethodDeclaration>> {
        read_many(s, self.0, "methods")
    }

    pub fn add_field(&self, s: &mut Session<'_>, field: FieldDeclaration) -> Result<()> {
        s.invoke(self.0, "addField", field.id()).map(drop)
    }

    pub fn fields(&self, s: &Session<'_>) -> Result<Vec<FieldDeclaration>> {
        read_many(s, self.0, "fields")
    }

    /// Add a supertype or implemented interface.
    ///
    /// An engine refusal is returned or logged depending on the session's
    /// [`SuperClassPolicy`].
    pub fn add_super_class(&self, s: &mut Session<'_>, ty: Type) -> Result<()> {
        match s.invoke(self.0, "addSuperClass", ty.id()) {
            Ok(_) => Ok(()),
            Err(err) => match s.options().super_class_policy {
                SuperClassPolicy::Propagate => Err(err),
                SuperClassPolicy::Ignore => {
                    tracing::warn!("Ignoring superclass {} of record {}: {}", ty.id(), self.0, err);
                    Ok(())
                }
            },
        }
    }

    pub fn super_classes(&self, s: &Session<'_>) -> Result<Vec<Type>> {
        read_many(s, self.0, "superClasses")
    }
}

impl VariableDeclaration {
    /// Attach the initializer, replacing any previous one
    pub fn set_initializer(&self, s: &mut Session<'_>, init: impl Into<Expression>) -> Result<()> {
        s.invoke(self.0, "setInitializer", init.into().id()).map(drop)
    }

    pub fn initializer(&self, s: &Session<'_>) -> Result<Option<Expression>> {
        match s.kind_of(self.0) {
            Some(NodeKind::VariableDeclaration) => read_one(s, self.0, "initializer"),
            _ => Ok(None),
        }
    }
}

impl IncludeDeclaration {
    pub fn set_filename(&self, s: &mut Session<'_>, filename: &str) -> Result<()> {
        s.set(self.0, "filename", filename.into())
    }

    pub fn filename(&self, s: &Session<'_>) -> Result<Option<String>> {
        Ok(s.get(self.0, "filename")?.as_text().map(str::to_string))
    }
}

impl TranslationUnitDeclaration {
    pub fn add_declaration(&self, s: &mut Session<'_>, decl: impl Into<Declaration>) -> Result<()> {
        s.invoke(self.0, "addDeclaration", decl.into().id()).map(drop)
    }

    pub fn declarations(&self, s: &Session<'_>) -> Result<Vec<Declaration>> {
        declarations_of(s, self.0)
    }

    pub fn add_include(&self, s: &mut Session<'_>, include: IncludeDeclaration) -> Result<()> {
        s.invoke(self.0, "addInclude", include.id()).map(drop)
    }

    pub fn includes(&self, s: &Session<'_>) -> Result<Vec<IncludeDeclaration>> {
        read_many(s, self.0, "includes")
    }

    /// Find one of the unit's own includes by name. `None` when absent.
    pub fn include_by_name(&self, s: &mut Session<'_>, name: &str) -> Result<Option<IncludeDeclaration>> {
        let found = s.invoke(self.0, "getIncludeByName", name)?;
        Ok(found.as_node().and_then(|id| IncludeDeclaration::from_node(s, id)))
    }
}

impl NamespaceDeclaration {
    pub fn add_declaration(&self, s: &mut Session<'_>, decl: impl Into<Declaration>) -> Result<()> {
        s.invoke(self.0, "addDeclaration", decl.into().id()).map(drop)
    }

    pub fn declarations(&self, s: &Session<'_>) -> Result<Vec<Declaration>> {
        declarations_of(s, self.0)
    }
}

fn declarations_of(s: &Session<'_>, container: NodeId) -> Result<Vec<Declaration>> {
    Ok(s.get(container, "declarations")?
        .as_nodes()
        .unwrap_or(&[])
        .iter()
        .filter_map(|id| Declaration::from_node(s, *id))
        .collect())
}

/// Any declaration, as a closed set of variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Declaration {
    TranslationUnit(TranslationUnitDeclaration),
    Namespace(NamespaceDeclaration),
    Include(IncludeDeclaration),
    Function(FunctionDeclaration),
    Method(MethodDeclaration),
    Record(RecordDeclaration),
    Field(FieldDeclaration),
    Variable(VariableDeclaration),
    ParamVariable(ParamVariableDeclaration),
}

impl Declaration {
    /// Re-type a node id read from the engine. `None` for non-declarations.
    pub fn from_node(s: &Session<'_>, id: NodeId) -> Option<Self> {
        let decl = match s.kind_of(id)? {
            NodeKind::TranslationUnitDeclaration => Declaration::TranslationUnit(TranslationUnitDeclaration(id)),
            NodeKind::NamespaceDeclaration => Declaration::Namespace(NamespaceDeclaration(id)),
            NodeKind::IncludeDeclaration => Declaration::Include(IncludeDeclaration(id)),
            NodeKind::FunctionDeclaration => Declaration::Function(FunctionDeclaration(id)),
            NodeKind::MethodDeclaration => Declaration::Method(MethodDeclaration(id)),
            NodeKind::RecordDeclaration => Declaration::Record(RecordDeclaration(id)),
            NodeKind::FieldDeclaration => Declaration::Field(FieldDeclaration(id)),
            NodeKind::VariableDeclaration => Declaration::Variable(VariableDeclaration(id)),
            NodeKind::ParamVariableDeclaration => Declaration::ParamVariable(ParamVariableDeclaration(id)),
            _ => return None,
        };
        Some(decl)
    }

    pub fn id(&self) -> NodeId {
        match self {
            Declaration::TranslationUnit(d) => d.0,
            Declaration::Namespace(d) => d.0,
            Declaration::Include(d) => d.0,
            Declaration::Function(d) => d.0,
            Declaration::Method(d) => d.0,
            Declaration::Record(d) => d.0,
            Declaration::Field(d) => d.0,
            Declaration::Variable(d) => d.0,
            Declaration::ParamVariable(d) => d.0,
        }
    }

    /// Kind as stored in the engine
    pub fn kind(&self, s: &Session<'_>) -> Option<NodeKind> {
        s.kind_of(self.id())
    }

    pub fn name(&self, s: &Session<'_>) -> Result<String> {
        Ok(s.get(self.id(), NAME)?.as_text().unwrap_or_default().to_string())
    }

    pub fn is_nil(&self, s: &Session<'_>) -> bool {
        !s.engine().contains(self.id())
    }
}

macro_rules! declaration_from {
    ($($handle:ident => $variant:ident),+ $(,)?) => {
        $(
            impl From<$handle> for Declaration {
                fn from(decl: $handle) -> Self {
                    Declaration::$variant(decl)
                }
            }
        )+
    };
}

declaration_from!(
    TranslationUnitDeclaration => TranslationUnit,
    NamespaceDeclaration => Namespace,
    IncludeDeclaration => Include,
    FunctionDeclaration => Function,
    MethodDeclaration => Method,
    RecordDeclaration => Record,
    FieldDeclaration => Field,
    VariableDeclaration => Variable,
    ParamVariableDeclaration => ParamVariable,
);

impl From<Declaration> for Value {
    fn from(decl: Declaration) -> Self {
        Value::Node(decl.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryGraph;
    use crate::factory;
    use crate::position::{FileSet, Pos, Span};
    use crate::scope;
    use crate::session::BuildOptions;
    use crate::types::{CachingTypeBinder, TypeBinder, TypeDescriptor};

    fn fixture() -> (FileSet, Span) {
        let mut fset = FileSet::new();
        let base = fset.add_file("point.go", "package geo\n\ntype Point struct{ x, y int }\n");
        (fset, Span::new(base, Pos(base.0 + 11)))
    }

    fn bind(s: &mut Session<'_>, text: &str) -> Type {
        CachingTypeBinder.bind(s, &TypeDescriptor::parse(text)).unwrap()
    }

    #[test]
    fn test_set_return_types_replaces() {
        let (fset, span) = fixture();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let func = factory::new_function_declaration(&mut s, &span).unwrap();
        let int = bind(&mut s, "int");
        let err = bind(&mut s, "error");
        let string = bind(&mut s, "string");

        func.set_return_types(&mut s, &[int, err]).unwrap();
        func.set_return_types(&mut s, &[string]).unwrap();

        assert_eq!(func.return_types(&s).unwrap(), vec![string]);
        // the single type edge is separate from the return list
        assert!(func.type_of(&s).unwrap().is_none());
    }

    #[test]
    fn test_add_parameter_preserves_order() {
        let (fset, span) = fixture();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let func = factory::new_function_declaration(&mut s, &span).unwrap();
        let mut expected = Vec::new();
        for name in ["a", "b", "c", "d"] {
            let param = factory::new_param_variable_declaration(&mut s, &span).unwrap();
            param.set_name(&mut s, name).unwrap();
            func.add_parameter(&mut s, param).unwrap();
            expected.push(param);
        }

        let params = func.parameters(&s).unwrap();
        assert_eq!(params, expected);
        let names: Vec<String> = params.iter().map(|p| p.name(&s).unwrap()).collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_receiver_round_trip() {
        let (fset, span) = fixture();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let method = factory::new_method_declaration(&mut s, &span).unwrap();
        let receiver = factory::new_variable_declaration(&mut s, &span).unwrap();
        assert!(method.receiver(&s).unwrap().is_none());

        method.set_receiver(&mut s, receiver).unwrap();
        assert_eq!(method.receiver(&s).unwrap(), Some(receiver));

        let other = factory::new_variable_declaration(&mut s, &span).unwrap();
        method.set_receiver(&mut s, other).unwrap();
        assert_eq!(method.receiver(&s).unwrap(), Some(other));
    }

    #[test]
    fn test_add_method_requires_receiver() {
        let (fset, span) = fixture();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let record = factory::new_record_declaration(&mut s, &span).unwrap();
        let method = factory::new_method_declaration(&mut s, &span).unwrap();

        assert!(matches!(
            record.add_method(&mut s, method),
            Err(Error::MissingReceiver(id)) if id == method.id()
        ));
        assert!(record.methods(&s).unwrap().is_empty());
    }

    #[test]
    fn test_rename_after_link_is_refused() {
        let (fset, span) = fixture();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        factory::new_translation_unit_declaration(&mut s, None, "point.go", "").unwrap();
        let var = factory::new_variable_declaration(&mut s, &span).unwrap();
        var.set_name(&mut s, "origin").unwrap();
        scope::add_declaration(&mut s, var).unwrap();

        var.set_name(&mut s, "origin").unwrap();
        assert!(matches!(
            var.set_name(&mut s, "center"),
            Err(Error::RenameAfterLink { .. })
        ));
        assert_eq!(var.name(&s).unwrap(), "origin");
    }

    #[test]
    fn test_super_class_policy() {
        let (fset, span) = fixture();
        let mut graph = MemoryGraph::new();
        let ignore = BuildOptions {
            super_class_policy: SuperClassPolicy::Ignore,
        };
        let mut s = Session::new(&fset, &mut graph, ignore);

        let record = factory::new_record_declaration(&mut s, &span).unwrap();
        let reader = bind(&mut s, "io.Reader");
        record.add_super_class(&mut s, reader).unwrap();
        record.add_super_class(&mut s, reader).unwrap();
        assert_eq!(record.super_classes(&s).unwrap(), vec![reader]);

        // a handle that does not name a live node is refused by the engine
        let dangling = Type(NodeId(9_999));
        record.add_super_class(&mut s, dangling).unwrap();
        assert_eq!(record.super_classes(&s).unwrap().len(), 1);
    }

    #[test]
    fn test_super_class_failure_propagates_by_default() {
        let (fset, span) = fixture();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let record = factory::new_record_declaration(&mut s, &span).unwrap();
        let err = record.add_super_class(&mut s, Type(NodeId(9_999))).unwrap_err();
        assert!(matches!(err, Error::EngineRejected { .. }));
    }

    #[test]
    fn test_include_lookup() {
        let (fset, span) = fixture();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let unit = factory::new_translation_unit_declaration(&mut s, None, "point.go", "").unwrap();
        for name in ["foo", "bar", ""] {
            assert!(unit.include_by_name(&mut s, name).unwrap().is_none());
        }

        let include = factory::new_include_declaration(&mut s, &span).unwrap();
        include.set_name(&mut s, "foo").unwrap();
        include.set_filename(&mut s, "example.com/foo").unwrap();
        scope::add_declaration(&mut s, include).unwrap();

        assert_eq!(unit.include_by_name(&mut s, "foo").unwrap(), Some(include));
        assert!(unit.include_by_name(&mut s, "bar").unwrap().is_none());
    }

    #[test]
    fn test_unresolved_include_keeps_filename() {
        let (fset, span) = fixture();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let unit = factory::new_translation_unit_declaration(&mut s, None, "point.go", "").unwrap();
        let include = factory::new_include_declaration(&mut s, &span).unwrap();
        include.set_name(&mut s, "nowhere").unwrap();
        include.set_filename(&mut s, "example.com/never/nowhere").unwrap();
        unit.add_include(&mut s, include).unwrap();

        let found = unit.include_by_name(&mut s, "nowhere").unwrap().unwrap();
        assert!(!found.is_nil(&s));
        assert_eq!(
            found.filename(&s).unwrap().as_deref(),
            Some("example.com/never/nowhere")
        );
    }

    #[test]
    fn test_declaration_variants() {
        let (fset, span) = fixture();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let method = factory::new_method_declaration(&mut s, &span).unwrap();
        let field = factory::new_field_declaration(&mut s, &span).unwrap();

        assert!(matches!(Declaration::from_node(&s, method.id()), Some(Declaration::Method(_))));
        assert!(matches!(Declaration::from_node(&s, field.id()), Some(Declaration::Field(_))));
        assert_eq!(FunctionDeclaration::from(method).as_method(&s), Some(method));
        assert!(FieldDeclaration::from_node(&s, method.id()).is_none());
    }
}
