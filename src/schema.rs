//! Graph schema - the fixed set of fields and methods per node kind
//!
//! The construction layer never invents schema: every `set_field` and
//! `invoke` it issues must match an entry here, and engines reject anything
//! else. Kinds that refine another kind (method → function) list the parent's
//! groups first.

use crate::node::NodeKind;

/// Which node kinds a node-valued slot admits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Any,
    Declaration,
    Statement,
    Expression,
    Type,
    Function,
    Method,
    Variable,
    Parameter,
    Field,
    Include,
}

impl Category {
    pub fn admits(&self, kind: NodeKind) -> bool {
        match self {
            Category::Any => true,
            Category::Declaration => kind.is_declaration(),
            Category::Statement => kind.is_statement(),
            Category::Expression => kind.is_expression(),
            Category::Type => kind.is_type(),
            Category::Function => kind.is_function(),
            Category::Method => kind == NodeKind::MethodDeclaration,
            Category::Variable => kind.is_variable(),
            Category::Parameter => kind == NodeKind::ParamVariableDeclaration,
            Category::Field => kind == NodeKind::FieldDeclaration,
            Category::Include => kind == NodeKind::IncludeDeclaration,
        }
    }
}

/// Shape of a field or method argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Text,
    One(Category),
    Many(Category),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub slot: Slot,
}

/// What an engine does with a field when a method is invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodOp {
    /// Append the node argument to a list field, unless already present
    Append,
    /// Remove the node argument from a list field
    Remove,
    /// Replace a list field with the node-list argument
    Replace,
    /// Store the node argument in a single-valued field
    Set,
    /// Return the first node of a list field whose name equals the text argument
    FindByName,
}

#[derive(Debug, Clone, Copy)]
pub struct MethodSpec {
    pub name: &'static str,
    /// Field the method operates on
    pub field: &'static str,
    pub op: MethodOp,
    pub arg: Slot,
}

const fn field(name: &'static str, slot: Slot) -> FieldSpec {
    FieldSpec { name, slot }
}

const fn method(name: &'static str, field: &'static str, op: MethodOp, arg: Slot) -> MethodSpec {
    MethodSpec { name, field, op, arg }
}

use Category as C;
use MethodOp as Op;
use Slot::{Many, One, Text};

const TYPED: &[FieldSpec] = &[field("type", One(C::Type))];

const UNIT_FIELDS: &[FieldSpec] = &[
    field("declarations", Many(C::Declaration)),
    field("includes", Many(C::Include)),
];
const NAMESPACE_FIELDS: &[FieldSpec] = &[field("declarations", Many(C::Declaration))];
const INCLUDE_FIELDS: &[FieldSpec] = &[field("filename", Text)];
const FUNCTION_FIELDS: &[FieldSpec] = &[
    field("parameters", Many(C::Parameter)),
    field("returnTypes", Many(C::Type)),
    field("body", One(C::Statement)),
];
const METHOD_FIELDS: &[FieldSpec] = &[field("receiver", One(C::Variable))];
const RECORD_FIELDS: &[FieldSpec] = &[
    field("kind", Text),
    field("methods", Many(C::Method)),
    field("fields", Many(C::Field)),
    field("superClasses", Many(C::Type)),
];
const VARIABLE_FIELDS: &[FieldSpec] = &[field("initializer", One(C::Expression))];
const COMPOUND_FIELDS: &[FieldSpec] = &[field("statements", Many(C::Statement))];
const DECLARATION_STATEMENT_FIELDS: &[FieldSpec] = &[field("declarations", Many(C::Declaration))];
const RETURN_FIELDS: &[FieldSpec] = &[field("returnValue", One(C::Expression))];
const SWITCH_FIELDS: &[FieldSpec] = &[
    field("selector", One(C::Expression)),
    field("body", One(C::Statement)),
];
const CASE_FIELDS: &[FieldSpec] = &[field("caseExpression", One(C::Expression))];
const LITERAL_FIELDS: &[FieldSpec] = &[field("value", Text)];
const REFERENCE_FIELDS: &[FieldSpec] = &[field("refersTo", One(C::Declaration))];
const MEMBER_FIELDS: &[FieldSpec] = &[field("base", One(C::Expression))];
const CALL_FIELDS: &[FieldSpec] = &[
    field("callee", One(C::Expression)),
    field("arguments", Many(C::Expression)),
    field("invokes", Many(C::Function)),
];
const ELEMENT_FIELDS: &[FieldSpec] = &[field("elementType", One(C::Type))];
const MAP_FIELDS: &[FieldSpec] = &[
    field("keyType", One(C::Type)),
    field("elementType", One(C::Type)),
];

const UNIT_METHODS: &[MethodSpec] = &[
    method("addDeclaration", "declarations", Op::Append, One(C::Declaration)),
    method("removeDeclaration", "declarations", Op::Remove, One(C::Declaration)),
    method("addInclude", "includes", Op::Append, One(C::Include)),
    method("getIncludeByName", "includes", Op::FindByName, Text),
];
const NAMESPACE_METHODS: &[MethodSpec] = &[
    method("addDeclaration", "declarations", Op::Append, One(C::Declaration)),
    method("removeDeclaration", "declarations", Op::Remove, One(C::Declaration)),
];
const FUNCTION_METHODS: &[MethodSpec] = &[
    method("addParameter", "parameters", Op::Append, One(C::Parameter)),
    method("setReturnTypes", "returnTypes", Op::Replace, Many(C::Type)),
    method("setBody", "body", Op::Set, One(C::Statement)),
];
const RECORD_METHODS: &[MethodSpec] = &[
    method("addMethod", "methods", Op::Append, One(C::Method)),
    method("removeMethod", "methods", Op::Remove, One(C::Method)),
    method("addField", "fields", Op::Append, One(C::Field)),
    method("removeField", "fields", Op::Remove, One(C::Field)),
    method("addSuperClass", "superClasses", Op::Append, One(C::Type)),
];
const VARIABLE_METHODS: &[MethodSpec] = &[method(
    "setInitializer",
    "initializer",
    Op::Set,
    One(C::Expression),
)];
const COMPOUND_METHODS: &[MethodSpec] = &[method(
    "addStatement",
    "statements",
    Op::Append,
    One(C::Statement),
)];
const DECLARATION_STATEMENT_METHODS: &[MethodSpec] = &[method(
    "addDeclaration",
    "declarations",
    Op::Append,
    One(C::Declaration),
)];
const CALL_METHODS: &[MethodSpec] = &[
    method("addArgument", "arguments", Op::Append, One(C::Expression)),
    method("addInvoke", "invokes", Op::Append, One(C::Function)),
];

/// Field groups for a kind
pub fn field_groups(kind: NodeKind) -> &'static [&'static [FieldSpec]] {
    match kind {
        NodeKind::TranslationUnitDeclaration => &[UNIT_FIELDS],
        NodeKind::NamespaceDeclaration => &[NAMESPACE_FIELDS],
        NodeKind::IncludeDeclaration => &[INCLUDE_FIELDS],
        NodeKind::FunctionDeclaration => &[TYPED, FUNCTION_FIELDS],
        NodeKind::MethodDeclaration => &[TYPED, FUNCTION_FIELDS, METHOD_FIELDS],
        NodeKind::RecordDeclaration => &[RECORD_FIELDS],
        NodeKind::FieldDeclaration | NodeKind::ParamVariableDeclaration => &[TYPED],
        NodeKind::VariableDeclaration => &[TYPED, VARIABLE_FIELDS],
        NodeKind::CompoundStatement => &[COMPOUND_FIELDS],
        NodeKind::DeclarationStatement => &[DECLARATION_STATEMENT_FIELDS],
        NodeKind::ReturnStatement => &[RETURN_FIELDS],
        NodeKind::SwitchStatement => &[SWITCH_FIELDS],
        NodeKind::CaseStatement => &[CASE_FIELDS],
        NodeKind::DefaultStatement => &[],
        NodeKind::Literal => &[TYPED, LITERAL_FIELDS],
        NodeKind::DeclaredReferenceExpression => &[TYPED, REFERENCE_FIELDS],
        NodeKind::MemberExpression => &[TYPED, MEMBER_FIELDS],
        NodeKind::CallExpression => &[TYPED, CALL_FIELDS],
        NodeKind::UnknownExpression => &[TYPED],
        NodeKind::PointerType | NodeKind::ArrayType => &[ELEMENT_FIELDS],
        NodeKind::MapType => &[MAP_FIELDS],
        NodeKind::ObjectType | NodeKind::FunctionPointerType | NodeKind::UnknownType => &[],
    }
}

/// Method groups for a kind
pub fn method_groups(kind: NodeKind) -> &'static [&'static [MethodSpec]] {
    match kind {
        NodeKind::TranslationUnitDeclaration => &[UNIT_METHODS],
        NodeKind::NamespaceDeclaration => &[NAMESPACE_METHODS],
        NodeKind::FunctionDeclaration | NodeKind::MethodDeclaration => &[FUNCTION_METHODS],
        NodeKind::RecordDeclaration => &[RECORD_METHODS],
        NodeKind::VariableDeclaration => &[VARIABLE_METHODS],
        NodeKind::CompoundStatement => &[COMPOUND_METHODS],
        NodeKind::DeclarationStatement => &[DECLARATION_STATEMENT_METHODS],
        NodeKind::CallExpression => &[CALL_METHODS],
        _ => &[],
    }
}

/// Look up a kind-specific field
pub fn field_spec(kind: NodeKind, name: &str) -> Option<&'static FieldSpec> {
    field_groups(kind)
        .iter()
        .flat_map(|group| group.iter())
        .find(|f| f.name == name)
}

/// Look up a method
pub fn method_spec(kind: NodeKind, name: &str) -> Option<&'static MethodSpec> {
    method_groups(kind)
        .iter()
        .flat_map(|group| group.iter())
        .find(|m| m.name == name)
}

/// Every kind-specific field of a kind, in declaration order
pub fn fields(kind: NodeKind) -> impl Iterator<Item = &'static FieldSpec> {
    field_groups(kind).iter().flat_map(|group| group.iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeKind;

    #[test]
    fn test_method_inherits_function_schema() {
        assert!(field_spec(NodeKind::MethodDeclaration, "parameters").is_some());
        assert!(field_spec(NodeKind::MethodDeclaration, "receiver").is_some());
        assert!(field_spec(NodeKind::FunctionDeclaration, "receiver").is_none());
        assert!(method_spec(NodeKind::MethodDeclaration, "setReturnTypes").is_some());
    }

    #[test]
    fn test_every_method_targets_a_field() {
        for kind in NodeKind::all() {
            for group in method_groups(*kind) {
                for m in group.iter() {
                    assert!(
                        field_spec(*kind, m.field).is_some(),
                        "{}.{} targets unknown field {}",
                        kind,
                        m.name,
                        m.field
                    );
                }
            }
        }
    }

    #[test]
    fn test_node_fields_are_edges() {
        for kind in NodeKind::all() {
            for f in fields(*kind) {
                if f.slot != Slot::Text {
                    assert!(EdgeKind::from_field(f.name).is_some(), "{} has no edge kind", f.name);
                }
            }
        }
    }

    #[test]
    fn test_categories() {
        assert!(Category::Variable.admits(NodeKind::VariableDeclaration));
        assert!(!Category::Method.admits(NodeKind::FunctionDeclaration));
        assert!(Category::Function.admits(NodeKind::MethodDeclaration));
        assert!(Category::Statement.admits(NodeKind::CallExpression));
    }
}
