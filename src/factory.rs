//! Node Factory - allocates located nodes of one kind
//!
//! Every `new_*` operation resolves the AST node's position first, so an
//! invalid position never leaves a half-made node behind. It then allocates
//! the node, stores its source text and location, and returns a typed handle.
//! Names and every other attribute are left for the builders.
//!
//! Translation units and namespaces take an explicit name and code because
//! they stand for whole files or packages; they also become the implicit
//! container for everything created after them.

use crate::declarations::{
    FieldDeclaration, FunctionDeclaration, IncludeDeclaration, MethodDeclaration,
    NamespaceDeclaration, ParamVariableDeclaration, RecordDeclaration, TranslationUnitDeclaration,
    VariableDeclaration,
};
use crate::engine::{CODE, LOCATION, NAME};
use crate::node::{Node, NodeId, NodeKind};
use crate::position::AstNode;
use crate::scope;
use crate::session::Session;
use crate::statements::{
    CallExpression, CaseStatement, CompoundStatement, DeclarationStatement,
    DeclaredReferenceExpression, DefaultStatement, Literal, MemberExpression, ReturnStatement,
    SwitchStatement, UnknownExpression,
};
use crate::Result;

fn located<T: Node>(s: &mut Session<'_>, kind: NodeKind, ast: &dyn AstNode) -> Result<T> {
    let (code, location) = s.resolve(ast)?;
    let id = s.create(kind)?;
    s.set(id, CODE, code.into())?;
    s.set(id, LOCATION, location.into())?;
    Ok(T::wrap(id))
}

fn named_container(
    s: &mut Session<'_>,
    kind: NodeKind,
    ast: Option<&dyn AstNode>,
    name: &str,
    code: &str,
) -> Result<NodeId> {
    let location = ast.map(|node| s.resolve(node)).transpose()?;
    let id = s.create(kind)?;
    s.set(id, NAME, name.into())?;
    s.set(id, CODE, code.into())?;
    if let Some((_, location)) = location {
        s.set(id, LOCATION, location.into())?;
    }
    tracing::debug!("new {} '{}' {}", kind, name, id);
    Ok(id)
}

/// Create the root of one source file and open its scope
pub fn new_translation_unit_declaration(
    s: &mut Session<'_>,
    ast: Option<&dyn AstNode>,
    name: &str,
    code: &str,
) -> Result<TranslationUnitDeclaration> {
    let id = named_container(s, NodeKind::TranslationUnitDeclaration, ast, name, code)?;
    let unit = TranslationUnitDeclaration(id);
    scope::enter_unit(s, unit);
    Ok(unit)
}

/// Create a namespace, link it into the current unit and open its scope
pub fn new_namespace_declaration(
    s: &mut Session<'_>,
    ast: Option<&dyn AstNode>,
    name: &str,
    code: &str,
) -> Result<NamespaceDeclaration> {
    let id = named_container(s, NodeKind::NamespaceDeclaration, ast, name, code)?;
    let namespace = NamespaceDeclaration(id);
    scope::enter_namespace(s, namespace)?;
    Ok(namespace)
}

pub fn new_include_declaration(s: &mut Session<'_>, ast: &dyn AstNode) -> Result<IncludeDeclaration> {
    located(s, NodeKind::IncludeDeclaration, ast)
}

pub fn new_function_declaration(s: &mut Session<'_>, ast: &dyn AstNode) -> Result<FunctionDeclaration> {
    located(s, NodeKind::FunctionDeclaration, ast)
}

pub fn new_method_declaration(s: &mut Session<'_>, ast: &dyn AstNode) -> Result<MethodDeclaration> {
    located(s, NodeKind::MethodDeclaration, ast)
}

pub fn new_record_declaration(s: &mut Session<'_>, ast: &dyn AstNode) -> Result<RecordDeclaration> {
    located(s, NodeKind::RecordDeclaration, ast)
}

pub fn new_field_declaration(s: &mut Session<'_>, ast: &dyn AstNode) -> Result<FieldDeclaration> {
    located(s, NodeKind::FieldDeclaration, ast)
}

pub fn new_variable_declaration(s: &mut Session<'_>, ast: &dyn AstNode) -> Result<VariableDeclaration> {
    located(s, NodeKind::VariableDeclaration, ast)
}

pub fn new_param_variable_declaration(
    s: &mut Session<'_>,
    ast: &dyn AstNode,
) -> Result<ParamVariableDeclaration> {
    located(s, NodeKind::ParamVariableDeclaration, ast)
}

pub fn new_compound_statement(s: &mut Session<'_>, ast: &dyn AstNode) -> Result<CompoundStatement> {
    located(s, NodeKind::CompoundStatement, ast)
}

pub fn new_declaration_statement(s: &mut Session<'_>, ast: &dyn AstNode) -> Result<DeclarationStatement> {
    located(s, NodeKind::DeclarationStatement, ast)
}

pub fn new_return_statement(s: &mut Session<'_>, ast: &dyn AstNode) -> Result<ReturnStatement> {
    located(s, NodeKind::ReturnStatement, ast)
}

pub fn new_switch_statement(s: &mut Session<'_>, ast: &dyn AstNode) -> Result<SwitchStatement> {
    located(s, NodeKind::SwitchStatement, ast)
}

pub fn new_case_statement(s: &mut Session<'_>, ast: &dyn AstNode) -> Result<CaseStatement> {
    located(s, NodeKind::CaseStatement, ast)
}

pub fn new_default_statement(s: &mut Session<'_>, ast: &dyn AstNode) -> Result<DefaultStatement> {
    located(s, NodeKind::DefaultStatement, ast)
}

pub fn new_literal(s: &mut Session<'_>, ast: &dyn AstNode, value: &str) -> Result<Literal> {
    let literal: Literal = located(s, NodeKind::Literal, ast)?;
    literal.set_value(s, value)?;
    Ok(literal)
}

/// Expressions carry their name from the start; it is what they refer to
fn named<T: Node>(s: &mut Session<'_>, kind: NodeKind, ast: &dyn AstNode, name: &str) -> Result<T> {
    let node: T = located(s, kind, ast)?;
    s.set(node.id(), NAME, name.into())?;
    Ok(node)
}

pub fn new_declared_reference_expression(
    s: &mut Session<'_>,
    ast: &dyn AstNode,
    name: &str,
) -> Result<DeclaredReferenceExpression> {
    named(s, NodeKind::DeclaredReferenceExpression, ast, name)
}

pub fn new_member_expression(s: &mut Session<'_>, ast: &dyn AstNode, name: &str) -> Result<MemberExpression> {
    named(s, NodeKind::MemberExpression, ast, name)
}

pub fn new_call_expression(s: &mut Session<'_>, ast: &dyn AstNode, name: &str) -> Result<CallExpression> {
    named(s, NodeKind::CallExpression, ast, name)
}

pub fn new_unknown_expression(s: &mut Session<'_>, ast: &dyn AstNode) -> Result<UnknownExpression> {
    located(s, NodeKind::UnknownExpression, ast)
}
