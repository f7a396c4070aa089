//! Scope/Unit Composer - links declarations into their containers
//!
//! Translation units and namespaces open a scope as soon as they are created,
//! so every declaration built afterwards can be linked into the innermost
//! container without a second pass. Linking follows the container's kind:
//! units and namespaces own `declarations` (units also own `includes`),
//! records own `methods` and `fields`, functions own `parameters`.
//!
//! Within one container a declaration replaces an earlier one with the same
//! name in the same list. Blank (`_`) and empty names never replace, nor do
//! names the frontend marked repeatable. Methods linked outside a record
//! replace only a method of the same receiver type.

pub mod graph;

pub use graph::{MemberSlot, ScopeId, ScopeKind, ScopeManager};

use crate::declarations::{
    Declaration, FieldDeclaration, FunctionDeclaration, FunctionLike, IncludeDeclaration,
    MethodDeclaration, NamespaceDeclaration, ParamVariableDeclaration, RecordDeclaration,
    TranslationUnitDeclaration,
};
use crate::node::{Node, NodeId, NodeKind};
use crate::session::Session;
use crate::statements::CompoundStatement;
use crate::types::HasType;
use crate::{Error, Result};

/// Make `unit` the root container, discarding any previous unit's scopes
pub fn enter_unit(s: &mut Session<'_>, unit: TranslationUnitDeclaration) {
    s.scopes_mut().reset(ScopeKind::TranslationUnit, unit.id());
}

/// Link a namespace into the current container and open its scope
pub fn enter_namespace(s: &mut Session<'_>, namespace: NamespaceDeclaration) -> Result<()> {
    if s.scopes().current().is_some() {
        add_declaration(s, namespace)?;
        s.scopes_mut().enter(ScopeKind::Namespace, Some(namespace.id()));
    } else {
        // A namespace without a unit becomes the root container itself
        s.scopes_mut().reset(ScopeKind::Namespace, namespace.id());
    }
    Ok(())
}

pub fn enter_record(s: &mut Session<'_>, record: RecordDeclaration) -> ScopeId {
    s.scopes_mut().enter(ScopeKind::Record, Some(record.id()))
}

pub fn enter_function(s: &mut Session<'_>, function: impl FunctionLike) -> ScopeId {
    s.scopes_mut().enter(ScopeKind::Function, Some(function.id()))
}

pub fn enter_block(s: &mut Session<'_>, block: CompoundStatement) -> ScopeId {
    s.scopes_mut().enter(ScopeKind::Block, Some(block.id()))
}

pub fn leave_scope(s: &mut Session<'_>) -> Option<ScopeId> {
    s.scopes_mut().leave()
}

/// The unit currently being built
pub fn current_unit(s: &Session<'_>) -> Option<TranslationUnitDeclaration> {
    let scopes = s.scopes();
    let scope = scopes.nearest(ScopeKind::TranslationUnit)?;
    scopes
        .container(scope)
        .and_then(|id| TranslationUnitDeclaration::from_node(s, id))
}

/// Link a declaration into the innermost container that can hold it.
///
/// Includes always go to the unit. In block scopes, which have no
/// declaration container, the declaration is only defined by name; the
/// enclosing declaration statement owns it.
pub fn add_declaration(s: &mut Session<'_>, decl: impl Into<Declaration>) -> Result<()> {
    let decl = decl.into();
    let scopes = s.scopes();

    let scope = match decl {
        Declaration::Include(_) => scopes.nearest(ScopeKind::TranslationUnit),
        _ => scopes.current(),
    }
    .ok_or_else(|| Error::rejected("link", decl.id(), "no open scope"))?;

    if scopes.kind(scope) == Some(ScopeKind::Block) {
        let name = decl.name(s)?;
        declare(s, scope, &name, decl.id());
        s.scopes_mut().mark_linked(decl.id());
        return Ok(());
    }

    let container = scopes
        .container(scope)
        .and_then(|id| Declaration::from_node(s, id))
        .ok_or_else(|| Error::rejected("link", decl.id(), "scope has no container"))?;
    add_to(s, container, decl)
}

/// Link a declaration into an explicit container
pub fn add_to(s: &mut Session<'_>, container: Declaration, decl: Declaration) -> Result<()> {
    let slot = member_slot(&container, &decl).ok_or_else(|| {
        Error::rejected(
            "link",
            container.id(),
            format!("{} cannot hold {}", kind_name(s, container.id()), kind_name(s, decl.id())),
        )
    })?;

    let name = decl.name(s)?;
    let key = member_key(s, &decl, &name, slot)?;
    if let Some(key) = &key {
        match s.scopes().member(container.id(), slot, key) {
            Some(existing) if existing == decl.id() => return Ok(()),
            Some(existing) => {
                tracing::debug!("{} replaces {} '{}' in {}", decl.id(), existing, key, container.id());
                remove(s, container.id(), slot, existing)?;
            }
            None => {}
        }
    }

    match (container, decl, slot) {
        (Declaration::TranslationUnit(unit), Declaration::Include(include), _) => {
            unit.add_include(s, include)?
        }
        (Declaration::Record(record), Declaration::Method(method), _) => record.add_method(s, method)?,
        (Declaration::Record(record), Declaration::Field(field), _) => record.add_field(s, field)?,
        (_, Declaration::ParamVariable(param), MemberSlot::Parameter) => {
            FunctionDeclaration(container.id()).add_parameter(s, param)?
        }
        _ => {
            s.invoke(container.id(), "addDeclaration", decl.id())?;
        }
    }

    if let Some(key) = &key {
        s.scopes_mut()
            .record_member(container.id(), slot, key, decl.id());
    }
    if let Some(scope) = s.scopes().scope_of(container.id()) {
        declare(s, scope, key.as_deref().unwrap_or(name.as_str()), decl.id());
    }
    s.scopes_mut().mark_linked(decl.id());
    tracing::trace!("linked {} into {}", decl.id(), container.id());
    Ok(())
}

/// Register a name in a scope without linking any edge
pub fn declare(s: &mut Session<'_>, scope: ScopeId, name: &str, node: NodeId) {
    if replaceable(name) {
        s.scopes_mut().define(scope, name, node);
    }
}

/// Resolve a name from the current scope outward
pub fn resolve(s: &Session<'_>, name: &str) -> Option<Declaration> {
    s.scopes()
        .resolve(name)
        .and_then(|id| Declaration::from_node(s, id))
}

/// Look up one of the current unit's includes by name. `None` when absent.
pub fn include_by_name(s: &mut Session<'_>, name: &str) -> Result<Option<IncludeDeclaration>> {
    match current_unit(s) {
        Some(unit) => unit.include_by_name(s, name),
        None => Ok(None),
    }
}

fn replaceable(name: &str) -> bool {
    !name.is_empty() && name != "_"
}

/// Key under which `decl` replaces an earlier member; `None` when it never replaces
fn member_key(s: &Session<'_>, decl: &Declaration, name: &str, slot: MemberSlot) -> Result<Option<String>> {
    if !replaceable(name) || slot == MemberSlot::Parameter {
        return Ok(None);
    }
    if slot == MemberSlot::Declaration && s.scopes().is_repeatable(name) {
        return Ok(None);
    }
    match decl {
        // `T.Name`, where T is the receiver's type without indirection
        Declaration::Method(method) if slot == MemberSlot::Declaration => {
            let receiver_type = match method.receiver(s)? {
                Some(receiver) => receiver.type_of(s)?.map(|ty| ty.name(s)).transpose()?,
                None => None,
            };
            Ok(Some(match receiver_type {
                Some(ty) => format!("{}.{}", ty.trim_start_matches('*'), name),
                None => name.to_string(),
            }))
        }
        _ => Ok(Some(name.to_string())),
    }
}

fn member_slot(container: &Declaration, decl: &Declaration) -> Option<MemberSlot> {
    match (container, decl) {
        (Declaration::TranslationUnit(_), Declaration::Include(_)) => Some(MemberSlot::Include),
        (Declaration::TranslationUnit(_) | Declaration::Namespace(_), Declaration::TranslationUnit(_)) => None,
        (Declaration::TranslationUnit(_) | Declaration::Namespace(_), Declaration::Include(_)) => None,
        (Declaration::TranslationUnit(_) | Declaration::Namespace(_), _) => Some(MemberSlot::Declaration),
        (Declaration::Record(_), Declaration::Method(_)) => Some(MemberSlot::Method),
        (Declaration::Record(_), Declaration::Field(_)) => Some(MemberSlot::Field),
        (Declaration::Function(_) | Declaration::Method(_), Declaration::ParamVariable(_)) => {
            Some(MemberSlot::Parameter)
        }
        _ => None,
    }
}

fn remove(s: &mut Session<'_>, container: NodeId, slot: MemberSlot, existing: NodeId) -> Result<()> {
    let method = match slot {
        MemberSlot::Declaration => "removeDeclaration",
        MemberSlot::Method => "removeMethod",
        MemberSlot::Field => "removeField",
        // includes and parameters are never replaced
        MemberSlot::Include | MemberSlot::Parameter => return Ok(()),
    };
    s.invoke(container, method, existing).map(drop)
}

fn kind_name(s: &Session<'_>, id: NodeId) -> &'static str {
    s.kind_of(id).map(|k: NodeKind| k.as_str()).unwrap_or("nil")
}

/// Attach a method to the record declared under `record_name` in the current unit
pub fn attach_method(
    s: &mut Session<'_>,
    record_name: &str,
    method: MethodDeclaration,
) -> Result<Option<RecordDeclaration>> {
    let Some(Declaration::Record(record)) = resolve(s, record_name) else {
        return Ok(None);
    };
    add_to(s, record.into(), method.into())?;
    Ok(Some(record))
}

/// Link a field into the record whose scope is current
pub fn add_field(s: &mut Session<'_>, field: FieldDeclaration) -> Result<()> {
    add_declaration(s, field)
}

/// Link a parameter into the function whose scope is current
pub fn add_parameter(s: &mut Session<'_>, param: ParamVariableDeclaration) -> Result<()> {
    add_declaration(s, param)
}
