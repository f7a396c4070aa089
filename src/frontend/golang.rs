//! Go frontend
//!
//! Translates Go source files using tree-sitter-go. Package clauses become
//! namespaces, imports become includes, struct and interface type specs
//! become records, and functions, methods and package-level variables become
//! declarations with their bodies and initializers.

use super::Frontend;
use crate::declarations::{
    Declaration, FunctionDeclaration, FunctionLike, HasName, MethodDeclaration, RecordDeclaration,
    TranslationUnitDeclaration, VariableDeclaration,
};
use crate::factory;
use crate::node::Node as _;
use crate::position::{AstNode, Pos, SourceFile};
use crate::scope;
use crate::session::Session;
use crate::statements::{CompoundStatement, Expression, Statement, SwitchStatement};
use crate::types::{CachingTypeBinder, HasType, Type, TypeBinder, TypeDescriptor};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tree_sitter::{Node, Parser};

/// A tree-sitter node placed in the file set's global offset space
#[derive(Clone, Copy)]
pub struct GoNode<'t> {
    node: Node<'t>,
    base: Pos,
}

impl AstNode for GoNode<'_> {
    fn pos(&self) -> Pos {
        Pos(self.base.0 + self.node.start_byte() as u32)
    }

    fn end(&self) -> Pos {
        Pos(self.base.0 + self.node.end_byte() as u32)
    }
}

/// Go language frontend
#[derive(Clone)]
pub struct GoFrontend {
    binder: Arc<dyn TypeBinder>,
}

impl Default for GoFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl GoFrontend {
    /// Create a frontend with the caching type binder
    pub fn new() -> Self {
        Self::with_binder(Arc::new(CachingTypeBinder))
    }

    pub fn with_binder(binder: Arc<dyn TypeBinder>) -> Self {
        Self { binder }
    }
}

impl Frontend for GoFrontend {
    fn language_name(&self) -> &str {
        "Go"
    }

    fn file_extensions(&self) -> &[&str] {
        &["go"]
    }

    fn translate(&self, s: &mut Session<'_>, file: &SourceFile) -> Result<TranslationUnitDeclaration> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| Error::Frontend(format!("Failed to set language: {}", e)))?;

        let tree = parser
            .parse(file.content(), None)
            .ok_or_else(|| Error::Frontend(format!("Failed to parse {}", file.name())))?;

        let unit = GoUnit {
            file: file.name(),
            source: file.content(),
            base: file.base(),
            binder: self.binder.as_ref(),
        };

        let root = tree.root_node();
        if let Some(bad) = first_error(root) {
            let err = Error::Parse(format!("syntax error near '{}'", unit.text(bad)));
            return Err(unit.stopped_at(bad, err));
        }
        unit.translate(s, root)
    }
}

/// Translation state of one Go file
struct GoUnit<'a> {
    file: &'a str,
    source: &'a str,
    base: Pos,
    binder: &'a dyn TypeBinder,
}

impl<'a> GoUnit<'a> {
    fn ast<'t>(&self, node: Node<'t>) -> GoNode<'t> {
        GoNode { node, base: self.base }
    }

    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Attach the position at which translation stopped. The innermost node wins.
    fn stopped_at(&self, node: Node, err: Error) -> Error {
        match err {
            Error::Translation { .. } => err,
            other => {
                let point = node.start_position();
                Error::Translation {
                    file: self.file.to_string(),
                    line: point.row as u32 + 1,
                    column: point.column as u32 + 1,
                    source: Box::new(other),
                }
            }
        }
    }

    fn guard<T>(&self, node: Node, result: Result<T>) -> Result<T> {
        result.map_err(|err| self.stopped_at(node, err))
    }

    fn bind(&self, s: &mut Session<'_>, type_node: Node) -> Result<Type> {
        self.binder.bind(s, &TypeDescriptor::parse(self.text(type_node)))
    }

    fn bind_name(&self, s: &mut Session<'_>, name: &str) -> Result<Type> {
        self.binder.bind(s, &TypeDescriptor::named(name))
    }

    fn translate(&self, s: &mut Session<'_>, root: Node) -> Result<TranslationUnitDeclaration> {
        // any number of init functions per file and package
        s.scopes_mut().allow_repeated("init");
        let unit = factory::new_translation_unit_declaration(s, Some(&self.ast(root)), self.file, self.source)?;

        let children = named_children(root);
        let clause = children
            .iter()
            .find(|c| c.kind() == "package_clause")
            .ok_or_else(|| self.stopped_at(root, Error::Frontend("missing package clause".to_string())))?;
        let package = named_children(*clause)
            .into_iter()
            .find(|c| c.kind() == "package_identifier")
            .map(|c| self.text(c))
            .unwrap_or_default();
        self.guard(
            *clause,
            factory::new_namespace_declaration(s, Some(&self.ast(*clause)), package, self.text(*clause)),
        )?;

        // Types first, so methods declared above their receiver still find it
        for child in &children {
            let result = match child.kind() {
                "import_declaration" => self.handle_imports(s, *child),
                "type_declaration" => self.handle_type_declaration(s, *child),
                _ => Ok(()),
            };
            self.guard(*child, result)?;
        }
        // Function names are visible to every body in the file
        let mut functions = HashMap::new();
        for child in children.iter().filter(|c| c.kind() == "function_declaration") {
            if let Some(func) = self.guard(*child, self.declare_function(s, *child))? {
                functions.insert(child.id(), func);
            }
        }
        for child in &children {
            let result = match child.kind() {
                "function_declaration" => match functions.get(&child.id()) {
                    Some(func) => self.handle_function(s, *func, *child),
                    None => Ok(()),
                },
                "method_declaration" => self.handle_method(s, *child),
                "var_declaration" | "const_declaration" => self.handle_package_variables(s, *child),
                _ => Ok(()),
            };
            self.guard(*child, result)?;
        }

        tracing::debug!("translated {} (package {})", self.file, package);
        Ok(unit)
    }

    fn handle_imports(&self, s: &mut Session<'_>, node: Node) -> Result<()> {
        for spec in flatten(node, "import_spec_list") {
            if spec.kind() != "import_spec" {
                continue;
            }
            let Some(path_node) = spec.child_by_field_name("path") else {
                continue;
            };
            let path = self.text(path_node).trim_matches(|c| c == '"' || c == '`');
            let name = match spec.child_by_field_name("name") {
                Some(alias) => self.text(alias),
                None => path.rsplit('/').next().unwrap_or(path),
            };

            let include = factory::new_include_declaration(s, &self.ast(spec))?;
            include.set_name(s, name)?;
            include.set_filename(s, path)?;
            scope::add_declaration(s, include)?;
        }
        Ok(())
    }

    fn handle_type_declaration(&self, s: &mut Session<'_>, node: Node) -> Result<()> {
        for spec in named_children(node) {
            match spec.kind() {
                "type_spec" => self.guard(spec, self.handle_type_spec(s, spec))?,
                other => tracing::trace!("skipping {} in {}", other, self.file),
            }
        }
        Ok(())
    }

    fn handle_type_spec(&self, s: &mut Session<'_>, spec: Node) -> Result<()> {
        let (Some(name), Some(ty)) = (spec.child_by_field_name("name"), spec.child_by_field_name("type")) else {
            return Ok(());
        };
        let kind = match ty.kind() {
            "struct_type" => "struct",
            "interface_type" => "interface",
            // named non-composite types carry no record
            _ => return Ok(()),
        };

        let record = factory::new_record_declaration(s, &self.ast(spec))?;
        record.set_name(s, self.text(name))?;
        record.set_kind(s, kind)?;
        scope::add_declaration(s, record)?;

        scope::enter_record(s, record);
        let result = match kind {
            "struct" => self.handle_struct(s, record, ty),
            _ => self.handle_interface(s, record, self.text(name), ty),
        };
        scope::leave_scope(s);
        result
    }

    fn handle_struct(&self, s: &mut Session<'_>, record: RecordDeclaration, ty: Node) -> Result<()> {
        for field in flatten(ty, "field_declaration_list") {
            if field.kind() != "field_declaration" {
                continue;
            }
            let Some(type_node) = field.child_by_field_name("type") else {
                continue;
            };
            let field_type = self.bind(s, type_node)?;

            let mut cursor = field.walk();
            let names: Vec<Node> = field.children_by_field_name("name", &mut cursor).collect();
            if names.is_empty() {
                // embedded: promoted like a supertype, reachable under the type's name
                record.add_super_class(s, field_type)?;
                let embedded = self.text(type_node).trim_start_matches('*');
                let embedded = embedded.rsplit('.').next().unwrap_or(embedded);
                self.add_field(s, field, embedded, field_type)?;
                continue;
            }
            for name in names {
                self.add_field(s, field, self.text(name), field_type)?;
            }
        }
        Ok(())
    }

    fn add_field(&self, s: &mut Session<'_>, node: Node, name: &str, ty: Type) -> Result<()> {
        let field = factory::new_field_declaration(s, &self.ast(node))?;
        field.set_name(s, name)?;
        field.set_type(s, ty)?;
        scope::add_declaration(s, field)
    }

    fn handle_interface(&self, s: &mut Session<'_>, record: RecordDeclaration, name: &str, ty: Node) -> Result<()> {
        let interface_type = self.bind_name(s, name)?;
        for elem in named_children(ty) {
            match elem.kind() {
                "method_elem" | "method_spec" => {
                    let Some(method_name) = elem.child_by_field_name("name") else {
                        continue;
                    };
                    let method = factory::new_method_declaration(s, &self.ast(elem))?;
                    method.set_name(s, self.text(method_name))?;

                    // interface methods are bound to the interface itself
                    let receiver = factory::new_variable_declaration(s, &self.ast(elem))?;
                    receiver.set_type(s, interface_type)?;
                    method.set_receiver(s, receiver)?;

                    scope::enter_function(s, method);
                    let result = self.handle_signature(s, method, elem);
                    scope::leave_scope(s);
                    result?;
                    scope::add_declaration(s, method)?;
                }
                "type_elem" | "constraint_elem" => {
                    for embedded in named_children(elem) {
                        let super_type = self.bind(s, embedded)?;
                        record.add_super_class(s, super_type)?;
                    }
                }
                "type_identifier" | "qualified_type" | "interface_type_name" => {
                    let super_type = self.bind(s, elem)?;
                    record.add_super_class(s, super_type)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Parameters and results of a function-like node; the function's scope must be open
    fn handle_signature(&self, s: &mut Session<'_>, func: impl FunctionLike, node: Node) -> Result<()> {
        if let Some(params) = node.child_by_field_name("parameters") {
            for decl in named_children(params) {
                if !matches!(decl.kind(), "parameter_declaration" | "variadic_parameter_declaration") {
                    continue;
                }
                let Some(type_node) = decl.child_by_field_name("type") else {
                    continue;
                };
                let type_text = match decl.kind() {
                    "variadic_parameter_declaration" => format!("...{}", self.text(type_node)),
                    _ => self.text(type_node).to_string(),
                };
                let param_type = self.binder.bind(s, &TypeDescriptor::parse(&type_text))?;

                let mut cursor = decl.walk();
                let names: Vec<&str> = decl
                    .children_by_field_name("name", &mut cursor)
                    .map(|n| self.text(n))
                    .collect();
                let names = if names.is_empty() { vec![""] } else { names };
                for name in names {
                    let param = factory::new_param_variable_declaration(s, &self.ast(decl))?;
                    param.set_name(s, name)?;
                    param.set_type(s, param_type)?;
                    scope::add_declaration(s, param)?;
                }
            }
        }

        if let Some(result) = node.child_by_field_name("result") {
            let mut types = Vec::new();
            if result.kind() == "parameter_list" {
                for decl in named_children(result) {
                    let Some(type_node) = decl.child_by_field_name("type") else {
                        continue;
                    };
                    let ty = self.bind(s, type_node)?;
                    let mut cursor = decl.walk();
                    let count = decl.children_by_field_name("name", &mut cursor).count().max(1);
                    types.extend(std::iter::repeat(ty).take(count));
                }
            } else {
                types.push(self.bind(s, result)?);
            }
            func.set_return_types(s, &types)?;
        }
        Ok(())
    }

    fn declare_function(&self, s: &mut Session<'_>, node: Node) -> Result<Option<FunctionDeclaration>> {
        let Some(name) = node.child_by_field_name("name") else {
            return Ok(None);
        };
        let func = factory::new_function_declaration(s, &self.ast(node))?;
        func.set_name(s, self.text(name))?;
        scope::add_declaration(s, func)?;
        Ok(Some(func))
    }

    fn handle_function(&self, s: &mut Session<'_>, func: FunctionDeclaration, node: Node) -> Result<()> {
        scope::enter_function(s, func);
        let result = self.handle_function_body(s, func, node);
        scope::leave_scope(s);
        result
    }

    fn handle_function_body(&self, s: &mut Session<'_>, func: impl FunctionLike, node: Node) -> Result<()> {
        self.handle_signature(s, func, node)?;
        if let Some(body) = node.child_by_field_name("body") {
            let block = self.handle_block(s, body)?;
            func.set_body(s, block)?;
        }
        Ok(())
    }

    fn handle_method(&self, s: &mut Session<'_>, node: Node) -> Result<()> {
        let Some(name) = node.child_by_field_name("name") else {
            return Ok(());
        };
        let method = factory::new_method_declaration(s, &self.ast(node))?;
        method.set_name(s, self.text(name))?;

        let receiver_decl = node
            .child_by_field_name("receiver")
            .and_then(|list| named_children(list).into_iter().find(|c| c.kind() == "parameter_declaration"));
        let Some(receiver_decl) = receiver_decl else {
            return Err(Error::MissingReceiver(method.id()));
        };
        let receiver = self.handle_receiver(s, method, receiver_decl)?;

        let record_name = receiver_decl
            .child_by_field_name("type")
            .map(|t| base_type_name(self.text(t)))
            .unwrap_or_default();
        if scope::attach_method(s, record_name, method)?.is_none() {
            tracing::debug!("receiver type {} of {} is not a record here", record_name, self.text(name));
            scope::add_declaration(s, method)?;
        }

        let scope_id = scope::enter_function(s, method);
        let receiver_name = receiver.name(s)?;
        scope::declare(s, scope_id, &receiver_name, receiver.id());
        let result = self.handle_function_body(s, method, node);
        scope::leave_scope(s);
        result
    }

    fn handle_receiver(&self, s: &mut Session<'_>, method: MethodDeclaration, decl: Node) -> Result<VariableDeclaration> {
        let receiver = factory::new_variable_declaration(s, &self.ast(decl))?;
        if let Some(name) = decl.child_by_field_name("name") {
            receiver.set_name(s, self.text(name))?;
        }
        if let Some(type_node) = decl.child_by_field_name("type") {
            let ty = self.bind(s, type_node)?;
            receiver.set_type(s, ty)?;
        }
        method.set_receiver(s, receiver)?;
        Ok(receiver)
    }

    fn handle_package_variables(&self, s: &mut Session<'_>, node: Node) -> Result<()> {
        for spec in self.specs(node) {
            for var in self.guard(spec, self.build_variables(s, spec))? {
                scope::add_declaration(s, var)?;
            }
        }
        Ok(())
    }

    /// `var_spec`/`const_spec` children, with or without a surrounding list
    fn specs<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        named_children(node)
            .into_iter()
            .flat_map(|child| match child.kind() {
                "var_spec_list" | "const_spec_list" => named_children(child),
                _ => vec![child],
            })
            .filter(|child| matches!(child.kind(), "var_spec" | "const_spec"))
            .collect()
    }

    /// One variable per name in a spec, each with its positional initializer
    fn build_variables(&self, s: &mut Session<'_>, spec: Node) -> Result<Vec<VariableDeclaration>> {
        let mut cursor = spec.walk();
        let names: Vec<Node> = spec.children_by_field_name("name", &mut cursor).collect();
        let values = spec
            .child_by_field_name("value")
            .map(named_children)
            .unwrap_or_default();
        let declared = match spec.child_by_field_name("type") {
            Some(type_node) => Some(self.bind(s, type_node)?),
            None => None,
        };

        let mut vars = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let var = factory::new_variable_declaration(s, &self.ast(spec))?;
            var.set_name(s, self.text(*name))?;
            if let Some(ty) = declared {
                var.set_type(s, ty)?;
            }
            if let Some(value) = values.get(i) {
                self.initialize(s, var, *value, declared.is_none())?;
            }
            vars.push(var);
        }
        Ok(vars)
    }

    fn initialize(&self, s: &mut Session<'_>, var: VariableDeclaration, value: Node, infer: bool) -> Result<()> {
        let init = self.handle_expression(s, value)?;
        var.set_initializer(s, init)?;
        if infer {
            if let Some(ty) = init.type_of(s)? {
                var.set_type(s, ty)?;
            }
        }
        Ok(())
    }

    fn handle_block(&self, s: &mut Session<'_>, node: Node) -> Result<CompoundStatement> {
        let block = factory::new_compound_statement(s, &self.ast(node))?;
        scope::enter_block(s, block);
        let result = self.handle_statements(s, block, statements_of(node));
        scope::leave_scope(s);
        result.map(|_| block)
    }

    fn handle_statements(&self, s: &mut Session<'_>, block: CompoundStatement, nodes: Vec<Node>) -> Result<()> {
        for node in nodes {
            if let Some(statement) = self.guard(node, self.handle_statement(s, node))? {
                block.add_statement(s, statement)?;
            }
        }
        Ok(())
    }

    fn handle_statement(&self, s: &mut Session<'_>, node: Node) -> Result<Option<Statement>> {
        let statement: Statement = match node.kind() {
            "comment" | "empty_statement" => return Ok(None),
            "block" => self.handle_block(s, node)?.into(),
            "var_declaration" | "const_declaration" => {
                let decl_stmt = factory::new_declaration_statement(s, &self.ast(node))?;
                for spec in self.specs(node) {
                    for var in self.build_variables(s, spec)? {
                        decl_stmt.add_declaration(s, var)?;
                        scope::add_declaration(s, var)?;
                    }
                }
                decl_stmt.into()
            }
            "short_var_declaration" => {
                let decl_stmt = factory::new_declaration_statement(s, &self.ast(node))?;
                let left = node.child_by_field_name("left").map(named_children).unwrap_or_default();
                let right = node.child_by_field_name("right").map(named_children).unwrap_or_default();
                for (i, name) in left.iter().enumerate() {
                    let var = factory::new_variable_declaration(s, &self.ast(node))?;
                    var.set_name(s, self.text(*name))?;
                    // a single multi-valued right side has no per-name initializer
                    if left.len() == right.len() {
                        self.initialize(s, var, right[i], true)?;
                    }
                    decl_stmt.add_declaration(s, var)?;
                    scope::add_declaration(s, var)?;
                }
                decl_stmt.into()
            }
            "return_statement" => {
                let ret = factory::new_return_statement(s, &self.ast(node))?;
                if let Some(list) = named_children(node).into_iter().next() {
                    let values = if list.kind() == "expression_list" { named_children(list) } else { vec![list] };
                    let value: Expression = match values.as_slice() {
                        [single] => self.handle_expression(s, *single)?,
                        _ => factory::new_unknown_expression(s, &self.ast(list))?.into(),
                    };
                    ret.set_return_value(s, value)?;
                }
                ret.into()
            }
            "expression_switch_statement" => self.handle_switch(s, node)?.into(),
            "expression_statement" => match named_children(node).into_iter().next() {
                Some(expr) => self.handle_expression(s, expr)?.into(),
                None => return Ok(None),
            },
            kind if is_expression(kind) => self.handle_expression(s, node)?.into(),
            _ => factory::new_unknown_expression(s, &self.ast(node))?.into(),
        };
        Ok(Some(statement))
    }

    /// Cases become labels inside the switch body, each followed by its arm's statements
    fn handle_switch(&self, s: &mut Session<'_>, node: Node) -> Result<SwitchStatement> {
        let switch = factory::new_switch_statement(s, &self.ast(node))?;
        if let Some(value) = node.child_by_field_name("value") {
            let selector = self.handle_expression(s, value)?;
            switch.set_selector(s, selector)?;
        }

        let body = factory::new_compound_statement(s, &self.ast(node))?;
        scope::enter_block(s, body);
        let result = self.handle_cases(s, body, node);
        scope::leave_scope(s);
        result?;

        switch.set_body(s, body)?;
        Ok(switch)
    }

    fn handle_cases(&self, s: &mut Session<'_>, body: CompoundStatement, node: Node) -> Result<()> {
        for arm in named_children(node) {
            match arm.kind() {
                "expression_case" => {
                    let values = arm.child_by_field_name("value").map(named_children).unwrap_or_default();
                    for value in values {
                        let case = factory::new_case_statement(s, &self.ast(arm))?;
                        let expr = self.handle_expression(s, value)?;
                        case.set_case_expression(s, expr)?;
                        body.add_statement(s, case)?;
                    }
                }
                "default_case" => {
                    let default = factory::new_default_statement(s, &self.ast(arm))?;
                    body.add_statement(s, default)?;
                }
                _ => continue,
            }
            let arm_statements = statements_of(arm)
                .into_iter()
                .filter(|n| arm.child_by_field_name("value") != Some(*n))
                .collect();
            self.handle_statements(s, body, arm_statements)?;
        }
        Ok(())
    }

    fn handle_expression(&self, s: &mut Session<'_>, node: Node) -> Result<Expression> {
        let result = self.expression(s, node);
        self.guard(node, result)
    }

    fn expression(&self, s: &mut Session<'_>, node: Node) -> Result<Expression> {
        let ast = self.ast(node);
        match node.kind() {
            "identifier" => {
                let name = self.text(node);
                let reference = factory::new_declared_reference_expression(s, &ast, name)?;
                if let Some(decl) = scope::resolve(s, name) {
                    reference.set_refers_to(s, decl)?;
                }
                Ok(reference.into())
            }
            "selector_expression" => {
                let field = node.child_by_field_name("field").map(|f| self.text(f)).unwrap_or_default();
                let member = factory::new_member_expression(s, &ast, field)?;
                if let Some(operand) = node.child_by_field_name("operand") {
                    let base = self.handle_expression(s, operand)?;
                    member.set_base(s, base)?;
                }
                Ok(member.into())
            }
            "call_expression" => self.handle_call(s, node),
            "parenthesized_expression" => match named_children(node).into_iter().next() {
                Some(inner) => self.handle_expression(s, inner),
                None => Ok(factory::new_unknown_expression(s, &ast)?.into()),
            },
            kind => match literal_type(kind) {
                Some(type_name) => {
                    let literal = factory::new_literal(s, &ast, self.text(node))?;
                    if let Some(type_name) = type_name {
                        let ty = self.bind_name(s, type_name)?;
                        literal.set_type(s, ty)?;
                    }
                    Ok(literal.into())
                }
                None => Ok(factory::new_unknown_expression(s, &ast)?.into()),
            },
        }
    }

    fn handle_call(&self, s: &mut Session<'_>, node: Node) -> Result<Expression> {
        let function = node.child_by_field_name("function");
        let name = match function {
            Some(f) if f.kind() == "selector_expression" => f
                .child_by_field_name("field")
                .map(|field| self.text(field))
                .unwrap_or_default(),
            Some(f) => self.text(f),
            None => "",
        };
        let call = factory::new_call_expression(s, &self.ast(node), name)?;

        if let Some(function) = function {
            let callee = self.handle_expression(s, function)?;
            call.set_callee(s, callee)?;
            if function.kind() == "identifier" {
                match scope::resolve(s, name) {
                    Some(Declaration::Function(target)) => call.add_invoke(s, target)?,
                    Some(Declaration::Method(target)) => call.add_invoke(s, target)?,
                    _ => {}
                }
            }
        }
        if let Some(arguments) = node.child_by_field_name("arguments") {
            for arg in named_children(arguments) {
                let expr = self.handle_expression(s, arg)?;
                call.add_argument(s, expr)?;
            }
        }
        Ok(call.into())
    }
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Named children, descending into one level of `list_kind` wrappers
fn flatten<'t>(node: Node<'t>, list_kind: &str) -> Vec<Node<'t>> {
    named_children(node)
        .into_iter()
        .flat_map(|child| {
            if child.kind() == list_kind {
                named_children(child)
            } else {
                vec![child]
            }
        })
        .collect()
}

/// Statements of a block or case arm, with or without a `statement_list` wrapper
fn statements_of(node: Node) -> Vec<Node> {
    flatten(node, "statement_list")
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Type of a literal node kind; `Some(None)` for untyped `nil`
fn literal_type(kind: &str) -> Option<Option<&'static str>> {
    let type_name = match kind {
        "int_literal" => "int",
        "float_literal" => "float64",
        "imaginary_literal" => "complex128",
        "rune_literal" => "rune",
        "interpreted_string_literal" | "raw_string_literal" => "string",
        "true" | "false" => "bool",
        "nil" => return Some(None),
        _ => return None,
    };
    Some(Some(type_name))
}

fn is_expression(kind: &str) -> bool {
    matches!(
        kind,
        "call_expression"
            | "identifier"
            | "selector_expression"
            | "parenthesized_expression"
            | "int_literal"
            | "float_literal"
            | "interpreted_string_literal"
            | "raw_string_literal"
    )
}

/// `*pkg.Point[T]` → `Point`
fn base_type_name(text: &str) -> &str {
    let text = text.trim().trim_start_matches('*');
    let text = text.split('[').next().unwrap_or(text);
    text.rsplit('.').next().unwrap_or(text).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryGraph;
    use crate::node::{Node as _, NodeKind};
    use crate::position::FileSet;
    use crate::session::BuildOptions;
    use crate::statements::{CaseStatement, DeclarationStatement};

    const GEO: &str = r#"package geo

import (
	"math"
	far "example.com/never/defined"
)

func (p Point) Distance(q Point) float {
	return math.Sqrt(1)
}

type Point struct {
	x, y int
}
"#;

    fn namespace_of(s: &Session<'_>, unit: TranslationUnitDeclaration) -> crate::declarations::NamespaceDeclaration {
        match unit.declarations(s).unwrap().into_iter().next() {
            Some(Declaration::Namespace(ns)) => ns,
            other => panic!("expected namespace, got {:?}", other),
        }
    }

    fn find_record(s: &Session<'_>, unit: TranslationUnitDeclaration, name: &str) -> RecordDeclaration {
        namespace_of(s, unit)
            .declarations(s)
            .unwrap()
            .into_iter()
            .find_map(|d| match d {
                Declaration::Record(r) if r.name(s).unwrap() == name => Some(r),
                _ => None,
            })
            .unwrap()
    }

    fn type_name(s: &Session<'_>, ty: Option<Type>) -> String {
        ty.unwrap().name(s).unwrap()
    }

    #[test]
    fn test_point_distance() {
        let mut fset = FileSet::new();
        let base = fset.add_file("geo.go", GEO);
        let file = fset.file(base).unwrap();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let unit = GoFrontend::new().translate(&mut s, file).unwrap();
        let point = find_record(&s, unit, "Point");
        assert_eq!(point.record_kind(&s).unwrap().as_deref(), Some("struct"));

        let fields = point.fields(&s).unwrap();
        let names: Vec<String> = fields.iter().map(|f| f.name(&s).unwrap()).collect();
        assert_eq!(names, ["x", "y"]);
        for field in &fields {
            assert_eq!(type_name(&s, field.type_of(&s).unwrap()), "int");
        }

        let methods = point.methods(&s).unwrap();
        assert_eq!(methods.len(), 1);
        let distance = methods[0];
        assert_eq!(distance.name(&s).unwrap(), "Distance");

        let receiver = distance.receiver(&s).unwrap().unwrap();
        assert!(!receiver.is_nil(&s));
        assert_eq!(receiver.name(&s).unwrap(), "p");
        assert_eq!(type_name(&s, receiver.type_of(&s).unwrap()), "Point");

        let returns = distance.return_types(&s).unwrap();
        assert_eq!(returns.len(), 1);
        assert_eq!(returns[0].name(&s).unwrap(), "float");

        let params = distance.parameters(&s).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name(&s).unwrap(), "q");
    }

    #[test]
    fn test_imports_are_lazy_includes() {
        let mut fset = FileSet::new();
        let base = fset.add_file("geo.go", GEO);
        let file = fset.file(base).unwrap();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let unit = GoFrontend::new().translate(&mut s, file).unwrap();

        let far = unit.include_by_name(&mut s, "far").unwrap().unwrap();
        assert_eq!(far.filename(&s).unwrap().as_deref(), Some("example.com/never/defined"));
        let math = unit.include_by_name(&mut s, "math").unwrap().unwrap();
        assert_eq!(math.filename(&s).unwrap().as_deref(), Some("math"));
        assert!(unit.include_by_name(&mut s, "defined").unwrap().is_none());
    }

    #[test]
    fn test_interfaces_and_embedding() {
        let src = r#"package io2

type Reader interface {
	Read(p []byte) (n int, err error)
}

type ReadCloser interface {
	Reader
	Close() error
}

type File struct {
	*Base
	name string
}
"#;
        let mut fset = FileSet::new();
        let base = fset.add_file("io.go", src);
        let file = fset.file(base).unwrap();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let unit = GoFrontend::new().translate(&mut s, file).unwrap();

        let reader = find_record(&s, unit, "Reader");
        assert_eq!(reader.record_kind(&s).unwrap().as_deref(), Some("interface"));
        let read = reader.methods(&s).unwrap()[0];
        assert_eq!(read.name(&s).unwrap(), "Read");
        assert_eq!(read.return_types(&s).unwrap().len(), 2);
        assert_eq!(type_name(&s, read.parameters(&s).unwrap()[0].type_of(&s).unwrap()), "[]byte");
        assert!(read.receiver(&s).unwrap().is_some());

        let closer = find_record(&s, unit, "ReadCloser");
        let supers = closer.super_classes(&s).unwrap();
        assert_eq!(supers.len(), 1);
        assert_eq!(supers[0].name(&s).unwrap(), "Reader");
        assert_eq!(closer.methods(&s).unwrap().len(), 1);

        let file_record = find_record(&s, unit, "File");
        let supers = file_record.super_classes(&s).unwrap();
        assert_eq!(supers[0].name(&s).unwrap(), "Base");
        let names: Vec<String> = file_record
            .fields(&s)
            .unwrap()
            .iter()
            .map(|f| f.name(&s).unwrap())
            .collect();
        assert_eq!(names, ["Base", "name"]);
    }

    #[test]
    fn test_bodies_switches_and_package_variables() {
        let src = r#"package calc

var Answer = 42

func helper() int { return 1 }

func classify(n int) string {
	total := helper()
	var label string
	switch n {
	case 1, 2:
		label = "small"
	default:
		label = "big"
	}
	return label
}
"#;
        let mut fset = FileSet::new();
        let base = fset.add_file("calc.go", src);
        let file = fset.file(base).unwrap();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let unit = GoFrontend::new().translate(&mut s, file).unwrap();
        let decls = namespace_of(&s, unit).declarations(&s).unwrap();

        let answer = decls
            .iter()
            .find_map(|d| match d {
                Declaration::Variable(v) => Some(*v),
                _ => None,
            })
            .unwrap();
        assert_eq!(answer.name(&s).unwrap(), "Answer");
        assert_eq!(type_name(&s, answer.type_of(&s).unwrap()), "int");
        let init = answer.initializer(&s).unwrap().unwrap();
        assert_eq!(init.kind(&s), Some(NodeKind::Literal));

        let functions: Vec<_> = decls
            .iter()
            .filter_map(|d| match d {
                Declaration::Function(f) => Some(*f),
                _ => None,
            })
            .collect();
        assert_eq!(functions.len(), 2);
        let (helper, classify) = (functions[0], functions[1]);

        let body = classify.body(&s).unwrap().unwrap();
        let block = CompoundStatement::from_node(&s, body.id()).unwrap();
        let statements = block.statements(&s).unwrap();
        let kinds: Vec<NodeKind> = statements.iter().map(|st| st.kind(&s).unwrap()).collect();
        assert_eq!(
            kinds,
            [
                NodeKind::DeclarationStatement,
                NodeKind::DeclarationStatement,
                NodeKind::SwitchStatement,
                NodeKind::ReturnStatement,
            ]
        );

        // total := helper() resolves the call within the unit
        let total_decl = DeclarationStatement::from_node(&s, statements[0].id()).unwrap();
        let total = total_decl.declarations(&s).unwrap()[0];
        let call = total.initializer(&s).unwrap().unwrap();
        let call = crate::statements::CallExpression::from_node(&s, call.id()).unwrap();
        assert_eq!(call.invokes(&s).unwrap(), vec![helper]);

        let switch = SwitchStatement::from_node(&s, statements[2].id()).unwrap();
        assert_eq!(switch.selector(&s).unwrap().unwrap().name(&s).unwrap(), "n");
        let arms = switch.body(&s).unwrap().unwrap().statements(&s).unwrap();
        let cases: Vec<CaseStatement> = arms
            .iter()
            .filter_map(|st| CaseStatement::from_node(&s, st.id()))
            .collect();
        assert_eq!(cases.len(), 2);
        let first = cases[0].case_expression(&s).unwrap().unwrap();
        assert_eq!(first.code(&s).unwrap().as_deref(), Some("1"));
        assert!(arms.iter().any(|st| st.kind(&s) == Some(NodeKind::DefaultStatement)));
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let mut fset = FileSet::new();
        let base = fset.add_file("broken.go", "package broken\n\nfunc f( {\n");
        let file = fset.file(base).unwrap();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let err = GoFrontend::new().translate(&mut s, file).unwrap_err();
        match err {
            Error::Translation { file, line, source, .. } => {
                assert_eq!(file, "broken.go");
                assert!(line >= 1);
                assert!(matches!(*source, Error::Parse(_)));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    fn declarations_of(src: &str, check: impl FnOnce(&Session<'_>, Vec<Declaration>)) {
        let mut fset = FileSet::new();
        let base = fset.add_file("p.go", src);
        let file = fset.file(base).unwrap();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let unit = GoFrontend::new().translate(&mut s, file).unwrap();
        let decls = namespace_of(&s, unit).declarations(&s).unwrap();
        check(&s, decls);
    }

    fn body_call(s: &Session<'_>, func: &impl FunctionLike) -> crate::statements::CallExpression {
        let body = func.body(s).unwrap().unwrap();
        let block = CompoundStatement::from_node(s, body.id()).unwrap();
        let first = block.statements(s).unwrap()[0];
        crate::statements::CallExpression::from_node(s, first.id()).unwrap()
    }

    #[test]
    fn test_init_functions_accumulate() {
        let src = "package p\n\nfunc init() { a() }\n\nfunc init() { b() }\n\nfunc a() {}\n\nfunc b() {}\n";
        declarations_of(src, |s, decls| {
            let functions: Vec<FunctionDeclaration> = decls
                .iter()
                .filter_map(|d| match d {
                    Declaration::Function(f) => Some(*f),
                    _ => None,
                })
                .collect();
            let names: Vec<String> = functions.iter().map(|f| f.name(s).unwrap()).collect();
            assert_eq!(names, ["init", "init", "a", "b"]);

            assert_eq!(body_call(s, &functions[0]).invokes(s).unwrap(), vec![functions[2]]);
            assert_eq!(body_call(s, &functions[1]).invokes(s).unwrap(), vec![functions[3]]);
        });
    }

    #[test]
    fn test_same_method_name_on_named_types() {
        let src = r#"package temp

type C float64
type F float64

func (c C) String() string { return "c" }

func (f *F) String() string { return "f" }

func (c C) String() string { return "again" }
"#;
        declarations_of(src, |s, decls| {
            let receivers: Vec<String> = decls
                .iter()
                .filter_map(|d| match d {
                    Declaration::Method(m) => Some(*m),
                    _ => None,
                })
                .map(|m| {
                    assert_eq!(m.name(s).unwrap(), "String");
                    let receiver = m.receiver(s).unwrap().unwrap();
                    type_name(s, receiver.type_of(s).unwrap())
                })
                .collect();
            // the redeclared C.String replaces the first one
            assert_eq!(receivers, ["*F", "C"]);
        });
    }

    #[test]
    fn test_calls_bind_to_later_functions() {
        let src = "package main\n\nvar started = boot()\n\nfunc main() { helper() }\n\nfunc helper() {}\n\nfunc boot() bool { return true }\n";
        declarations_of(src, |s, decls| {
            let find = |name: &str| {
                decls
                    .iter()
                    .find_map(|d| match d {
                        Declaration::Function(f) if f.name(s).unwrap() == name => Some(*f),
                        _ => None,
                    })
                    .unwrap()
            };
            assert_eq!(body_call(s, &find("main")).invokes(s).unwrap(), vec![find("helper")]);

            let started = decls
                .iter()
                .find_map(|d| match d {
                    Declaration::Variable(v) => Some(*v),
                    _ => None,
                })
                .unwrap();
            let init = started.initializer(s).unwrap().unwrap();
            let call = crate::statements::CallExpression::from_node(s, init.id()).unwrap();
            assert_eq!(call.invokes(s).unwrap(), vec![find("boot")]);
        });
    }

    #[test]
    fn test_named_types_starting_with_keywords() {
        let src = "package p\n\ntype funcMap map[string]int\n\nvar handlers funcMap\n\nvar done <-chan struct{}\n";
        declarations_of(src, |s, decls| {
            let vars: Vec<VariableDeclaration> = decls
                .iter()
                .filter_map(|d| match d {
                    Declaration::Variable(v) => Some(*v),
                    _ => None,
                })
                .collect();
            let handlers = vars[0].type_of(s).unwrap().unwrap();
            assert_eq!(handlers.name(s).unwrap(), "funcMap");
            assert_eq!(handlers.kind(s), Some(NodeKind::ObjectType));

            let done = vars[1].type_of(s).unwrap().unwrap();
            assert_eq!(done.name(s).unwrap(), "<-chan struct{}");
        });
    }

    #[test]
    fn test_base_type_name() {
        assert_eq!(base_type_name("*Point"), "Point");
        assert_eq!(base_type_name("List[T]"), "List");
        assert_eq!(base_type_name("geo.Point"), "Point");
    }
}
