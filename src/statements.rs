//! Statement and expression handles
//!
//! Just enough vocabulary for function bodies, variable initializers and
//! switch arms. Expressions are statements too, so an expression handle
//! converts into a [`Statement`] wherever a statement is expected.

use crate::declarations::{Declaration, FunctionDeclaration, HasName, VariableDeclaration};
use crate::node::{handle, read_many, read_one, Node, NodeKind};
use crate::session::Session;
use crate::types::HasType;
use crate::Result;

handle!(
    /// Any statement, expressions included
    Statement => CompoundStatement
        | DeclarationStatement
        | ReturnStatement
        | SwitchStatement
        | CaseStatement
        | DefaultStatement
        | Literal
        | DeclaredReferenceExpression
        | MemberExpression
        | CallExpression
        | UnknownExpression
);
handle!(
    /// Any expression
    Expression => Literal | DeclaredReferenceExpression | MemberExpression | CallExpression | UnknownExpression
);
handle!(
    /// A block: an ordered list of statements
    CompoundStatement => CompoundStatement
);
handle!(
    /// Introduces local declarations
    DeclarationStatement => DeclarationStatement
);
handle!(ReturnStatement => ReturnStatement);
handle!(SwitchStatement => SwitchStatement);
handle!(
    /// One `case` arm label; the arm's statements follow it in the switch body
    CaseStatement => CaseStatement
);
handle!(DefaultStatement => DefaultStatement);
handle!(Literal => Literal);
handle!(
    /// A name used as a value
    DeclaredReferenceExpression => DeclaredReferenceExpression
);
handle!(
    /// `base.name`
    MemberExpression => MemberExpression
);
handle!(CallExpression => CallExpression);
handle!(
    /// An expression the frontend does not model
    UnknownExpression => UnknownExpression
);

macro_rules! widen {
    ($target:ident: $($handle:ident),+ $(,)?) => {
        $(
            impl From<$handle> for $target {
                fn from(node: $handle) -> Self {
                    $target(node.id())
                }
            }
        )+
    };
}

widen!(Statement:
    Expression,
    CompoundStatement,
    DeclarationStatement,
    ReturnStatement,
    SwitchStatement,
    CaseStatement,
    DefaultStatement,
    Literal,
    DeclaredReferenceExpression,
    MemberExpression,
    CallExpression,
    UnknownExpression,
);
widen!(Expression:
    Literal,
    DeclaredReferenceExpression,
    MemberExpression,
    CallExpression,
    UnknownExpression,
);

impl HasName for DeclaredReferenceExpression {}
impl HasName for MemberExpression {}
impl HasName for CallExpression {}

impl HasType for Expression {}
impl HasType for Literal {}
impl HasType for DeclaredReferenceExpression {}
impl HasType for MemberExpression {}
impl HasType for CallExpression {}
impl HasType for UnknownExpression {}

impl CompoundStatement {
    pub fn add_statement(&self, s: &mut Session<'_>, statement: impl Into<Statement>) -> Result<()> {
        s.invoke(self.0, "addStatement", statement.into().id()).map(drop)
    }

    pub fn statements(&self, s: &Session<'_>) -> Result<Vec<Statement>> {
        read_many(s, self.0, "statements")
    }
}

impl DeclarationStatement {
    pub fn add_declaration(&self, s: &mut Session<'_>, decl: impl Into<Declaration>) -> Result<()> {
        s.invoke(self.0, "addDeclaration", decl.into().id()).map(drop)
    }

    pub fn declarations(&self, s: &Session<'_>) -> Result<Vec<VariableDeclaration>> {
        read_many(s, self.0, "declarations")
    }
}

impl ReturnStatement {
    pub fn set_return_value(&self, s: &mut Session<'_>, value: impl Into<Expression>) -> Result<()> {
        s.set(self.0, "returnValue", value.into().id().into())
    }

    pub fn return_value(&self, s: &Session<'_>) -> Result<Option<Expression>> {
        read_one(s, self.0, "returnValue")
    }
}

impl SwitchStatement {
    pub fn set_selector(&self, s: &mut Session<'_>, selector: impl Into<Expression>) -> Result<()> {
        s.set(self.0, "selector", selector.into().id().into())
    }

    pub fn selector(&self, s: &Session<'_>) -> Result<Option<Expression>> {
        read_one(s, self.0, "selector")
    }

    pub fn set_body(&self, s: &mut Session<'_>, body: CompoundStatement) -> Result<()> {
        s.set(self.0, "body", body.id().into())
    }

    pub fn body(&self, s: &Session<'_>) -> Result<Option<CompoundStatement>> {
        read_one(s, self.0, "body")
    }
}

impl CaseStatement {
    /// Attach the expression this arm tests against
    pub fn set_case_expression(&self, s: &mut Session<'_>, expr: impl Into<Expression>) -> Result<()> {
        s.set(self.0, "caseExpression", expr.into().id().into())
    }

    pub fn case_expression(&self, s: &Session<'_>) -> Result<Option<Expression>> {
        read_one(s, self.0, "caseExpression")
    }
}

impl Literal {
    pub fn set_value(&self, s: &mut Session<'_>, value: &str) -> Result<()> {
        s.set(self.0, "value", value.into())
    }

    pub fn value(&self, s: &Session<'_>) -> Result<Option<String>> {
        Ok(s.get(self.0, "value")?.as_text().map(str::to_string))
    }
}

impl DeclaredReferenceExpression {
    pub fn set_refers_to(&self, s: &mut Session<'_>, decl: impl Into<Declaration>) -> Result<()> {
        s.set(self.0, "refersTo", decl.into().id().into())
    }

    pub fn refers_to(&self, s: &Session<'_>) -> Result<Option<Declaration>> {
        Ok(s.get(self.0, "refersTo")?
            .as_node()
            .and_then(|id| Declaration::from_node(s, id)))
    }
}

impl MemberExpression {
    pub fn set_base(&self, s: &mut Session<'_>, base: impl Into<Expression>) -> Result<()> {
        s.set(self.0, "base", base.into().id().into())
    }

    pub fn base(&self, s: &Session<'_>) -> Result<Option<Expression>> {
        read_one(s, self.0, "base")
    }
}

impl CallExpression {
    pub fn set_callee(&self, s: &mut Session<'_>, callee: impl Into<Expression>) -> Result<()> {
        s.set(self.0, "callee", callee.into().id().into())
    }

    pub fn callee(&self, s: &Session<'_>) -> Result<Option<Expression>> {
        read_one(s, self.0, "callee")
    }

    pub fn add_argument(&self, s: &mut Session<'_>, arg: impl Into<Expression>) -> Result<()> {
        s.invoke(self.0, "addArgument", arg.into().id()).map(drop)
    }

    pub fn arguments(&self, s: &Session<'_>) -> Result<Vec<Expression>> {
        read_many(s, self.0, "arguments")
    }

    pub fn add_invoke(&self, s: &mut Session<'_>, target: impl Into<FunctionDeclaration>) -> Result<()> {
        s.invoke(self.0, "addInvoke", target.into().id()).map(drop)
    }

    pub fn invokes(&self, s: &Session<'_>) -> Result<Vec<FunctionDeclaration>> {
        read_many(s, self.0, "invokes")
    }

    /// Receiver/package part of a `base.name(...)` call
    pub fn qualifier(&self, s: &Session<'_>) -> Result<Option<String>> {
        let Some(callee) = self.callee(s)? else {
            return Ok(None);
        };
        if s.kind_of(callee.id()) != Some(NodeKind::MemberExpression) {
            return Ok(None);
        }
        match MemberExpression(callee.id()).base(s)? {
            Some(base) => Ok(Some(base.name(s)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryGraph;
    use crate::factory;
    use crate::position::{FileSet, Pos, Span};
    use crate::session::BuildOptions;

    fn fixture() -> (FileSet, Span) {
        let mut fset = FileSet::new();
        let base = fset.add_file("main.go", "package main\n\nfunc main() { fmt.Println(1) }\n");
        (fset, Span::new(Pos(base.0 + 14), Pos(base.0 + 45)))
    }

    #[test]
    fn test_compound_statement_order_and_nil_check() {
        let (fset, span) = fixture();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let block = factory::new_compound_statement(&mut s, &span).unwrap();
        assert!(!block.is_nil(&s));
        assert!(CompoundStatement(crate::node::NodeId(500)).is_nil(&s));

        let ret = factory::new_return_statement(&mut s, &span).unwrap();
        let call = factory::new_call_expression(&mut s, &span, "Println").unwrap();
        block.add_statement(&mut s, call).unwrap();
        block.add_statement(&mut s, ret).unwrap();

        assert_eq!(
            block.statements(&s).unwrap(),
            vec![Statement::from(call), Statement::from(ret)]
        );
    }

    #[test]
    fn test_case_expression() {
        let (fset, span) = fixture();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let case = factory::new_case_statement(&mut s, &span).unwrap();
        assert!(case.case_expression(&s).unwrap().is_none());

        let one = factory::new_literal(&mut s, &span, "1").unwrap();
        case.set_case_expression(&mut s, one).unwrap();
        assert_eq!(case.case_expression(&s).unwrap(), Some(Expression::from(one)));
        assert_eq!(one.value(&s).unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_call_qualifier() {
        let (fset, span) = fixture();
        let mut graph = MemoryGraph::new();
        let mut s = Session::new(&fset, &mut graph, BuildOptions::default());

        let call = factory::new_call_expression(&mut s, &span, "Println").unwrap();
        assert!(call.qualifier(&s).unwrap().is_none());

        let pkg = factory::new_declared_reference_expression(&mut s, &span, "fmt").unwrap();
        let member = factory::new_member_expression(&mut s, &span, "Println").unwrap();
        member.set_base(&mut s, pkg).unwrap();
        call.set_callee(&mut s, member).unwrap();

        assert_eq!(call.qualifier(&s).unwrap().as_deref(), Some("fmt"));
    }
}
