use super::{Expression, Identifier};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let(LetStatement),
    Return(ReturnStatement),
    Expr(ExpressionStatement),
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Let(stmt) => write!(f, "{}", stmt),
            Self::Return(stmt) => write!(f, "{}", stmt),
            Self::Expr(stmt) => write!(f, "{}", stmt),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetStatement {
    pub name: Identifier,
    pub value: Expression,
}

impl Display for LetStatement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "let {} = {};", self.name, self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub return_value: Option<Expression>,
}

impl Display for ReturnStatement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match &self.return_value {
            Some(value) => write!(f, "return {};", value),
            None => write!(f, "return;"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub expression: Expression,
}

// The trailing semicolon keeps adjacent statements from re-parsing as a call,
// e.g. `f; (x);` must not print as `f(x)`.
impl Display for ExpressionStatement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{};", self.expression)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

impl BlockStatement {
    /// Whether evaluating this block binds any names of its own.
    pub fn declares_bindings(&self) -> bool {
        self.statements
            .iter()
            .any(|stmt| matches!(stmt, Statement::Let(_)))
    }

    pub(super) fn take_expressions(&mut self, out: &mut Vec<Expression>) {
        for stmt in self.statements.drain(..) {
            match stmt {
                Statement::Let(stmt) => out.push(stmt.value),
                Statement::Return(stmt) => out.extend(stmt.return_value),
                Statement::Expr(stmt) => out.push(stmt.expression),
            }
        }
    }
}

impl Display for BlockStatement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{{ ")?;
        for stmt in self.statements.iter() {
            write!(f, "{} ", stmt)?;
        }
        write!(f, "}}")
    }
}
