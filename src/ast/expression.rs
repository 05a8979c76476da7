use super::{statement::BlockStatement, Identifier};
use crate::stack::ensure_sufficient_stack;
use crate::token::Token;
use std::convert::TryFrom;
use std::fmt::{Display, Formatter};
use std::mem;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(Identifier),
    IntegerLiteral(i64),
    Boolean(bool),
    Prefix(PrefixExpression),
    Infix(InfixExpression),
    If(IfExpression),
    Function(Rc<FunctionLiteral>),
    Call(CallExpression),
}

impl Expression {
    /// Moves the directly nested expressions out into `out`, leaving leaves behind.
    fn take_children(&mut self, out: &mut Vec<Expression>) {
        match self {
            Self::Identifier(_) | Self::IntegerLiteral(_) | Self::Boolean(_) => {}
            Self::Prefix(expr) => out.push(take(&mut expr.right)),
            Self::Infix(expr) => {
                out.push(take(&mut expr.left));
                out.push(take(&mut expr.right));
            }
            Self::If(expr) => {
                out.push(take(&mut expr.condition));
                expr.consequence.take_expressions(out);
                if let Some(alt) = &mut expr.alternative {
                    alt.take_expressions(out);
                }
            }
            // A literal still shared with a function value is dropped by its last owner.
            Self::Function(func) => {
                if let Some(func) = Rc::get_mut(func) {
                    func.body.take_expressions(out);
                }
            }
            Self::Call(expr) => {
                out.push(take(&mut expr.function));
                out.append(&mut expr.arguments);
            }
        }
    }
}

fn take(expr: &mut Box<Expression>) -> Expression {
    mem::replace(&mut **expr, Expression::Boolean(false))
}

// Trees nest as deep as the source does; the derived drop would recurse once per level.
impl Drop for Expression {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.take_children(&mut pending);
        while let Some(mut expr) = pending.pop() {
            expr.take_children(&mut pending);
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        ensure_sufficient_stack(|| match self {
            Self::Identifier(ident) => write!(f, "{}", ident),
            Self::IntegerLiteral(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Prefix(expr) => write!(f, "{}", expr),
            Self::Infix(expr) => write!(f, "{}", expr),
            Self::If(expr) => write!(f, "{}", expr),
            Self::Function(func) => write!(f, "{}", func),
            Self::Call(expr) => write!(f, "{}", expr),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Operator {
    #[strum(to_string = "!")]
    Bang,
    #[strum(to_string = "-")]
    Minus,
    #[strum(to_string = "+")]
    Plus,
    #[strum(to_string = "*")]
    Asterisk,
    #[strum(to_string = "/")]
    Slash,
    #[strum(to_string = "<")]
    LT,
    #[strum(to_string = ">")]
    GT,
    #[strum(to_string = "==")]
    Eq,
    #[strum(to_string = "!=")]
    NotEq,
}

impl TryFrom<&Token> for Operator {
    type Error = ();

    fn try_from(input: &Token) -> Result<Self, Self::Error> {
        Ok(match input {
            Token::Bang => Self::Bang,
            Token::Minus => Self::Minus,
            Token::Plus => Self::Plus,
            Token::Asterisk => Self::Asterisk,
            Token::Slash => Self::Slash,
            Token::LT => Self::LT,
            Token::GT => Self::GT,
            Token::Eq => Self::Eq,
            Token::NotEq => Self::NotEq,
            _ => return Err(()),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrefixExpression {
    pub operator: Operator,
    pub right: Box<Expression>,
}

impl Display for PrefixExpression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "({}{})", self.operator, self.right)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfixExpression {
    pub left: Box<Expression>,
    pub operator: Operator,
    pub right: Box<Expression>,
}

impl Display for InfixExpression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "({} {} {})", self.left, self.operator, self.right)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfExpression {
    pub condition: Box<Expression>,
    pub consequence: BlockStatement,
    pub alternative: Option<BlockStatement>,
}

impl Display for IfExpression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "if ({}) {}", self.condition, self.consequence)?;
        if let Some(alt) = &self.alternative {
            write!(f, " else {}", alt)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
}

impl Display for FunctionLiteral {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let identifier_names: Vec<String> =
            self.parameters.iter().map(Identifier::to_string).collect();

        write!(f, "fn({}) {}", identifier_names.join(", "), self.body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub function: Box<Expression>,
    pub arguments: Vec<Expression>,
}

impl Display for CallExpression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let argument_names: Vec<String> =
            self.arguments.iter().map(Expression::to_string).collect();

        write!(f, "{}({})", self.function, argument_names.join(", "))
    }
}
