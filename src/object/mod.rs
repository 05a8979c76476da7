use crate::ast;
use crate::environment::Environment;
use std::fmt::{self, Debug, Display, Formatter};
use std::rc::Rc;

mod eval_error;
pub use eval_error::EvalError;

pub const TRUE: Object = Object::Boolean(true);
pub const FALSE: Object = Object::Boolean(false);
pub const NULL: Object = Object::Null;

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Function(Rc<FunctionObject>),
    ReturnValue(Box<Object>),
    Error(EvalError),
    Integer(i64),
    Boolean(bool),
    Null,
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Function(func) => write!(f, "{}", func),
            Self::ReturnValue(obj) => write!(f, "{}", obj),
            Self::Error(err) => write!(f, "{}", err),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Null => write!(f, "null"),
        }
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        if b {
            TRUE
        } else {
            FALSE
        }
    }
}

impl From<EvalError> for Object {
    fn from(err: EvalError) -> Self {
        Self::Error(err)
    }
}

impl From<FunctionObject> for Object {
    fn from(func: FunctionObject) -> Self {
        Self::Function(Rc::new(func))
    }
}

impl Object {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Function(_) => "FUNCTION",
            Self::ReturnValue(_) => "RETURN_VALUE",
            Self::Error(_) => "ERROR",
            Self::Boolean(_) => "BOOLEAN",
            Self::Integer(_) => "INTEGER",
            Self::Null => "NULL",
        }
    }

    /// NULL and FALSE are falsy; every other value, including `0`, is truthy.
    pub fn truth_value(&self) -> bool {
        !matches!(self, Self::Boolean(false) | Self::Null)
    }

    /// Identity comparison backing `==`/`!=` on anything that is not a pair of
    /// integers. Booleans and null are singletons, so equal values are the same
    /// object; functions are the same object only if they share an allocation.
    /// Any other pairing is never identical.
    pub fn is_identical(&self, other: &Object) -> bool {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Null, Self::Null) => true,
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A function value: the literal it was created from plus the environment that was
/// active when the literal was evaluated.
pub struct FunctionObject {
    pub literal: Rc<ast::FunctionLiteral>,
    pub env: Environment,
}

impl FunctionObject {
    pub fn new(literal: Rc<ast::FunctionLiteral>, env: Environment) -> Self {
        Self { literal, env }
    }

    pub fn parameters(&self) -> &[ast::Identifier] {
        &self.literal.parameters
    }

    pub fn body(&self) -> &ast::BlockStatement {
        &self.literal.body
    }
}

// Functions compare by identity. Comparing closure environments structurally could
// recurse forever through a function bound in its own closure.
impl PartialEq for FunctionObject {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Debug for FunctionObject {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("FunctionObject")
            .field("literal", &self.literal.to_string())
            .finish()
    }
}

impl Display for FunctionObject {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.literal)
    }
}
