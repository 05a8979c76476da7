use crate::ast::{self, Expression, Node, Operator, Statement};
use crate::environment::Environment;
use crate::object::{EvalError, FunctionObject, Object, NULL};
use crate::stack::ensure_sufficient_stack;
use custom_error::custom_error;
use std::rc::Rc;

custom_error! {
    #[derive(Clone, PartialEq)]
    pub FatalError

    StackExhausted{depth: usize} = "stack exhausted: call depth exceeded {depth}",
    StepBudgetExceeded{limit: u64} = "evaluation exceeded its budget of {limit} steps",
}

/// Bounds on a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Deepest allowed nesting of function calls.
    pub max_depth: usize,
    /// Evaluation steps allowed before giving up, if bounded.
    pub max_steps: Option<u64>,
}

pub const DEFAULT_MAX_DEPTH: usize = 10_000;

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_steps: None,
        }
    }
}

/// Why evaluation stopped early. A `return` unwinds to the nearest function call or
/// the program. Language errors become `Object::Error` at the top level; fatal
/// conditions are handed to the host untouched.
enum Halt {
    Return(Object),
    Error(EvalError),
    Fatal(FatalError),
}

impl From<EvalError> for Halt {
    fn from(err: EvalError) -> Self {
        Self::Error(err)
    }
}

impl From<FatalError> for Halt {
    fn from(err: FatalError) -> Self {
        Self::Fatal(err)
    }
}

type EvalResult = Result<Object, Halt>;

#[derive(Debug, Default)]
pub struct Evaluator {
    limits: Limits,
    depth: usize,
    steps: u64,
}

/// Evaluates `node` with the default limits.
pub fn eval<'a>(node: impl Into<Node<'a>>, env: &Environment) -> Result<Object, FatalError> {
    Evaluator::default().eval(node, env)
}

impl Evaluator {
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            depth: 0,
            steps: 0,
        }
    }

    pub fn eval<'a>(
        &mut self,
        node: impl Into<Node<'a>>,
        env: &Environment,
    ) -> Result<Object, FatalError> {
        self.depth = 0;
        self.steps = 0;

        match self.eval_node(node.into(), env) {
            Ok(obj) => Ok(obj),
            // Only reachable when a lone statement or block is evaluated.
            Err(Halt::Return(obj)) => Ok(Object::ReturnValue(Box::new(obj))),
            Err(Halt::Error(err)) => Ok(Object::Error(err)),
            Err(Halt::Fatal(err)) => {
                tracing::warn!(%err, steps = self.steps, "evaluation aborted");
                Err(err)
            }
        }
    }

    fn eval_node(&mut self, node: Node, env: &Environment) -> EvalResult {
        match node {
            Node::Program(program) => self.eval_program(program, env),
            Node::Statement(stmt) => self.eval_statement(stmt, env),
            Node::Block(block) => self.eval_block(block, env),
            Node::Expression(expr) => self.eval_expression(expr, env),
        }
    }

    fn eval_program(&mut self, program: &ast::Program, env: &Environment) -> EvalResult {
        catch_return(self.eval_statements(&program.statements, env))
    }

    fn eval_block(&mut self, block: &ast::BlockStatement, env: &Environment) -> EvalResult {
        if block.declares_bindings() {
            let scope = Environment::enclosed(env);
            self.eval_statements(&block.statements, &scope)
        } else {
            self.eval_statements(&block.statements, env)
        }
    }

    fn eval_statements(&mut self, statements: &[Statement], env: &Environment) -> EvalResult {
        let mut result = NULL;
        for stmt in statements.iter() {
            result = self.eval_statement(stmt, env)?;
        }
        Ok(result)
    }

    fn eval_statement(&mut self, stmt: &Statement, env: &Environment) -> EvalResult {
        self.tick()?;
        match stmt {
            Statement::Expr(stmt) => self.eval_expression(&stmt.expression, env),
            Statement::Let(stmt) => {
                let value = self.eval_expression(&stmt.value, env)?;
                env.set(&stmt.name.value, value);
                Ok(NULL)
            }
            Statement::Return(stmt) => {
                let value = match &stmt.return_value {
                    Some(expr) => self.eval_expression(expr, env)?,
                    None => NULL,
                };
                Err(Halt::Return(value))
            }
        }
    }

    fn eval_expression(&mut self, expr: &Expression, env: &Environment) -> EvalResult {
        ensure_sufficient_stack(|| {
            self.tick()?;
            match expr {
                Expression::IntegerLiteral(n) => Ok(Object::Integer(*n)),
                Expression::Boolean(b) => Ok(Object::from(*b)),
                Expression::Identifier(ident) => env.get(&ident.value).ok_or_else(|| {
                    EvalError::IdentifierNotFound {
                        id: ident.value.clone(),
                    }
                    .into()
                }),
                Expression::Prefix(prefix) => {
                    let right = self.eval_expression(&prefix.right, env)?;
                    Ok(eval_prefix_expression(prefix.operator, right)?)
                }
                Expression::Infix(infix) => {
                    let left = self.eval_expression(&infix.left, env)?;
                    let right = self.eval_expression(&infix.right, env)?;
                    Ok(eval_infix_expression(infix.operator, left, right)?)
                }
                Expression::If(expr) => self.eval_if_expression(expr, env),
                Expression::Function(literal) => {
                    Ok(FunctionObject::new(Rc::clone(literal), env.clone()).into())
                }
                Expression::Call(call) => {
                    let function = self.eval_expression(&call.function, env)?;
                    let arguments = call
                        .arguments
                        .iter()
                        .map(|arg| self.eval_expression(arg, env))
                        .collect::<Result<Vec<_>, _>>()?;
                    self.apply_function(function, arguments)
                }
            }
        })
    }

    fn eval_if_expression(&mut self, expr: &ast::IfExpression, env: &Environment) -> EvalResult {
        let condition = self.eval_expression(&expr.condition, env)?;

        if condition.truth_value() {
            self.eval_block(&expr.consequence, env)
        } else if let Some(alternative) = &expr.alternative {
            self.eval_block(alternative, env)
        } else {
            Ok(NULL)
        }
    }

    fn apply_function(&mut self, function: Object, arguments: Vec<Object>) -> EvalResult {
        let func = match function {
            Object::Function(func) => func,
            obj => {
                return Err(EvalError::NotAFunction {
                    type_name: obj.type_name(),
                }
                .into())
            }
        };

        let want = func.parameters().len();
        if arguments.len() != want {
            return Err(EvalError::IncorrectArity {
                got: arguments.len(),
                want,
            }
            .into());
        }

        if self.depth >= self.limits.max_depth {
            return Err(FatalError::StackExhausted {
                depth: self.limits.max_depth,
            }
            .into());
        }

        tracing::trace!(depth = self.depth, arity = want, "applying function");

        let call_env = Environment::enclosed(&func.env);
        for (param, arg) in func.parameters().iter().zip(arguments) {
            call_env.set(&param.value, arg);
        }

        self.depth += 1;
        let result = self.eval_statements(&func.body().statements, &call_env);
        self.depth -= 1;

        catch_return(result)
    }

    fn tick(&mut self) -> Result<(), Halt> {
        self.steps += 1;
        match self.limits.max_steps {
            Some(limit) if self.steps > limit => {
                Err(FatalError::StepBudgetExceeded { limit }.into())
            }
            _ => Ok(()),
        }
    }
}

fn catch_return(result: EvalResult) -> EvalResult {
    match result {
        Err(Halt::Return(obj)) => Ok(obj),
        result => result,
    }
}

fn eval_prefix_expression(operator: Operator, right: Object) -> Result<Object, EvalError> {
    match (operator, right) {
        (Operator::Bang, right) => Ok(Object::from(!right.truth_value())),
        (Operator::Minus, Object::Integer(n)) => Ok(Object::Integer(n.wrapping_neg())),
        (operator, right) => Err(EvalError::UnknownPrefixOperator {
            operator,
            operand: right.type_name(),
        }),
    }
}

fn eval_infix_expression(
    operator: Operator,
    left: Object,
    right: Object,
) -> Result<Object, EvalError> {
    match (&left, &right) {
        (Object::Integer(x), Object::Integer(y)) => eval_integer_infix_expression(operator, *x, *y),
        _ => match operator {
            Operator::Eq => Ok(Object::from(left.is_identical(&right))),
            Operator::NotEq => Ok(Object::from(!left.is_identical(&right))),
            op => Err(EvalError::binary_op_error(
                left.type_name(),
                op,
                right.type_name(),
            )),
        },
    }
}

fn eval_integer_infix_expression(
    operator: Operator,
    left: i64,
    right: i64,
) -> Result<Object, EvalError> {
    Ok(match operator {
        Operator::Plus => Object::Integer(left.wrapping_add(right)),
        Operator::Minus => Object::Integer(left.wrapping_sub(right)),
        Operator::Asterisk => Object::Integer(left.wrapping_mul(right)),
        Operator::Slash => {
            if right == 0 {
                return Err(EvalError::DivisionByZero);
            }
            Object::Integer(left.wrapping_div(right))
        }
        Operator::LT => Object::from(left < right),
        Operator::GT => Object::from(left > right),
        Operator::Eq => Object::from(left == right),
        Operator::NotEq => Object::from(left != right),
        Operator::Bang => {
            return Err(EvalError::UnknownInfixOperator {
                left: "INTEGER",
                operator,
                right: "INTEGER",
            })
        }
    })
}
