pub mod ast;
pub mod config;
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod repl;
mod stack;
pub mod token;

pub use environment::Environment;
pub use evaluator::{eval, Evaluator, FatalError, Limits};
pub use lexer::Lexer;
pub use object::Object;
pub use parser::{ParseError, Parser};
