use crate::config::Settings;
use crate::environment::Environment;
use crate::evaluator::{Evaluator, FatalError};
use crate::lexer::Lexer;
use crate::object::Object;
use crate::parser::{ParseError, Parser};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fmt::{self, Display, Formatter};

/// What running one piece of source produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Value(Object),
    ParseErrors(Vec<ParseError>),
    Fatal(FatalError),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        match self {
            Self::Value(obj) => obj.is_error(),
            Self::ParseErrors(_) | Self::Fatal(_) => true,
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Value(Object::Error(err)) => write!(f, "ERROR: {}", err),
            Self::Value(obj) => write!(f, "{}", obj),
            Self::ParseErrors(errors) => {
                let lines: Vec<String> = errors.iter().map(|err| format!("\t{}", err)).collect();
                write!(f, "{}", lines.join("\n"))
            }
            Self::Fatal(err) => write!(f, "FATAL: {}", err),
        }
    }
}

/// Runs `source` through lexer, parser and evaluator against `env`.
pub fn interpret(source: &str, env: &Environment, evaluator: &mut Evaluator) -> Outcome {
    match Parser::new(Lexer::new(source.to_owned())).parse_program() {
        Err(errors) => Outcome::ParseErrors(errors),
        Ok(program) => match evaluator.eval(&program, env) {
            Ok(val) => Outcome::Value(val),
            Err(err) => Outcome::Fatal(err),
        },
    }
}

pub fn start(settings: &Settings) -> rustyline::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let env = Environment::new();
    let mut evaluator = Evaluator::new(settings.limits);

    loop {
        match editor.readline(&settings.prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                println!("{}", interpret(&line, &env, &mut evaluator));
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(()),
            Err(err) => return Err(err),
        }
    }
}
