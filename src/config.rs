use crate::evaluator::Limits;
use std::env;
use std::str::FromStr;

pub static DEFAULT_PROMPT: &str = ">> ";

/// Host settings, read from the process environment.
///
/// - `MONKEY_MAX_DEPTH`: deepest allowed function-call nesting
/// - `MONKEY_MAX_STEPS`: evaluation step budget per input (unbounded when unset)
/// - `MONKEY_PROMPT`: REPL prompt
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub limits: Limits,
    pub prompt: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            prompt: DEFAULT_PROMPT.to_owned(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let max_depth = parse_var(&lookup, "MONKEY_MAX_DEPTH").unwrap_or(defaults.limits.max_depth);
        let max_steps = parse_var(&lookup, "MONKEY_MAX_STEPS").or(defaults.limits.max_steps);
        let prompt = lookup("MONKEY_PROMPT").unwrap_or(defaults.prompt);

        Self {
            limits: Limits {
                max_depth,
                max_steps,
            },
            prompt,
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring invalid setting");
            None
        }
    }
}
