use monkey_walker::config::Settings;
use monkey_walker::{repl, Environment, Evaluator};
use std::sync::Once;
use std::{env, fs, process};

static TRACING_INIT: Once = Once::new();

/// Enable with e.g. `RUST_LOG=monkey_walker=debug`.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

fn run_script(path: &str, settings: &Settings) -> i32 {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("could not read {}: {}", path, err);
            return 2;
        }
    };

    let outcome = repl::interpret(
        &source,
        &Environment::new(),
        &mut Evaluator::new(settings.limits),
    );
    if outcome.is_failure() {
        eprintln!("{}", outcome);
        1
    } else {
        println!("{}", outcome);
        0
    }
}

fn main() {
    init_tracing();
    let settings = Settings::from_env();

    if let Some(path) = env::args().nth(1) {
        process::exit(run_script(&path, &settings));
    }

    println!("Hello! This is the Monkey programming language!");
    println!("Feel free to type in commands");
    if let Err(err) = repl::start(&settings) {
        eprintln!("{}", err);
        process::exit(1);
    }
}
