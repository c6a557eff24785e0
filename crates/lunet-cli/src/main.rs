use std::path::PathBuf;
use std::process::ExitCode;

use lunet_lang::{compile, Interpreter, InterpreterConfig};

const USAGE: &str = "Usage: lunet [--max-call-depth <n>] <file>";

/// Large enough for the default call depth with room to spare; the
/// interpreter recurses on the native stack.
const STACK_SIZE: usize = 64 * 1024 * 1024;

struct Options {
    path: PathBuf,
    config: InterpreterConfig,
}

enum Parsed {
    Run(Options),
    Help,
}

fn parse_args() -> Result<Parsed, String> {
    let mut args = pico_args::Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        return Ok(Parsed::Help);
    }

    let mut config = InterpreterConfig::new();
    match args.opt_value_from_str::<_, usize>("--max-call-depth") {
        Ok(Some(depth)) => config = config.with_max_call_depth(depth),
        Ok(None) => {}
        Err(e) => return Err(e.to_string()),
    }

    let free = args.finish();
    match free.as_slice() {
        [path] if !path.to_string_lossy().starts_with('-') => {
            Ok(Parsed::Run(Options { path: PathBuf::from(path), config }))
        }
        [] => Err("missing input file".to_string()),
        [arg] => Err(format!("unknown option `{}`", arg.to_string_lossy())),
        _ => Err(format!("expected one input file, got {}", free.len())),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Only initialize if RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_level(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn run(options: Options) -> ExitCode {
    let path = &options.path;
    if !path.is_file() {
        eprintln!("error: file not found: {}", path.display());
        return ExitCode::FAILURE;
    }
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let chunk = match compile(&source) {
        Ok(chunk) => chunk,
        Err(errors) => {
            for e in &errors {
                eprintln!("{}: {e}", path.display());
            }
            return ExitCode::FAILURE;
        }
    };

    tracing::debug!(path = %path.display(), "running");
    match Interpreter::new(options.config).execute(&chunk) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let options = match parse_args() {
        Ok(Parsed::Run(options)) => options,
        Ok(Parsed::Help) => {
            println!("{USAGE}");
            println!("Options:");
            println!("  -h, --help: Print this help message");
            println!("  --max-call-depth <n>: Maximum nested function calls (default: 200)");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let worker = std::thread::Builder::new()
        .name("lunet".to_string())
        .stack_size(STACK_SIZE)
        .spawn(move || run(options));
    match worker.map(|handle| handle.join()) {
        Ok(Ok(code)) => code,
        Ok(Err(_)) => {
            eprintln!("error: interpreter thread panicked");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: cannot start interpreter thread: {e}");
            ExitCode::FAILURE
        }
    }
}
