//! `deolang` — run-to-completion entry point for the interpreter core.
//! Loads a source grid, optionally a pre-supplied input file, and
//! drives the interpreter with `tracing`-backed diagnostics. The
//! debugger GUI and the `deolangc` AOT compiler utility are separate
//! tools this binary does not attempt to replace.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use deolang::{InputValue, Interpreter};
use tracing_subscriber::EnvFilter;

/// Run a Deolang source grid.
#[derive(Parser, Debug)]
#[command(name = "deolang", version, about = "Deolang interpreter")]
struct Args {
    /// Path to the Deolang source file (.deo, .txt).
    source: PathBuf,

    /// File supplying the pre-supplied input buffer the `I` opcode
    /// reads from. Without this, `I` falls back to reading a line
    /// from stdin per request.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Run a bounded number of steps instead of to completion; 0
    /// (the default) runs until the program halts.
    #[arg(long, default_value_t = 0)]
    steps: i64,

    /// Increase log verbosity (-v, -vv, ...).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "deolang=warn",
        1 => "deolang=info",
        2 => "deolang=debug",
        _ => "deolang=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Blocking stdin-line input source, used when no `--input` file is
/// supplied.
fn cli_input() -> InputValue {
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => InputValue::None,
        Ok(_) => {
            let line = line.trim_end_matches(['\n', '\r']).to_string();
            if line.is_empty() {
                InputValue::None
            } else {
                InputValue::Str(line)
            }
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let input_text = match &args.input {
        Some(path) => match deolang::loader::read_input_file(path) {
            Ok(text) => Some(text),
            Err(err) => {
                eprintln!("Error reading input file: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let mut interp = Interpreter::new(input_text, Some(Box::new(cli_input)));
    if let Err(err) = interp.load(Some(&args.source), None) {
        eprintln!("Error reading source file: {err}");
        return ExitCode::FAILURE;
    }
    interp.set_output_sink(|s| {
        print!("{s}");
        let _ = io::stdout().flush();
    });

    if let Err(err) = interp.run(args.steps) {
        eprintln!("Error: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
