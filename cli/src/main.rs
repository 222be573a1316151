use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use alvm_cli::{Options, Outcome};

/// Assembles and runs an ALVM program.
#[derive(Parser)]
#[command(name = "alvm")]
struct Cli {
    /// Assembly source file.
    source_file: PathBuf,

    /// Raise the log level (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    let options = Options { source_path: cli.source_file };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let outcome = match alvm_cli::run(&options, &mut out) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(1);
        }
    };

    match &outcome {
        Outcome::Success(r0) => println!("{}", r0),
        Outcome::AsmFailure(err) => eprintln!("assembler error at {}: {}", err.pos, err.kind),
        Outcome::RuntimeFailure(fault) => eprintln!("runtime fault: {}", fault),
    }

    ExitCode::from(outcome.exit_code() as u8)
}
