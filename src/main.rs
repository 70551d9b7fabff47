use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tiny_basic_interpreter::Executor;
use tracing_subscriber::EnvFilter;

/// Run a tiny BASIC program
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the program source file
    program: PathBuf,
}

fn main() -> ExitCode {
    install_tracing();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("ERROR: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(&cli.program)
        .with_context(|| format!("failed to read {}", cli.program.display()))?;

    let mut executor = Executor::new(&source)?;
    executor.run()?;
    Ok(())
}

fn install_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
