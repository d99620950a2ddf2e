//! Rage CLI entry point.

use clap::Parser;
use rage::cli::commands;
use rage::cli::{Cli, Commands};
use rage::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR non-TTY stdout
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn,mongodb=error"),
            1 => EnvFilter::new("info,mongodb=warn"),
            2 => EnvFilter::new("debug,mongodb=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let config = cli.config.as_deref();
    let mirror = cli.mirror.as_deref();

    match &cli.command {
        Commands::Pull(args) => commands::sync::execute_pull(args, config, mirror, json),
        Commands::Push(args) => commands::sync::execute_push(args, config, mirror, json),
        Commands::Status => commands::status::execute(config, mirror, json),
        Commands::Watch { selection, interval } => {
            commands::watch::execute(selection, *interval, config, mirror, json)
        }
        Commands::Init { force } => commands::init::execute(config, *force, json),
        Commands::Completions { shell } => commands::completions::execute(*shell),
        Commands::Version => commands::version::execute(json),
    }
}
