//! nsync CLI entry point.

use clap::Parser;
use nsync::cli::commands::{self, Workspace};
use nsync::cli::{Cli, Commands, OutputFormat};
use nsync::config::load_dotenv;
use nsync::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    // .env must be loaded before parsing so clap sees NOTION_TOKEN from it.
    load_dotenv();
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    init_tracing(cli.verbose, cli.quiet);

    let json = cli.json || cli.format == OutputFormat::Json;

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet || matches!(e, Error::RunFailures { .. }) {
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
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,reqwest=info,hyper=info"),
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
    match &cli.command {
        Commands::Version => commands::version::execute(json),
        Commands::Completions { shell } => commands::completions::execute(shell),

        Commands::Status => {
            let ws = workspace(cli)?;
            commands::status::execute(&ws, json)
        }

        Commands::Sync { dry_run } => {
            let ws = workspace(cli)?;
            commands::sync::execute(
                &ws,
                cli.token.as_deref(),
                cli.api_base.as_deref(),
                *dry_run,
                json,
            )
        }
    }
}

fn workspace(cli: &Cli) -> Result<Workspace, Error> {
    Workspace::resolve(
        cli.config.as_deref(),
        cli.offsets.as_deref(),
        cli.output_dir.as_deref(),
    )
}
