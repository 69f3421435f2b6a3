use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use iyf_cli::commands::{check, config, run};
use iyf_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so they never interleave with the reminder banner
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let settings = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?settings, "loaded configuration");

    match command {
        Commands::Run => run::run(&settings, cli.config.as_deref())?,
        Commands::Check { at } => check::run(&mut std::io::stdout(), &settings, at.as_deref())?,
        Commands::Config => config::run(&mut std::io::stdout(), &settings)?,
    }

    Ok(())
}
