//! proxy-usage-monitor - version 0.1.0
//!
//! Resource usage monitor and alerter for game-server proxies.
//! This is the main entry point that sets up logging and dispatches subcommands.

mod cli;
mod commands;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::debug;

use cli::{Args, Commands, LogLevel};
use commands::{
    command_config, command_env, command_run, command_sample, command_status, command_test,
    command_validate, ConfigSource,
};

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = match args.log_level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    // stderr keeps stdout clean for `config -o -` and json output
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    debug!("Logging initialized with level: {:?}", args.log_level);
    Ok(())
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_logging(&args)?;

    let source = ConfigSource::from_args(&args);

    let result = match args.command.unwrap_or(Commands::Run) {
        Commands::Run => command_run(source).await,
        Commands::Validate => command_validate(source),
        Commands::Test { target } => command_test(source, target).await,
        Commands::Status { format } => command_status(source, format),
        Commands::Env { format } => command_env(format),
        Commands::Sample { iterations } => command_sample(source, iterations).await,
        Commands::Config {
            output,
            format,
            commented,
        } => command_config(output, format, commented),
    };

    if let Err(e) = result {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
