//! Keyforge CLI entrypoint.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod handlers;
mod output;

use crate::commands::{Commands, ConfigCommands, ProductCommands};
use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "keyforge")]
#[command(author, version, about = "Keyforge license management", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load()?;

    match cli.command {
        Commands::Migrate => handlers::migrate(&config).await?,
        Commands::Product { command } => match command {
            ProductCommands::Add(args) => handlers::add_product(&config, args).await?,
            ProductCommands::List => handlers::list_products(&config).await?,
        },
        Commands::Generate(args) => handlers::generate(&config, args).await?,
        Commands::Validate { key, device } => handlers::validate(&config, &key, &device).await?,
        Commands::Download { key } => handlers::download(&config, &key).await?,
        Commands::Show { key } => handlers::show(&config, &key).await?,
        Commands::Alerts { key } => handlers::alerts(&config, &key).await?,
        Commands::Config { command } => match command {
            ConfigCommands::Show => handlers::show_config(&config)?,
            ConfigCommands::Path => handlers::show_config_path()?,
        },
    }

    Ok(())
}
