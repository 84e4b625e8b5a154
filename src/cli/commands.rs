use anyhow::Result;
use colored::Colorize;

use crate::{
    app::{get_config_dir, init_config, Config},
    models::ModelFactory,
};

use super::Commands;

/// Handle CLI subcommands
pub async fn handle_command(command: &Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::Init => {
            println!("Initializing Bolt Chat configuration...");
            let path = init_config()?;
            println!("Configuration ready at: {}", path.display());
            Ok(true)
        }
        Commands::Version => {
            show_version();
            Ok(true)
        }
        Commands::Status => {
            show_status(config).await?;
            Ok(true)
        }
        Commands::Chat => Ok(false), // Continue to chat interface
    }
}

/// Show version information
pub fn show_version() {
    println!("Bolt Chat v{}", env!("CARGO_PKG_VERSION"));
    println!("   AI shopping assistant for the Bolt storefront");
}

/// Show configuration and backend status
async fn show_status(config: &Config) -> Result<()> {
    println!("Bolt Chat Status:");
    println!();

    // Check configuration
    let config_path = get_config_dir()?.join("config.toml");
    if config_path.exists() {
        println!("  {} Configuration: {}", "[OK]".green(), config_path.display());
    } else {
        println!("  {} Configuration: Not found (using defaults)", "[WARNING]".yellow());
    }

    println!("  Model: {}", config.model.model);

    // Check API key and backend
    match ModelFactory::create(config) {
        Ok(backend) => {
            println!("  {} API key: Set", "[OK]".green());
            if backend.validate_connection().await.unwrap_or(false) {
                println!("  {} Gemini API: Reachable", "[OK]".green());
            } else {
                println!("  {} Gemini API: Not reachable", "[ERROR]".red());
            }
        }
        Err(e) => {
            println!("  {} {}", "[ERROR]".red(), e);
        }
    }

    println!();
    Ok(())
}
