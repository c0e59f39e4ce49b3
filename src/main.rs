mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use stockroom_core::config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise use defaults based on the verbose
    // flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "stockroom=trace,stockroom_server=trace,stockroom_db=debug,tower_http=debug".to_string()
        } else {
            "stockroom=debug,stockroom_server=debug,stockroom_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = Config::load_or_default(cli.config.as_deref());
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            tracing::info!("Starting stockroom server");
            tracing::info!(
                "Server will listen on {}:{}",
                config.server.host,
                config.server.port
            );

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(stockroom_server::start(config))?;
            Ok(())
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            let config = Config::load_or_default(path.as_deref());
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration OK");
            } else {
                for w in &warnings {
                    println!("warning: {w}");
                }
            }
            Ok(())
        }
        Commands::Version => {
            println!("stockroom {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
