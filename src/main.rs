use anyhow::{Context, Result};
use clap::Parser;
use ferrftpd::constants::DEFAULT_CONFIG_PATH;
use ferrftpd::core_auth::helper::hash_password;
use ferrftpd::core_cli::Cli;
use ferrftpd::core_log::init_logger;
use ferrftpd::{Config, FtpServer};
use log::{error, info, warn};
use std::path::Path;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    if let Some(password) = &args.hash_password {
        println!("{}", hash_password(password)?);
        return Ok(());
    }

    init_logger(args.verbose);

    let mut config = load_config(&args)?;
    if let Some(root) = args.root {
        config.server.root_dir = root;
    }
    if let Some(port) = args.port {
        config.server.listen_port = port;
    }
    config.validate()?;

    let server = FtpServer::from_config(&config)?;
    let cancel = CancellationToken::new();

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
        shutdown.cancel();
    });

    info!(
        "Serving {} on {}",
        config.server.root_dir.display(),
        config.listen_addr()
    );
    server.run(config.listen_addr(), cancel).await
}

/// Reads the file given on the command line, else the default one when it exists.
fn load_config(args: &Cli) -> Result<Config> {
    match &args.config {
        Some(path) => Config::load_from_file(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::load_from_file(DEFAULT_CONFIG_PATH)
                .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_PATH))
        }
        None => {
            warn!(
                "No configuration file found at {}, using defaults",
                DEFAULT_CONFIG_PATH
            );
            Ok(Config::default())
        }
    }
}
