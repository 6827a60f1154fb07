use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use market_server::{MarketServer, ServerConfig};
use market_types::CanonicalFields;
use serde_json::json;

use crate::cli::*;

/// Environment variable carrying the public address of a deployment.
pub const ADDRESS_ENV: &str = "MARKET_ADDRESS";

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Hash(args) => cmd_hash(args, &cli.format).await,
        Command::Config(args) => cmd_config(args, &cli.format),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
    match path {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(ServerConfig::default()),
    }
}

/// Layer flags over the environment over the config file.
fn apply_overrides(
    mut config: ServerConfig,
    args: &ServeArgs,
    env_address: Option<String>,
) -> ServerConfig {
    if let Some(address) = env_address.filter(|a| !a.is_empty()) {
        config.public_address = address;
    }
    if let Some(address) = &args.address {
        config.public_address = address.clone();
    }
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(root) = &args.blob_root {
        config.blob_root = root.clone();
    }
    if let Some(algorithm) = args.algorithm {
        config.hash_algorithm = algorithm;
    }
    config
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let config = apply_overrides(config, &args, std::env::var(ADDRESS_ENV).ok());
    tracing::debug!(?config, "effective configuration");

    println!(
        "{} Market server on {} (public: {}, pictures: {}, hash: {})",
        "✓".green().bold(),
        config.bind_addr.to_string().bold(),
        config.public_address.cyan(),
        config.blob_root.display(),
        config.hash_algorithm.to_string().yellow(),
    );
    let server = MarketServer::open(config)
        .await
        .context("opening picture store")?;
    server.serve().await?;
    Ok(())
}

async fn cmd_hash(args: HashArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let fields = CanonicalFields {
        name: args.name,
        description: args.description,
        specifications: args.specifications,
        external_link: args.external_link,
        picture: args.picture,
    };
    let hash = args.algorithm.oracle().hash(&fields).await?;
    match format {
        OutputFormat::Text => println!("{} {}", args.algorithm.to_string().dimmed(), hash.to_string().yellow()),
        OutputFormat::Json => println!(
            "{}",
            json!({ "algorithm": args.algorithm.as_str(), "hash": hash, "fields": fields })
        ),
    }
    Ok(())
}

fn cmd_config(args: ConfigArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    match format {
        OutputFormat::Text => print!("{}", config.to_toml()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}
