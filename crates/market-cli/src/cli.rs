use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use market_crypto::HashAlgorithm;

#[derive(Parser)]
#[command(
    name = "market",
    about = "Market catalog: item ingestion with content-hash stamping",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the catalog server and repair sweeper
    Serve(ServeArgs),
    /// Compute the content hash of an item's canonical fields
    Hash(HashArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Listen address, overrides the config file
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Public host[:port] used in picture URLs (env: MARKET_ADDRESS)
    #[arg(long)]
    pub address: Option<String>,
    /// Picture directory
    #[arg(long)]
    pub blob_root: Option<PathBuf>,
    #[arg(long)]
    pub algorithm: Option<HashAlgorithm>,
}

#[derive(Args)]
pub struct HashArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value = "")]
    pub specifications: String,
    #[arg(long, default_value = "")]
    pub external_link: String,
    /// Full picture URL as stored on the record
    #[arg(long, default_value = "")]
    pub picture: String,
    #[arg(long, default_value = "keccak256")]
    pub algorithm: HashAlgorithm,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve_defaults() {
        let cli = Cli::try_parse_from(["market", "serve"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert!(args.config.is_none());
            assert!(args.bind.is_none());
            assert!(args.algorithm.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_serve_overrides() {
        let cli = Cli::try_parse_from([
            "market", "serve", "--bind", "0.0.0.0:8080", "--address", "shop.example",
            "--blob-root", "/srv/pictures", "--algorithm", "blake3",
        ])
        .unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("0.0.0.0:8080".parse().unwrap()));
            assert_eq!(args.address.as_deref(), Some("shop.example"));
            assert_eq!(args.blob_root, Some(PathBuf::from("/srv/pictures")));
            assert_eq!(args.algorithm, Some(HashAlgorithm::Blake3));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_serve_rejects_bad_bind() {
        assert!(Cli::try_parse_from(["market", "serve", "--bind", "nowhere"]).is_err());
    }

    #[test]
    fn parse_hash() {
        let cli = Cli::try_parse_from([
            "market", "hash", "--name", "Chair", "--external-link", "https://x",
        ])
        .unwrap();
        if let Command::Hash(args) = cli.command {
            assert_eq!(args.name, "Chair");
            assert_eq!(args.external_link, "https://x");
            assert_eq!(args.description, "");
            assert_eq!(args.algorithm, HashAlgorithm::Keccak256);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_hash_requires_name() {
        assert!(Cli::try_parse_from(["market", "hash"]).is_err());
    }

    #[test]
    fn parse_config() {
        let cli = Cli::try_parse_from(["market", "config", "-c", "market.toml"]).unwrap();
        if let Command::Config(args) = cli.command {
            assert_eq!(args.config, Some(PathBuf::from("market.toml")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["market", "--verbose", "config"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["market", "--format", "json", "config"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
