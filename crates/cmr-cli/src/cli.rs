use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cmr",
    about = "In-memory content repository -- bootstrap and serve",
    version,
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
    /// Bootstrap the configured repositories and print a summary
    Init(InitArgs),
    /// Bootstrap, then serve the diagnostic HTTP endpoints
    Serve(ServeArgs),
}

/// Where bootstrap parameters come from.
#[derive(Args)]
pub struct BootstrapArgs {
    /// TOML file with `bind_addr` and a `[parameters]` table
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override one parameter, e.g. `-p filler.enable=true`
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

#[derive(Args)]
pub struct InitArgs {
    #[command(flatten)]
    pub bootstrap: BootstrapArgs,
}

#[derive(Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub bootstrap: BootstrapArgs,
    /// Listen address, overriding the config file
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in `{raw}`"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
