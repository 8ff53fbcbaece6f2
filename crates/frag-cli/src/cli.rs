use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "fragments",
    about = "Fragment storage service: typed byte payloads per owner, with conversion",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML config file. Without one, fragments live in memory.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

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
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Store a file as a new fragment
    Put(PutArgs),
    /// Write a fragment's data to stdout, converted with ID.EXT
    Get(GetArgs),
    /// List an owner's fragments
    List(ListArgs),
    /// Show a fragment's metadata
    Info(InfoArgs),
    /// Delete a fragment
    Rm(RmArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Overrides `bind_addr` from the config file.
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

/// The principal (e.g. an email address) a command acts for.
#[derive(Args)]
pub struct OwnerArg {
    #[arg(short, long)]
    pub owner: String,
}

#[derive(Args)]
pub struct PutArgs {
    #[command(flatten)]
    pub owner: OwnerArg,
    #[arg(short = 't', long = "type")]
    pub content_type: String,
    pub file: PathBuf,
}

#[derive(Args)]
pub struct GetArgs {
    #[command(flatten)]
    pub owner: OwnerArg,
    pub id: String,
    /// Write to a file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub owner: OwnerArg,
    #[arg(short, long)]
    pub expand: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub owner: OwnerArg,
    pub id: String,
}

#[derive(Args)]
pub struct RmArgs {
    #[command(flatten)]
    pub owner: OwnerArg,
    pub id: String,
}
