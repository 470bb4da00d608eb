use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "linguist",
    about = "Linguist background: translation requests, settings and caches over a message channel",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve requests as JSON lines on stdin/stdout
    Serve(ServeArgs),
    /// Run persisted-state migrations and exit
    Migrate(MigrateArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Directory holding persisted state
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Host settings file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// External translator command, split on whitespace
    #[arg(long)]
    pub translator_cmd: Option<String>,
}

#[derive(Args)]
pub struct MigrateArgs {
    /// Directory holding persisted state
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Host settings file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
