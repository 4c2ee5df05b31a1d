use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Alfred workflow backend for TOTP codes.
///
/// Without a subcommand, prints the current code for `--key`.
#[derive(Parser, Debug)]
#[command(
    name = "oxidauth",
    about = "Manage TOTP secrets and generate codes for Alfred",
    version,
    propagate_version = true,
    subcommand_negates_reqs = true
)]
pub struct Cli {
    /// Account whose code to generate.
    #[arg(long, required = true)]
    pub key: Option<String>,

    /// Secret store location (defaults to ~/.google-authenticator/config.db).
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print Alfred menu items for the typed words.
    Query { args: Vec<String> },
    /// Store a secret under a key.
    Add {
        #[arg(long)]
        key: String,
        #[arg(long)]
        secret: String,
    },
    /// Remove the secret stored under a key.
    Del {
        #[arg(long)]
        key: String,
    },
}
