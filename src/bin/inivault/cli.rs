use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI для IniVault: версионированный INI store с shadow-копией и черновиком `<path>~`
#[derive(Parser, Debug)]
#[command(name = "inivault", version, about = "IniVault CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Create a new store (replaces an existing file) and publish it
    Init {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, default_value_t = 1)]
        version: i32,
    },
    /// Print one value (dotted key: section.key)
    Get {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        key: String,
    },
    /// Set one value and publish
    Set {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        key: String,
        /// Literal value; `@file` reads it from a file, `-` from stdin
        #[arg(long)]
        value: String,
    },
    /// Remove one key and publish
    Del {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        key: String,
    },
    /// List keys. --json prints a JSON object of key -> value.
    Keys {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the file version, or set it with --set
    Version {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        set: Option<i32>,
    },
    /// Paths, existence flags, version and metrics
    Status {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Delete the store file and its draft
    Remove {
        #[arg(long)]
        path: PathBuf,
    },
}
