//! Command-line interface for ntemoji

use clap::{Parser, Subcommand};
use ntemoji_core::config::DEFAULT_INI_PATH;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ntemoji")]
#[command(about = "ntemoji - Export QQ NT personal stickers and repair their file names", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export one account's sticker collection
    Export {
        /// Output directory for the exported stickers
        #[arg(short, long)]
        output: PathBuf,

        /// QQ account number (omit to auto-pick when exactly one exists)
        #[arg(short, long)]
        account: Option<String>,

        /// QQ config file holding the user-data location
        #[arg(long, default_value = DEFAULT_INI_PATH)]
        config: PathBuf,

        /// Copy only; skip the extension-repair pass
        #[arg(long)]
        no_rename: bool,
    },

    /// Show the resolved user-data root and the accounts found there
    Locate {
        /// QQ config file holding the user-data location
        #[arg(long, default_value = DEFAULT_INI_PATH)]
        config: PathBuf,
    },

    /// Repair image file extensions in a directory tree
    FixExt {
        /// Directory to walk
        dir: PathBuf,
    },

    /// Resolve and print the text encoding of a config file
    SniffEncoding {
        /// File to inspect
        file: PathBuf,

        /// Marker substring expected in correctly decoded content
        #[arg(long, default_value = "[UserDataSet]")]
        marker: String,
    },
}
