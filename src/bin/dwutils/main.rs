//! dwutils - Prepare exported data files for warehouse ingestion.
//!
//! Maps exported filenames to canonical folder names,
//! organizes export directories into that layout,
//! converts WhatsApp chats and JSON arrays to newline-delimited JSON,
//! and moves files in and out of object storage.

mod config;
mod dwutils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::config::{Config, StorageKind};
use crate::dwutils::DwUtils;

/// Prepare exported data files for warehouse ingestion.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Prepare exported data files for warehouse ingestion"
)]
pub struct DwUtilsArgs {
    #[command(subcommand)]
    pub command: Option<DwUtilsCommand>,

    /// Generate shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    pub completion: Option<Shell>,

    /// Print verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum DwUtilsCommand {
    /// Print the folder name for each filename
    #[command(name = "folder")]
    Folder {
        /// Filenames or file paths
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Print a unique output path for each file path
    #[command(name = "unique")]
    Unique {
        /// File paths
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the load format for the files of a data source
    #[command(name = "format")]
    Format {
        /// Data source directory name
        data_source: String,

        /// Optional export root directory containing the data source
        #[arg(value_hint = clap::ValueHint::DirPath)]
        path: Option<PathBuf>,
    },

    /// Copy an export directory into the folder name layout
    #[command(name = "organize")]
    Organize {
        /// Optional input directory
        #[arg(value_hint = clap::ValueHint::DirPath)]
        path: Option<PathBuf>,

        /// Optional output directory (default is a sibling directory with "-organized" suffix)
        #[arg(short, long, name = "OUTPUT_PATH")]
        output: Option<String>,

        /// Only print changes without copying files
        #[arg(short, long)]
        print: bool,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Convert JSON files to newline-delimited JSON
        #[arg(short = 'j', long)]
        json: bool,
    },

    /// Convert a WhatsApp chat export to newline-delimited JSON
    #[command(name = "whatsapp")]
    Whatsapp {
        /// Exported chat text file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        chat: PathBuf,

        /// Optional output file (default is "<folder name>.json" next to the chat)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Object storage operations
    #[command(name = "bucket")]
    Bucket {
        #[command(subcommand)]
        action: BucketAction,

        /// Storage backend
        #[arg(short, long, value_enum)]
        storage: Option<StorageKind>,
    },
}

#[derive(Subcommand, Debug)]
pub enum BucketAction {
    /// List object keys in a bucket
    #[command(name = "ls")]
    List {
        bucket: String,

        /// Print the folder name next to each JSON and CSV key
        #[arg(short, long)]
        folders: bool,
    },

    /// Print an object as text
    #[command(name = "cat")]
    Read { bucket: String, key: String },

    /// Upload a local file
    #[command(name = "upload")]
    Upload {
        bucket: String,

        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Object key (default is the filename)
        key: Option<String>,
    },

    /// Copy an object
    #[command(name = "cp")]
    Copy {
        source_bucket: String,
        source_key: String,
        destination_bucket: String,
        destination_key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = DwUtilsArgs::parse();

    if let Some(ref shell) = args.completion {
        return warehouse_utils::generate_shell_completion(
            *shell,
            DwUtilsArgs::command(),
            true,
            env!("CARGO_BIN_NAME"),
        );
    }

    let Some(command) = args.command.as_ref() else {
        DwUtilsArgs::command().print_help()?;
        return Ok(());
    };

    let config = Config::from_args(&args)?;
    DwUtils::new(config).run(command).await
}
