use std::path::PathBuf;

use clap::{Parser, Subcommand};
use patty::layout::LAYOUT_FILE_NAME;

use crate::application::data::{ColorChoice, LogLevel};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Query an in-memory file tree built from a layout file")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(long, short, default_value = "warn", value_enum, global = true)]
    pub log_level: LogLevel,

    /// YAML file describing the tree
    #[clap(long, short = 'f', default_value = LAYOUT_FILE_NAME, global = true)]
    pub layout: PathBuf,

    #[clap(long, default_value = "auto", value_enum, global = true)]
    pub color: ColorChoice,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the subtree below a folder
    Tree {
        #[clap(default_value = "/")]
        path: String,
    },
    /// List the direct children of a node
    List {
        #[clap(default_value = "/")]
        path: String,
    },
    /// Count the files below a node
    Count {
        #[clap(default_value = "/")]
        path: String,
        /// Only count images
        #[clap(long)]
        images: bool,
    },
    /// Find the first file with the given name
    Find {
        name: String,
        #[clap(default_value = "/")]
        path: String,
    },
}
