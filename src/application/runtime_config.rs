use std::path::PathBuf;

use crate::application::data::ColorChoice;
use crate::cli::{Cli, Command};

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub layout: PathBuf,
    pub command: Command,
    pub color: ColorChoice,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            layout: cli.layout,
            command: cli.command,
            color: cli.color,
        }
    }
}
