use patty::filesystem::NodeId;
use patty::layout::{Layout, LayoutError};
use patty::manager::{FileManager, ManagerError};
use snafu::prelude::*;
use tracing::debug;

use crate::application::RuntimeConfig;
use crate::application::printer::{describe, render_tree};
use crate::cli::Command;

pub struct Application;

impl Application {
    pub async fn run(config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let config: RuntimeConfig = config.into();
        config.color.apply();

        let layout = Layout::from_path(config.layout.clone())
            .await
            .context(LayoutSnafu)?;
        let mut manager = FileManager::new();
        layout.populate(&mut manager).context(LayoutSnafu)?;
        debug!("Tree holds {} nodes", manager.tree().node_count());

        for line in Self::execute(&manager, &config.command)? {
            println!("{line}");
        }
        Ok(())
    }

    /// Runs one query against a populated manager and returns the lines to print.
    pub fn execute(
        manager: &FileManager,
        command: &Command,
    ) -> Result<Vec<String>, ApplicationError> {
        debug!("Executing {:?}", command);
        match command {
            Command::Tree { path } => {
                let start = Self::resolve(manager, path)?;
                render_tree(manager, start).context(QuerySnafu)
            }
            Command::List { path } => {
                let start = Self::resolve(manager, path)?;
                manager
                    .list(start)
                    .context(QuerySnafu)?
                    .into_iter()
                    .map(|child| manager.node(child).map(describe).context(QuerySnafu))
                    .collect()
            }
            Command::Count { path, images } => {
                let start = Self::resolve(manager, path)?;
                let count = if *images {
                    manager.image_file_amount(start)
                } else {
                    manager.file_amount(start)
                };
                Ok(vec![count.context(QuerySnafu)?.to_string()])
            }
            Command::Find { name, path } => {
                let start = Self::resolve(manager, path)?;
                let result = manager.find_by_file_name(start, name).context(QuerySnafu)?;
                Ok(vec![result.to_string()])
            }
        }
    }

    fn resolve(manager: &FileManager, path: &str) -> Result<NodeId, ApplicationError> {
        manager.resolve(path).context(PathNotFoundSnafu { path })
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while loading the layout"))]
    LayoutError { source: LayoutError },
    #[snafu(display("No node exists at '{}'", path))]
    PathNotFound { path: String },
    #[snafu(display("Query failed"))]
    QueryError { source: ManagerError },
}
