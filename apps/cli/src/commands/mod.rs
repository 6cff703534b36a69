//! Command implementations for the dbcfg CLI.

pub mod components;
pub mod profiles;
pub mod show;
pub mod validate;

use crate::config::CliConfig;
use clap::Args;
use dbnet_config::{ConfigLoader, LoadOptions, OrderPolicy, PathCheck};
use std::path::PathBuf;

/// Arguments shared by every command that loads a document.
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Configuration file (.toml, .json, .yaml)
    pub file: PathBuf,

    /// Directory dataset paths are resolved against (default: current directory)
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Do not check that dataset and checkpoint paths exist
    #[arg(long)]
    pub skip_path_check: bool,

    /// Pipeline ordering policy (enforce, ignore)
    #[arg(long)]
    pub order_policy: Option<OrderPolicy>,
}

impl LoadArgs {
    /// Loader configured from the flags, falling back to the CLI config file.
    pub fn loader(&self, cli_config: &CliConfig) -> ConfigLoader {
        let mut options = LoadOptions::default().with_order_policy(
            self.order_policy
                .or(cli_config.order_policy)
                .unwrap_or_default(),
        );

        let base_dir = self
            .base_dir
            .clone()
            .or_else(|| cli_config.base_dir.as_ref().map(PathBuf::from));
        if let Some(dir) = base_dir {
            options = options.with_base_dir(dir);
        }
        if self.skip_path_check || cli_config.check_paths == Some(false) {
            options = options.with_path_check(PathCheck::Skip);
        }

        tracing::debug!(?options, "Loader options");
        ConfigLoader::new().with_options(options)
    }
}
