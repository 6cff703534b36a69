//! Configuration loader.

use crate::consistency;
use crate::document::{self, ConfigFormat};
use crate::error::{ConfigError, ConfigResult};
use crate::inherit;
use crate::ordering::{self, OrderPolicy};
use crate::path::FieldPath;
use crate::prepare::prepare;
use crate::probe::{LocalFs, PathProbe};
use crate::registry::Registries;
use crate::schema::Config;
use crate::structure::StructureValidator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Whether referenced dataset and checkpoint paths must exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathCheck {
    #[default]
    Enforce,
    Skip,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Directory relative dataset paths are resolved against, and the
    /// include directory for documents loaded from a string or value.
    /// Defaults to the current directory.
    pub base_dir: Option<PathBuf>,
    pub path_check: PathCheck,
    pub order_policy: OrderPolicy,
}

impl LoadOptions {
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_path_check(mut self, check: PathCheck) -> Self {
        self.path_check = check;
        self
    }

    #[must_use]
    pub fn with_order_policy(mut self, policy: OrderPolicy) -> Self {
        self.order_policy = policy;
        self
    }
}

/// Loads, validates and types a configuration document.
///
/// Stages run in a fixed order and the first failure is returned:
/// parse, `_base_` inheritance, preparation, structural walk, typed
/// deserialization, cross-field consistency, pipeline ordering, then path
/// existence.
pub struct ConfigLoader {
    registries: Registries,
    options: LoadOptions,
    probe: Option<Arc<dyn PathProbe>>,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registries: Registries::builtin(),
            options: LoadOptions::default(),
            probe: None,
        }
    }

    #[must_use]
    pub fn with_registries(mut self, registries: Registries) -> Self {
        self.registries = registries;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the filesystem probe used for path existence checks.
    #[must_use]
    pub fn with_path_probe(mut self, probe: Arc<dyn PathProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    #[must_use]
    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    #[must_use]
    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load a document file; the format follows the file extension.
    pub fn load_path(&self, path: impl AsRef<Path>) -> ConfigResult<Config> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading config");
        let doc = document::read(path)?;
        let dir = path.parent().map_or_else(|| self.include_dir(), Path::to_path_buf);
        let doc = inherit::resolve(doc, &dir, Some(path))?;
        self.finish(doc)
    }

    pub fn load_str(&self, text: &str, format: ConfigFormat) -> ConfigResult<Config> {
        let doc = document::parse(text, format, "<string>")?;
        self.load_value(doc)
    }

    pub fn load_value(&self, value: Value) -> ConfigResult<Config> {
        let doc = inherit::resolve(value, &self.include_dir(), None)?;
        self.finish(doc)
    }

    fn include_dir(&self) -> PathBuf {
        self.options.base_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    fn finish(&self, doc: Value) -> ConfigResult<Config> {
        let doc = prepare(doc, &self.registries);

        StructureValidator::new(&self.registries).validate(&doc)?;
        debug!("Structure validated");

        let config: Config = serde_json::from_value(doc).map_err(|e| {
            ConfigError::mismatch(FieldPath::root(), "configuration document", e.to_string())
        })?;

        consistency::check(&config)?;
        ordering::check(&config, self.options.order_policy)?;
        debug!(policy = %self.options.order_policy, "Pipelines checked");

        if self.options.path_check == PathCheck::Enforce {
            self.check_paths(&config)?;
        }

        info!(
            model = config.model.name(),
            backbone = config.model.backbone().name(),
            train_steps = config.train_pipeline.len(),
            "Config loaded"
        );
        Ok(config)
    }

    fn check_paths(&self, config: &Config) -> ConfigResult<()> {
        let local;
        let probe: &dyn PathProbe = if let Some(probe) = &self.probe {
            probe.as_ref()
        } else {
            local = LocalFs::new(self.options.base_dir.clone());
            &local
        };

        let mut targets: Vec<(FieldPath, &str)> = Vec::new();
        for (split, dataset) in config.data.datasets() {
            let path = FieldPath::key("data").field(split);
            targets.push((path.field("ann_file"), dataset.ann_file()));
            targets.push((path.field("img_prefix"), dataset.img_prefix()));
        }
        let checkpoints = [
            ("load_from", &config.load_from),
            ("resume_from", &config.resume_from),
        ];
        for (key, value) in checkpoints {
            if let Some(target) = value.as_deref().filter(|t| !t.contains("://")) {
                targets.push((FieldPath::key(key), target));
            }
        }

        for (path, target) in targets {
            if !probe.exists(Path::new(target)) {
                return Err(ConfigError::PathNotFound {
                    path,
                    target: PathBuf::from(target),
                });
            }
            debug!(field = %path, file = target, "Path exists");
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("registries", &self.registries)
            .field("options", &self.options)
            .field("custom_probe", &self.probe.is_some())
            .finish()
    }
}
