//! Typed configuration schema.
//!
//! Each discriminated section is a closed enum whose variants carry their own
//! field struct, so consumers match exhaustively instead of probing keys.

pub mod data;
pub mod model;
pub mod norm;
pub mod pipeline;
pub mod runtime;

pub use data::{DataConfig, DataloaderCfg, DatasetSpec, EvaluationConfig, IcdarDatasetSpec};
pub use model::{
    BackboneSpec, ConvLayerSpec, DbHeadSpec, DbLossSpec, DbNetSpec, DcnOptions, FpncSpec, HeadSpec,
    LossSpec, ModelSpec, NeckSpec, NormLayerSpec, Reduction, ResNetSpec, ResNetStyle, TextRepr,
};
pub use norm::{ImgNormCfg, NormProfile};
pub use pipeline::{ColorType, ImgAugStep, Pipeline, TransformSpec, VisualizeCfg};
pub use runtime::{
    AdamSpec, CheckpointConfig, GradClip, LogConfig, LogLevel, LoggerHookSpec, LrPolicySpec,
    OptimizerConfig, OptimizerSpec,
};

use crate::document::{self, ConfigFormat};
use crate::error::{ConfigError, ConfigResult};
use crate::path::FieldPath;
use serde::{Deserialize, Serialize};

/// A validated training configuration.
///
/// Produced by [`crate::ConfigLoader`]; read-only once handed to the
/// training engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelSpec,
    pub img_norm_cfg: ImgNormCfg,
    pub train_pipeline: Pipeline,
    pub test_pipeline: Pipeline,
    pub data: DataConfig,
    pub evaluation: EvaluationConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_epochs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<OptimizerSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer_config: Option<OptimizerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lr_config: Option<LrPolicySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_config: Option<CheckpointConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_config: Option<LogConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_from: Option<String>,
}

impl Config {
    /// Every pipeline in the document with its location: the two top-level
    /// pipelines first, then each dataset split's.
    #[must_use]
    pub fn pipelines(&self) -> Vec<(FieldPath, &Pipeline)> {
        let mut out = vec![
            (FieldPath::key("train_pipeline"), &self.train_pipeline),
            (FieldPath::key("test_pipeline"), &self.test_pipeline),
        ];
        for (split, dataset) in self.data.datasets() {
            out.push((FieldPath::key("data").field(split).field("pipeline"), dataset.pipeline()));
        }
        out
    }

    pub fn to_value(&self) -> ConfigResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::Serialize {
            format: ConfigFormat::Json,
            message: e.to_string(),
        })
    }

    /// Render in `format`; loading the output yields an equal `Config`.
    pub fn to_string_as(&self, format: ConfigFormat) -> ConfigResult<String> {
        document::render(&self.to_value()?, format)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        self.to_string_as(ConfigFormat::Toml)
    }

    pub fn to_json_string(&self) -> ConfigResult<String> {
        self.to_string_as(ConfigFormat::Json)
    }

    pub fn to_yaml_string(&self) -> ConfigResult<String> {
        self.to_string_as(ConfigFormat::Yaml)
    }
}
