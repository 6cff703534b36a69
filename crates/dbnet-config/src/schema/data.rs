use super::pipeline::Pipeline;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataloaderCfg {
    pub samples_per_gpu: u32,
}

/// The `data` section: loader sizing and the three dataset splits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub samples_per_gpu: u32,
    pub workers_per_gpu: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val_dataloader: Option<DataloaderCfg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_dataloader: Option<DataloaderCfg>,
    pub train: DatasetSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val: Option<DatasetSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<DatasetSpec>,
}

impl DataConfig {
    /// Configured splits in `train`, `val`, `test` order.
    #[must_use]
    pub fn datasets(&self) -> Vec<(&'static str, &DatasetSpec)> {
        let mut out = vec![("train", &self.train)];
        if let Some(val) = &self.val {
            out.push(("val", val));
        }
        if let Some(test) = &self.test {
            out.push(("test", test));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DatasetSpec {
    IcdarDataset(IcdarDatasetSpec),
}

impl DatasetSpec {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::IcdarDataset(_) => "IcdarDataset",
        }
    }

    #[must_use]
    pub fn ann_file(&self) -> &str {
        match self {
            Self::IcdarDataset(spec) => &spec.ann_file,
        }
    }

    #[must_use]
    pub fn img_prefix(&self) -> &str {
        match self {
            Self::IcdarDataset(spec) => &spec.img_prefix,
        }
    }

    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        match self {
            Self::IcdarDataset(spec) => &spec.pipeline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcdarDatasetSpec {
    /// COCO-format annotation file.
    pub ann_file: String,
    /// Directory the annotation's image paths are relative to.
    pub img_prefix: String,
    pub pipeline: Pipeline,
    #[serde(default)]
    pub test_mode: bool,
    /// Only use the first k images; -1 uses all of them.
    #[serde(default = "default_select_first_k")]
    pub select_first_k: i32,
}

fn default_select_first_k() -> i32 {
    -1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Evaluate every `interval` epochs.
    pub interval: u32,
    pub metric: String,
}
