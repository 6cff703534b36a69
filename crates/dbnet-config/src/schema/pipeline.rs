use super::norm::ImgNormCfg;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Ordered sequence of data transforms.
///
/// Steps run in list order on every sample, so position is part of the
/// meaning: normalizing after padding would normalize the padding too, and
/// `Collect` only sees keys produced before it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pipeline {
    steps: Vec<TransformSpec>,
}

impl Pipeline {
    #[must_use]
    pub fn new(steps: Vec<TransformSpec>) -> Self {
        Self { steps }
    }

    #[must_use]
    pub fn steps(&self) -> &[TransformSpec] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransformSpec> {
        self.steps.iter()
    }

    /// Position of the first step named `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name() == name)
    }

    /// Step names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(TransformSpec::name).collect()
    }
}

impl<'a> IntoIterator for &'a Pipeline {
    type Item = &'a TransformSpec;
    type IntoIter = std::slice::Iter<'a, TransformSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorType {
    #[default]
    Color,
    Grayscale,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizeCfg {
    pub flag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary_key: Option<String>,
}

/// One augmenter inside `ImgAug.args`.
///
/// Either the positional form `["Fliplr", 0.5]` or the keyword form
/// `{cls = "Affine", rotate = [-10, 10]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImgAugStep {
    Positional(Vec<serde_json::Value>),
    Keyword {
        cls: String,
        #[serde(flatten)]
        params: serde_json::Map<String, serde_json::Value>,
    },
}

impl ImgAugStep {
    #[must_use]
    pub fn augmenter(&self) -> Option<&str> {
        match self {
            Self::Positional(items) => items.first().and_then(serde_json::Value::as_str),
            Self::Keyword { cls, .. } => Some(cls.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransformSpec {
    LoadImageFromFile {
        #[serde(default)]
        to_float32: bool,
        #[serde(default)]
        color_type: ColorType,
    },
    LoadTextAnnotations {
        #[serde(default = "default_true")]
        with_bbox: bool,
        #[serde(default = "default_true")]
        with_label: bool,
        #[serde(default)]
        with_mask: bool,
        #[serde(default = "default_true")]
        poly2mask: bool,
    },
    ColorJitter {
        #[serde(default)]
        brightness: f64,
        #[serde(default)]
        contrast: f64,
        #[serde(default)]
        saturation: f64,
        #[serde(default)]
        hue: f64,
    },
    Normalize(ImgNormCfg),
    ImgAug {
        args: Vec<ImgAugStep>,
    },
    EastRandomCrop {
        target_size: (u32, u32),
        #[serde(default = "default_max_tries")]
        max_tries: u32,
        #[serde(default = "default_min_crop_side_ratio")]
        min_crop_side_ratio: f64,
    },
    #[serde(rename = "DBNetTargets")]
    DbNetTargets {
        #[serde(default = "default_shrink_ratio")]
        shrink_ratio: f64,
        #[serde(default = "default_thr_min")]
        thr_min: f64,
        #[serde(default = "default_thr_max")]
        thr_max: f64,
        #[serde(default = "default_min_short_size")]
        min_short_size: u32,
    },
    Pad {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<(u32, u32)>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size_divisor: Option<u32>,
        #[serde(default)]
        pad_val: f64,
    },
    CustomFormatBundle {
        keys: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        visualize: Option<VisualizeCfg>,
        #[serde(default = "default_true")]
        call_super: bool,
    },
    DefaultFormatBundle,
    Collect {
        keys: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta_keys: Option<Vec<String>>,
    },
    MultiScaleFlipAug {
        img_scale: (u32, u32),
        #[serde(default)]
        flip: bool,
        transforms: Pipeline,
    },
    Resize {
        img_scale: (u32, u32),
        #[serde(default = "default_true")]
        keep_ratio: bool,
    },
    ImageToTensor {
        keys: Vec<String>,
    },
}

fn default_max_tries() -> u32 {
    10
}

fn default_min_crop_side_ratio() -> f64 {
    0.1
}

fn default_shrink_ratio() -> f64 {
    0.4
}

fn default_thr_min() -> f64 {
    0.3
}

fn default_thr_max() -> f64 {
    0.7
}

fn default_min_short_size() -> u32 {
    8
}

impl TransformSpec {
    /// Registry name of the step.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadImageFromFile { .. } => "LoadImageFromFile",
            Self::LoadTextAnnotations { .. } => "LoadTextAnnotations",
            Self::ColorJitter { .. } => "ColorJitter",
            Self::Normalize(_) => "Normalize",
            Self::ImgAug { .. } => "ImgAug",
            Self::EastRandomCrop { .. } => "EastRandomCrop",
            Self::DbNetTargets { .. } => "DBNetTargets",
            Self::Pad { .. } => "Pad",
            Self::CustomFormatBundle { .. } => "CustomFormatBundle",
            Self::DefaultFormatBundle => "DefaultFormatBundle",
            Self::Collect { .. } => "Collect",
            Self::MultiScaleFlipAug { .. } => "MultiScaleFlipAug",
            Self::Resize { .. } => "Resize",
            Self::ImageToTensor { .. } => "ImageToTensor",
        }
    }

    /// Nested pipeline run by wrapper steps.
    #[must_use]
    pub fn inner_pipeline(&self) -> Option<&Pipeline> {
        match self {
            Self::MultiScaleFlipAug { transforms, .. } => Some(transforms),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pipeline_preserves_order() {
        let pipeline: Pipeline = serde_json::from_value(json!([
            {"type": "LoadImageFromFile"},
            {"type": "Pad", "size_divisor": 32},
            {"type": "Collect", "keys": ["img"]}
        ]))
        .unwrap();
        assert_eq!(pipeline.names(), vec!["LoadImageFromFile", "Pad", "Collect"]);
        assert_eq!(pipeline.position("Pad"), Some(1));
        assert_eq!(pipeline.position("Normalize"), None);
    }

    #[test]
    fn test_imgaug_step_forms() {
        let steps: Vec<ImgAugStep> = serde_json::from_value(json!([
            ["Fliplr", 0.5],
            {"cls": "Affine", "rotate": [-10, 10]}
        ]))
        .unwrap();
        assert_eq!(steps[0].augmenter(), Some("Fliplr"));
        assert_eq!(steps[1].augmenter(), Some("Affine"));
        match &steps[1] {
            ImgAugStep::Keyword { params, .. } => assert_eq!(params["rotate"], json!([-10, 10])),
            ImgAugStep::Positional(_) => panic!("expected keyword form"),
        }
    }

    #[test]
    fn test_dbnet_targets_defaults() {
        let step: TransformSpec = serde_json::from_value(json!({"type": "DBNetTargets"})).unwrap();
        match step {
            TransformSpec::DbNetTargets {
                shrink_ratio,
                min_short_size,
                ..
            } => {
                assert!((shrink_ratio - 0.4).abs() < f64::EPSILON);
                assert_eq!(min_short_size, 8);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_unit_step_serializes_with_type() {
        let value = serde_json::to_value(TransformSpec::DefaultFormatBundle).unwrap();
        assert_eq!(value, json!({"type": "DefaultFormatBundle"}));
    }

    #[test]
    fn test_multi_scale_flip_aug_inner_pipeline() {
        let step: TransformSpec = serde_json::from_value(json!({
            "type": "MultiScaleFlipAug",
            "img_scale": [4068, 1024],
            "transforms": [{"type": "Resize", "img_scale": [4068, 1024]}]
        }))
        .unwrap();
        assert_eq!(step.inner_pipeline().map(Pipeline::len), Some(1));
    }
}
