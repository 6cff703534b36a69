use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_num_stages() -> usize {
    4
}

fn default_out_indices() -> Vec<usize> {
    vec![0, 1, 2, 3]
}

fn default_frozen_stages() -> i32 {
    -1
}

fn default_one() -> f64 {
    1.0
}

/// Top-level detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ModelSpec {
    #[serde(rename = "DBNet")]
    DbNet(DbNetSpec),
}

impl ModelSpec {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::DbNet(_) => "DBNet",
        }
    }

    #[must_use]
    pub fn backbone(&self) -> &BackboneSpec {
        match self {
            Self::DbNet(spec) => &spec.backbone,
        }
    }

    #[must_use]
    pub fn neck(&self) -> &NeckSpec {
        match self {
            Self::DbNet(spec) => &spec.neck,
        }
    }

    #[must_use]
    pub fn head(&self) -> &HeadSpec {
        match self {
            Self::DbNet(spec) => &spec.bbox_head,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbNetSpec {
    /// Checkpoint URI for backbone initialization, e.g. `torchvision://resnet50`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretrained: Option<String>,
    pub backbone: BackboneSpec,
    pub neck: NeckSpec,
    pub bbox_head: HeadSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_cfg: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_cfg: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BackboneSpec {
    ResNet(ResNetSpec),
    ResNetV1d(ResNetSpec),
}

impl BackboneSpec {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResNet(_) => "ResNet",
            Self::ResNetV1d(_) => "ResNetV1d",
        }
    }

    #[must_use]
    pub fn resnet(&self) -> &ResNetSpec {
        match self {
            Self::ResNet(spec) | Self::ResNetV1d(spec) => spec,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResNetStyle {
    #[default]
    Pytorch,
    Caffe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResNetSpec {
    pub depth: u32,
    #[serde(default = "default_num_stages")]
    pub num_stages: usize,
    #[serde(default = "default_out_indices")]
    pub out_indices: Vec<usize>,
    /// -1 freezes nothing; `n` freezes the stem and the first `n` stages.
    #[serde(default = "default_frozen_stages")]
    pub frozen_stages: i32,
    #[serde(default)]
    pub norm_cfg: NormLayerSpec,
    #[serde(default = "default_true")]
    pub norm_eval: bool,
    #[serde(default)]
    pub style: ResNetStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dcn: Option<ConvLayerSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_with_dcn: Option<Vec<bool>>,
    #[serde(default)]
    pub with_cp: bool,
}

impl ResNetSpec {
    /// Output channels of residual stage `stage` (0-based).
    #[must_use]
    pub fn stage_channels(&self, stage: usize) -> u32 {
        let expansion = if self.depth < 50 { 1 } else { 4 };
        64 * expansion * (1u32 << stage)
    }

    /// Per-stage DCN flags; all `false` when `stage_with_dcn` is absent.
    #[must_use]
    pub fn dcn_stages(&self) -> Vec<bool> {
        self.stage_with_dcn.clone().unwrap_or_else(|| vec![false; self.num_stages])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NormLayerSpec {
    #[serde(rename = "BN")]
    Bn {
        #[serde(default = "default_true")]
        requires_grad: bool,
    },
    #[serde(rename = "SyncBN")]
    SyncBn {
        #[serde(default = "default_true")]
        requires_grad: bool,
    },
    #[serde(rename = "GN")]
    Gn {
        num_groups: u32,
        #[serde(default = "default_true")]
        requires_grad: bool,
    },
}

impl Default for NormLayerSpec {
    fn default() -> Self {
        Self::Bn {
            requires_grad: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConvLayerSpec {
    #[serde(rename = "DCN")]
    Dcn(DcnOptions),
    #[serde(rename = "DCNv2")]
    DcnV2(DcnOptions),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcnOptions {
    #[serde(default = "default_deform_groups")]
    pub deform_groups: u32,
    #[serde(default)]
    pub fallback_on_stride: bool,
}

fn default_deform_groups() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NeckSpec {
    #[serde(rename = "FPNC")]
    Fpnc(FpncSpec),
}

impl NeckSpec {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fpnc(_) => "FPNC",
        }
    }

    #[must_use]
    pub fn in_channels(&self) -> &[u32] {
        match self {
            Self::Fpnc(spec) => &spec.in_channels,
        }
    }

    /// Channels handed to the head, `None` if the width overflows `u32`.
    #[must_use]
    pub fn output_channels(&self) -> Option<u32> {
        match self {
            Self::Fpnc(spec) => spec.output_channels(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FpncSpec {
    pub in_channels: Vec<u32>,
    pub lateral_channels: u32,
    #[serde(default = "default_fpnc_out_channels")]
    pub out_channels: u32,
    #[serde(default)]
    pub bias_on_lateral: bool,
    #[serde(default)]
    pub bn_re_on_lateral: bool,
    #[serde(default)]
    pub bias_on_smooth: bool,
    #[serde(default)]
    pub bn_re_on_smooth: bool,
    #[serde(default)]
    pub conv_after_concat: bool,
}

fn default_fpnc_out_channels() -> u32 {
    64
}

impl FpncSpec {
    /// Every level is smoothed to `out_channels` and the levels are concatenated.
    #[must_use]
    pub fn output_channels(&self) -> Option<u32> {
        u32::try_from(self.in_channels.len())
            .ok()
            .and_then(|levels| self.out_channels.checked_mul(levels))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HeadSpec {
    #[serde(rename = "DBHead")]
    DbHead(DbHeadSpec),
}

impl HeadSpec {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::DbHead(_) => "DBHead",
        }
    }

    #[must_use]
    pub fn in_channels(&self) -> u32 {
        match self {
            Self::DbHead(spec) => spec.in_channels,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextRepr {
    #[default]
    Quad,
    Poly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbHeadSpec {
    pub in_channels: u32,
    #[serde(default)]
    pub text_repr_type: TextRepr,
    #[serde(default)]
    pub with_bias: bool,
    #[serde(default = "default_one")]
    pub downsample_ratio: f64,
    pub loss: LossSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LossSpec {
    #[serde(rename = "DBLoss")]
    DbLoss(DbLossSpec),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    #[default]
    Mean,
    Sum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbLossSpec {
    /// Weight of the shrink-map loss.
    #[serde(default = "default_one")]
    pub alpha: f64,
    /// Weight of the threshold-map loss.
    #[serde(default = "default_one")]
    pub beta: f64,
    #[serde(default)]
    pub reduction: Reduction,
    #[serde(default = "default_negative_ratio")]
    pub negative_ratio: f64,
    #[serde(default = "default_eps")]
    pub eps: f64,
    /// Balanced BCE instead of dice for the shrink map.
    #[serde(default)]
    pub bbce_loss: bool,
}

fn default_negative_ratio() -> f64 {
    3.0
}

fn default_eps() -> f64 {
    1e-6
}
