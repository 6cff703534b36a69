//! Built-in component catalogue.
//!
//! Field tables mirror the keyword arguments the training framework accepts
//! for each component, with the same required/optional split.

use crate::registry::{ComponentDescriptor, FieldKind, FieldSpec, RegistryScope};

use crate::registry::FieldKind::{
    Any, Bool, Component, ComponentName, Float, FloatTriple, ImgAugArgs, Int, IntChoice, List,
    Mapping, NonNegativeInt, NormConfig, Pair, Pipeline, PositiveInt, Str, StrChoice,
};

const fn req(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec::required(name, kind)
}

const fn opt(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec::optional(name, kind)
}

const fn component(
    scope: RegistryScope,
    name: &'static str,
    summary: &'static str,
    fields: &'static [FieldSpec],
) -> ComponentDescriptor {
    ComponentDescriptor {
        name,
        scope,
        summary,
        fields,
    }
}

pub const RESNET_DEPTHS: &[i64] = &[18, 34, 50, 101, 152];

// detectors

const DBNET_FIELDS: &[FieldSpec] = &[
    opt("pretrained", Str),
    req("backbone", Component(RegistryScope::Backbone)),
    req("neck", Component(RegistryScope::Neck)),
    req("bbox_head", Component(RegistryScope::Head)),
    opt("train_cfg", Any),
    opt("test_cfg", Any),
];

const DETECTORS: &[ComponentDescriptor] = &[component(
    RegistryScope::Detector,
    "DBNet",
    "Differentiable binarization text detector",
    DBNET_FIELDS,
)];

// backbones

const RESNET_FIELDS: &[FieldSpec] = &[
    req("depth", IntChoice(RESNET_DEPTHS)),
    opt("num_stages", PositiveInt),
    opt("out_indices", List(&NonNegativeInt)),
    opt("frozen_stages", Int),
    opt("norm_cfg", Component(RegistryScope::NormLayer)),
    opt("norm_eval", Bool),
    opt("style", StrChoice(&["pytorch", "caffe"])),
    opt("dcn", Component(RegistryScope::ConvLayer)),
    opt("stage_with_dcn", List(&Bool)),
    opt("with_cp", Bool),
];

const BACKBONES: &[ComponentDescriptor] = &[
    component(
        RegistryScope::Backbone,
        "ResNet",
        "Residual network",
        RESNET_FIELDS,
    ),
    component(
        RegistryScope::Backbone,
        "ResNetV1d",
        "ResNet with deep stem and avg-pool downsampling",
        RESNET_FIELDS,
    ),
];

// necks

const FPNC_FIELDS: &[FieldSpec] = &[
    req("in_channels", List(&PositiveInt)),
    req("lateral_channels", PositiveInt),
    opt("out_channels", PositiveInt),
    opt("bias_on_lateral", Bool),
    opt("bn_re_on_lateral", Bool),
    opt("bias_on_smooth", Bool),
    opt("bn_re_on_smooth", Bool),
    opt("conv_after_concat", Bool),
];

const NECKS: &[ComponentDescriptor] = &[component(
    RegistryScope::Neck,
    "FPNC",
    "FPN variant concatenating all levels",
    FPNC_FIELDS,
)];

// heads and losses

const DBHEAD_FIELDS: &[FieldSpec] = &[
    req("in_channels", PositiveInt),
    opt("text_repr_type", StrChoice(&["quad", "poly"])),
    opt("with_bias", Bool),
    opt("downsample_ratio", Float),
    req("loss", Component(RegistryScope::Loss)),
];

const HEADS: &[ComponentDescriptor] = &[component(
    RegistryScope::Head,
    "DBHead",
    "Probability and threshold map head",
    DBHEAD_FIELDS,
)];

const DBLOSS_FIELDS: &[FieldSpec] = &[
    opt("alpha", Float),
    opt("beta", Float),
    opt("reduction", StrChoice(&["mean", "sum"])),
    opt("negative_ratio", Float),
    opt("eps", Float),
    opt("bbce_loss", Bool),
];

const LOSSES: &[ComponentDescriptor] = &[component(
    RegistryScope::Loss,
    "DBLoss",
    "Balanced BCE + dice + L1 threshold loss",
    DBLOSS_FIELDS,
)];

// layers

const BN_FIELDS: &[FieldSpec] = &[opt("requires_grad", Bool)];
const GN_FIELDS: &[FieldSpec] = &[req("num_groups", PositiveInt), opt("requires_grad", Bool)];

const NORM_LAYERS: &[ComponentDescriptor] = &[
    component(
        RegistryScope::NormLayer,
        "BN",
        "Batch normalization",
        BN_FIELDS,
    ),
    component(
        RegistryScope::NormLayer,
        "SyncBN",
        "Cross-device batch normalization",
        BN_FIELDS,
    ),
    component(
        RegistryScope::NormLayer,
        "GN",
        "Group normalization",
        GN_FIELDS,
    ),
];

const DCN_FIELDS: &[FieldSpec] = &[
    opt("deform_groups", PositiveInt),
    opt("fallback_on_stride", Bool),
];

const CONV_LAYERS: &[ComponentDescriptor] = &[
    component(
        RegistryScope::ConvLayer,
        "DCN",
        "Deformable convolution",
        DCN_FIELDS,
    ),
    component(
        RegistryScope::ConvLayer,
        "DCNv2",
        "Modulated deformable convolution",
        DCN_FIELDS,
    ),
];

// transforms

const LOAD_IMAGE_FIELDS: &[FieldSpec] = &[
    opt("to_float32", Bool),
    opt(
        "color_type",
        StrChoice(&["color", "grayscale", "unchanged"]),
    ),
];

const LOAD_TEXT_ANN_FIELDS: &[FieldSpec] = &[
    opt("with_bbox", Bool),
    opt("with_label", Bool),
    opt("with_mask", Bool),
    opt("poly2mask", Bool),
];

const COLOR_JITTER_FIELDS: &[FieldSpec] = &[
    opt("brightness", Float),
    opt("contrast", Float),
    opt("saturation", Float),
    opt("hue", Float),
];

const NORMALIZE_FIELDS: &[FieldSpec] = &[
    req("mean", FloatTriple),
    req("std", FloatTriple),
    req("to_rgb", Bool),
];

const IMGAUG_FIELDS: &[FieldSpec] = &[req("args", ImgAugArgs)];

const EAST_RANDOM_CROP_FIELDS: &[FieldSpec] = &[
    req("target_size", Pair(&PositiveInt)),
    opt("max_tries", PositiveInt),
    opt("min_crop_side_ratio", Float),
];

const DBNET_TARGETS_FIELDS: &[FieldSpec] = &[
    opt("shrink_ratio", Float),
    opt("thr_min", Float),
    opt("thr_max", Float),
    opt("min_short_size", PositiveInt),
];

const PAD_FIELDS: &[FieldSpec] = &[
    opt("size", Pair(&PositiveInt)),
    opt("size_divisor", PositiveInt),
    opt("pad_val", Float),
];

const VISUALIZE_FIELDS: &[FieldSpec] = &[req("flag", Bool), opt("boundary_key", Str)];

const CUSTOM_FORMAT_BUNDLE_FIELDS: &[FieldSpec] = &[
    req("keys", List(&Str)),
    opt("visualize", Mapping(VISUALIZE_FIELDS)),
    opt("call_super", Bool),
];

const COLLECT_FIELDS: &[FieldSpec] = &[req("keys", List(&Str)), opt("meta_keys", List(&Str))];

const MULTI_SCALE_FLIP_AUG_FIELDS: &[FieldSpec] = &[
    req("img_scale", Pair(&PositiveInt)),
    opt("flip", Bool),
    req("transforms", Pipeline),
];

const RESIZE_FIELDS: &[FieldSpec] = &[
    req("img_scale", Pair(&PositiveInt)),
    opt("keep_ratio", Bool),
];

const KEYS_FIELDS: &[FieldSpec] = &[req("keys", List(&Str))];

const TRANSFORMS: &[ComponentDescriptor] = &[
    component(
        RegistryScope::Transform,
        "LoadImageFromFile",
        "Read the image from disk",
        LOAD_IMAGE_FIELDS,
    ),
    component(
        RegistryScope::Transform,
        "LoadTextAnnotations",
        "Load boxes and polygon masks",
        LOAD_TEXT_ANN_FIELDS,
    ),
    component(
        RegistryScope::Transform,
        "ColorJitter",
        "Random photometric jitter",
        COLOR_JITTER_FIELDS,
    ),
    component(
        RegistryScope::Transform,
        "Normalize",
        "Per-channel mean/std normalization",
        NORMALIZE_FIELDS,
    ),
    component(
        RegistryScope::Transform,
        "ImgAug",
        "imgaug augmentation sequence",
        IMGAUG_FIELDS,
    ),
    component(
        RegistryScope::Transform,
        "EastRandomCrop",
        "Text-aware random crop",
        EAST_RANDOM_CROP_FIELDS,
    ),
    component(
        RegistryScope::Transform,
        "DBNetTargets",
        "Shrink and threshold map targets",
        DBNET_TARGETS_FIELDS,
    ),
    component(
        RegistryScope::Transform,
        "Pad",
        "Pad to a fixed size or divisor",
        PAD_FIELDS,
    ),
    component(
        RegistryScope::Transform,
        "CustomFormatBundle",
        "Tensor formatting for DBNet targets",
        CUSTOM_FORMAT_BUNDLE_FIELDS,
    ),
    component(
        RegistryScope::Transform,
        "DefaultFormatBundle",
        "Default tensor formatting",
        &[],
    ),
    component(
        RegistryScope::Transform,
        "Collect",
        "Select keys passed to the model",
        COLLECT_FIELDS,
    ),
    component(
        RegistryScope::Transform,
        "MultiScaleFlipAug",
        "Test-time scale/flip wrapper",
        MULTI_SCALE_FLIP_AUG_FIELDS,
    ),
    component(
        RegistryScope::Transform,
        "Resize",
        "Resize to a target scale",
        RESIZE_FIELDS,
    ),
    component(
        RegistryScope::Transform,
        "ImageToTensor",
        "Convert image arrays to tensors",
        KEYS_FIELDS,
    ),
];

// imgaug augmenters accept free-form arguments; only the name is checked.

const IMGAUG_AUGMENTERS: &[ComponentDescriptor] = &[
    component(RegistryScope::ImgAug, "Fliplr", "Horizontal flip", &[]),
    component(RegistryScope::ImgAug, "Flipud", "Vertical flip", &[]),
    component(RegistryScope::ImgAug, "Affine", "Affine transform", &[]),
    component(RegistryScope::ImgAug, "Resize", "Random rescale", &[]),
    component(RegistryScope::ImgAug, "Rotate", "Rotation", &[]),
    component(RegistryScope::ImgAug, "Crop", "Random crop", &[]),
    component(RegistryScope::ImgAug, "GaussianBlur", "Gaussian blur", &[]),
    component(
        RegistryScope::ImgAug,
        "Multiply",
        "Brightness multiply",
        &[],
    ),
];

// datasets and metrics

const ICDAR_DATASET_FIELDS: &[FieldSpec] = &[
    req("ann_file", Str),
    req("img_prefix", Str),
    req("pipeline", Pipeline),
    opt("test_mode", Bool),
    opt("select_first_k", Int),
];

const DATASETS: &[ComponentDescriptor] = &[component(
    RegistryScope::Dataset,
    "IcdarDataset",
    "COCO-style ICDAR text detection annotations",
    ICDAR_DATASET_FIELDS,
)];

const METRICS: &[ComponentDescriptor] = &[
    component(
        RegistryScope::Metric,
        "hmean-iou",
        "IoU-matched H-mean",
        &[],
    ),
    component(RegistryScope::Metric, "hmean-ic13", "ICDAR2013 H-mean", &[]),
];

// schedule and runtime

const SGD_FIELDS: &[FieldSpec] = &[
    req("lr", Float),
    opt("momentum", Float),
    opt("weight_decay", Float),
    opt("nesterov", Bool),
];

const ADAM_FIELDS: &[FieldSpec] = &[
    req("lr", Float),
    opt("betas", Pair(&Float)),
    opt("weight_decay", Float),
];

const OPTIMIZERS: &[ComponentDescriptor] = &[
    component(
        RegistryScope::Optimizer,
        "SGD",
        "Stochastic gradient descent",
        SGD_FIELDS,
    ),
    component(RegistryScope::Optimizer, "Adam", "Adam", ADAM_FIELDS),
    component(
        RegistryScope::Optimizer,
        "AdamW",
        "Adam with decoupled weight decay",
        ADAM_FIELDS,
    ),
];

const POLY_FIELDS: &[FieldSpec] = &[
    opt("power", Float),
    opt("min_lr", Float),
    opt("by_epoch", Bool),
];

const STEP_FIELDS: &[FieldSpec] = &[
    req("step", List(&PositiveInt)),
    opt("gamma", Float),
    opt("by_epoch", Bool),
];

const LR_POLICIES: &[ComponentDescriptor] = &[
    component(
        RegistryScope::LrPolicy,
        "poly",
        "Polynomial decay",
        POLY_FIELDS,
    ),
    component(
        RegistryScope::LrPolicy,
        "step",
        "Step decay at fixed epochs",
        STEP_FIELDS,
    ),
];

const LOGGER_HOOK_FIELDS: &[FieldSpec] = &[opt("by_epoch", Bool)];

const LOGGER_HOOKS: &[ComponentDescriptor] = &[
    component(
        RegistryScope::LoggerHook,
        "TextLoggerHook",
        "Plain text log output",
        LOGGER_HOOK_FIELDS,
    ),
    component(
        RegistryScope::LoggerHook,
        "TensorboardLoggerHook",
        "TensorBoard event files",
        LOGGER_HOOK_FIELDS,
    ),
];

const NORM_PROFILES: &[ComponentDescriptor] = &[
    component(
        RegistryScope::NormProfile,
        "dbnet_official",
        "Statistics from the reference DBNet code",
        &[],
    ),
    component(
        RegistryScope::NormProfile,
        "imagenet",
        "torchvision ImageNet statistics",
        &[],
    ),
    component(
        RegistryScope::NormProfile,
        "visualize",
        "Identity normalization for inspection",
        &[],
    ),
];

/// Built-in descriptors for one scope.
#[must_use]
pub fn descriptors(scope: RegistryScope) -> &'static [ComponentDescriptor] {
    match scope {
        RegistryScope::Detector => DETECTORS,
        RegistryScope::Backbone => BACKBONES,
        RegistryScope::Neck => NECKS,
        RegistryScope::Head => HEADS,
        RegistryScope::Loss => LOSSES,
        RegistryScope::NormLayer => NORM_LAYERS,
        RegistryScope::ConvLayer => CONV_LAYERS,
        RegistryScope::Transform => TRANSFORMS,
        RegistryScope::ImgAug => IMGAUG_AUGMENTERS,
        RegistryScope::Dataset => DATASETS,
        RegistryScope::Metric => METRICS,
        RegistryScope::Optimizer => OPTIMIZERS,
        RegistryScope::LrPolicy => LR_POLICIES,
        RegistryScope::LoggerHook => LOGGER_HOOKS,
        RegistryScope::NormProfile => NORM_PROFILES,
    }
}

// Document-level sections. These have no discriminator; they are walked as
// plain mappings.

const DATALOADER_FIELDS: &[FieldSpec] = &[req("samples_per_gpu", PositiveInt)];

pub const DATA_FIELDS: &[FieldSpec] = &[
    req("samples_per_gpu", PositiveInt),
    req("workers_per_gpu", NonNegativeInt),
    opt("val_dataloader", Mapping(DATALOADER_FIELDS)),
    opt("test_dataloader", Mapping(DATALOADER_FIELDS)),
    req("train", Component(RegistryScope::Dataset)),
    opt("val", Component(RegistryScope::Dataset)),
    opt("test", Component(RegistryScope::Dataset)),
];

pub const EVALUATION_FIELDS: &[FieldSpec] = &[
    req("interval", PositiveInt),
    req("metric", ComponentName(RegistryScope::Metric)),
];

pub const IMG_NORM_FIELDS: &[FieldSpec] = NORMALIZE_FIELDS;

const GRAD_CLIP_FIELDS: &[FieldSpec] = &[req("max_norm", Float), opt("norm_type", Float)];

const OPTIMIZER_CONFIG_FIELDS: &[FieldSpec] = &[opt("grad_clip", Mapping(GRAD_CLIP_FIELDS))];

const CHECKPOINT_CONFIG_FIELDS: &[FieldSpec] = &[req("interval", PositiveInt)];

const LOG_CONFIG_FIELDS: &[FieldSpec] = &[
    req("interval", PositiveInt),
    opt("hooks", List(&Component(RegistryScope::LoggerHook))),
];

pub const ROOT_FIELDS: &[FieldSpec] = &[
    req("model", Component(RegistryScope::Detector)),
    req("img_norm_cfg", NormConfig(IMG_NORM_FIELDS)),
    req("train_pipeline", Pipeline),
    req("test_pipeline", Pipeline),
    req("data", Mapping(DATA_FIELDS)),
    req("evaluation", Mapping(EVALUATION_FIELDS)),
    opt("total_epochs", PositiveInt),
    opt("optimizer", Component(RegistryScope::Optimizer)),
    opt("optimizer_config", Mapping(OPTIMIZER_CONFIG_FIELDS)),
    opt("lr_config", Component(RegistryScope::LrPolicy)),
    opt("checkpoint_config", Mapping(CHECKPOINT_CONFIG_FIELDS)),
    opt("log_config", Mapping(LOG_CONFIG_FIELDS)),
    opt(
        "log_level",
        StrChoice(&["DEBUG", "INFO", "WARNING", "ERROR"]),
    ),
    opt("load_from", Str),
    opt("resume_from", Str),
];
