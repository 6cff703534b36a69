//! Cross-field consistency checks on a typed [`Config`].

use crate::error::{ConfigError, ConfigResult};
use crate::path::FieldPath;
use crate::schema::{
    Config, FpncSpec, ImgNormCfg, NeckSpec, Pipeline, ResNetSpec, TransformSpec,
};

const MAX_STAGES: usize = 4;

/// Run every check in document order; the first failure wins.
pub fn check(config: &Config) -> ConfigResult<()> {
    let model = FieldPath::key("model");
    let backbone_path = model.field("backbone");
    let neck_path = model.field("neck");

    let backbone = config.model.backbone().resnet();
    check_backbone(backbone, &backbone_path)?;
    check_neck(config.model.neck(), backbone, &neck_path)?;

    let head_in = config.model.head().in_channels();
    let neck_out = config.model.neck().output_channels().ok_or_else(|| {
        ConfigError::inconsistent(
            neck_path.field("out_channels"),
            "out_channels x number of inputs overflows the channel count",
        )
    })?;
    if head_in != neck_out {
        return Err(ConfigError::inconsistent(
            model.field("bbox_head").field("in_channels"),
            format!("expected {neck_out} (neck out_channels x number of inputs), got {head_in}"),
        ));
    }

    check_img_norm(&config.img_norm_cfg)?;
    for (path, pipeline) in config.pipelines() {
        check_pipeline(pipeline, &path, &config.img_norm_cfg)?;
    }

    check_evaluation(config)
}

fn check_backbone(spec: &ResNetSpec, path: &FieldPath) -> ConfigResult<()> {
    let stages = spec.num_stages;
    if !(1..=MAX_STAGES).contains(&stages) {
        return Err(ConfigError::inconsistent(
            path.field("num_stages"),
            format!("must be between 1 and {MAX_STAGES}, got {stages}"),
        ));
    }

    for (idx, &stage) in spec.out_indices.iter().enumerate() {
        if stage >= stages {
            return Err(ConfigError::inconsistent(
                path.field("out_indices").index(idx),
                format!("stage {stage} does not exist with num_stages = {stages}"),
            ));
        }
        if idx > 0 && stage <= spec.out_indices[idx - 1] {
            return Err(ConfigError::inconsistent(
                path.field("out_indices").index(idx),
                "out_indices must be strictly increasing",
            ));
        }
    }

    let max_frozen = i32::try_from(stages).unwrap_or(i32::MAX);
    if !(-1..=max_frozen).contains(&spec.frozen_stages) {
        return Err(ConfigError::inconsistent(
            path.field("frozen_stages"),
            format!("must be between -1 and {stages}, got {}", spec.frozen_stages),
        ));
    }

    if let Some(flags) = &spec.stage_with_dcn {
        if flags.len() != stages {
            return Err(ConfigError::inconsistent(
                path.field("stage_with_dcn"),
                format!("has {} entries but num_stages is {stages}", flags.len()),
            ));
        }
        if spec.dcn.is_none() {
            if let Some(idx) = flags.iter().position(|f| *f) {
                return Err(ConfigError::inconsistent(
                    path.field("stage_with_dcn").index(idx),
                    "deformable stage requested but `dcn` is not set",
                ));
            }
        }
    }
    Ok(())
}

fn check_neck(neck: &NeckSpec, backbone: &ResNetSpec, path: &FieldPath) -> ConfigResult<()> {
    let NeckSpec::Fpnc(FpncSpec { in_channels, .. }) = neck;
    let in_path = path.field("in_channels");

    if in_channels.len() != backbone.out_indices.len() {
        return Err(ConfigError::inconsistent(
            in_path,
            format!(
                "has {} entries but the backbone emits {} feature maps",
                in_channels.len(),
                backbone.out_indices.len()
            ),
        ));
    }

    let stages = in_channels.iter().zip(&backbone.out_indices);
    for (idx, (&channels, &stage)) in stages.enumerate() {
        let expected = backbone.stage_channels(stage);
        if channels != expected {
            let depth = backbone.depth;
            return Err(ConfigError::inconsistent(
                in_path.index(idx),
                format!("ResNet-{depth} stage {stage} has {expected} channels, got {channels}"),
            ));
        }
    }
    Ok(())
}

fn check_img_norm(cfg: &ImgNormCfg) -> ConfigResult<()> {
    if let Some(idx) = cfg.std.iter().position(|s| *s <= 0.0) {
        return Err(ConfigError::inconsistent(
            FieldPath::key("img_norm_cfg").field("std").index(idx),
            format!("std must be positive, got {}", cfg.std[idx]),
        ));
    }
    Ok(())
}

fn check_pipeline(pipeline: &Pipeline, path: &FieldPath, norm: &ImgNormCfg) -> ConfigResult<()> {
    for (idx, step) in pipeline.iter().enumerate() {
        let step_path = path.index(idx);
        check_step(step, &step_path, norm)?;
        if let Some(inner) = step.inner_pipeline() {
            check_pipeline(inner, &step_path.field("transforms"), norm)?;
        }
    }
    Ok(())
}

fn check_step(step: &TransformSpec, path: &FieldPath, norm: &ImgNormCfg) -> ConfigResult<()> {
    match step {
        TransformSpec::Normalize(cfg) if cfg != norm => Err(ConfigError::inconsistent(
            path.clone(),
            "Normalize parameters differ from img_norm_cfg",
        )),
        TransformSpec::Pad {
            size,
            size_divisor,
            ..
        } if size.is_some() == size_divisor.is_some() => Err(ConfigError::inconsistent(
            path.clone(),
            "Pad needs exactly one of `size` and `size_divisor`",
        )),
        TransformSpec::ColorJitter {
            brightness,
            contrast,
            saturation,
            hue,
        } => {
            let factors = [
                ("brightness", *brightness),
                ("contrast", *contrast),
                ("saturation", *saturation),
                ("hue", *hue),
            ];
            if let Some((name, value)) = factors.iter().find(|(_, v)| *v < 0.0) {
                return Err(ConfigError::inconsistent(
                    path.field(name),
                    format!("must be non-negative, got {value}"),
                ));
            }
            if *hue > 0.5 {
                return Err(ConfigError::inconsistent(
                    path.field("hue"),
                    format!("must be at most 0.5, got {hue}"),
                ));
            }
            Ok(())
        }
        TransformSpec::DbNetTargets {
            shrink_ratio,
            thr_min,
            thr_max,
            ..
        } => {
            if !(*shrink_ratio > 0.0 && *shrink_ratio < 1.0) {
                return Err(ConfigError::inconsistent(
                    path.field("shrink_ratio"),
                    format!("must lie strictly between 0 and 1, got {shrink_ratio}"),
                ));
            }
            if thr_min >= thr_max {
                return Err(ConfigError::inconsistent(
                    path.field("thr_min"),
                    format!("thr_min ({thr_min}) must be below thr_max ({thr_max})"),
                ));
            }
            Ok(())
        }
        TransformSpec::Collect { keys, .. } if !keys.iter().any(|k| k == "img") => Err(
            ConfigError::inconsistent(path.field("keys"), "Collect keys must include `img`"),
        ),
        _ => Ok(()),
    }
}

fn check_evaluation(config: &Config) -> ConfigResult<()> {
    let path = FieldPath::key("evaluation");
    if config.data.val.is_none() {
        return Err(ConfigError::inconsistent(
            path,
            "evaluation is configured but `data.val` is not set",
        ));
    }
    if let Some(total) = config.total_epochs {
        let interval = config.evaluation.interval;
        if interval > total {
            return Err(ConfigError::inconsistent(
                path.field("interval"),
                format!("interval {interval} exceeds total_epochs {total}"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BackboneSpec, NormProfile};
    use serde_json::json;

    fn resnet(value: serde_json::Value) -> ResNetSpec {
        match serde_json::from_value::<BackboneSpec>(value).unwrap() {
            BackboneSpec::ResNet(spec) | BackboneSpec::ResNetV1d(spec) => spec,
        }
    }

    fn step(value: serde_json::Value) -> TransformSpec {
        serde_json::from_value(value).unwrap()
    }

    fn path() -> FieldPath {
        FieldPath::key("model").field("backbone")
    }

    #[test]
    fn test_backbone_defaults_are_consistent() {
        assert!(check_backbone(&resnet(json!({"type": "ResNet", "depth": 50})), &path()).is_ok());
    }

    #[test]
    fn test_stage_with_dcn_length() {
        let spec = resnet(json!({
            "type": "ResNet", "depth": 50,
            "dcn": {"type": "DCNv2", "deform_groups": 1, "fallback_on_stride": false},
            "stage_with_dcn": [false, true, true]
        }));
        let err = check_backbone(&spec, &path()).unwrap_err();
        assert!(matches!(err, ConfigError::CrossFieldConsistency { .. }));
        assert_eq!(
            err.path().map(ToString::to_string).as_deref(),
            Some("model.backbone.stage_with_dcn")
        );
    }

    #[test]
    fn test_dcn_stage_requires_dcn() {
        let spec = resnet(json!({
            "type": "ResNet",
            "depth": 50,
            "stage_with_dcn": [false, true, true, true]
        }));
        let err = check_backbone(&spec, &path()).unwrap_err();
        assert_eq!(
            err.path().map(ToString::to_string).as_deref(),
            Some("model.backbone.stage_with_dcn[1]")
        );
    }

    #[test]
    fn test_out_indices_bounds_and_order() {
        let spec = resnet(json!({
            "type": "ResNet",
            "depth": 18,
            "num_stages": 3,
            "out_indices": [0, 3]
        }));
        let err = check_backbone(&spec, &path()).unwrap_err();
        assert_eq!(
            err.path().map(ToString::to_string).as_deref(),
            Some("model.backbone.out_indices[1]")
        );

        let spec = resnet(json!({"type": "ResNet", "depth": 18, "out_indices": [1, 0]}));
        assert!(check_backbone(&spec, &path()).is_err());
    }

    #[test]
    fn test_frozen_stages_range() {
        let spec = resnet(json!({"type": "ResNet", "depth": 18, "frozen_stages": 5}));
        assert!(check_backbone(&spec, &path()).is_err());
        let spec = resnet(json!({"type": "ResNet", "depth": 18, "frozen_stages": -1}));
        assert!(check_backbone(&spec, &path()).is_ok());
    }

    #[test]
    fn test_neck_channels_follow_backbone() {
        let backbone = resnet(json!({"type": "ResNet", "depth": 18}));
        let neck: NeckSpec = serde_json::from_value(json!({
            "type": "FPNC",
            "in_channels": [64, 128, 256, 512],
            "lateral_channels": 256
        }))
        .unwrap();
        assert!(check_neck(&neck, &backbone, &FieldPath::key("neck")).is_ok());

        let backbone = resnet(json!({"type": "ResNet", "depth": 50}));
        let err = check_neck(&neck, &backbone, &FieldPath::key("neck")).unwrap_err();
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("neck.in_channels[0]"));
    }

    #[test]
    fn test_normalize_must_match_img_norm() {
        let norm = NormProfile::DbnetOfficial.config();
        let other = NormProfile::Imagenet.config();
        assert!(check_step(&TransformSpec::Normalize(norm), &FieldPath::key("p"), &norm).is_ok());
        assert!(check_step(&TransformSpec::Normalize(other), &FieldPath::key("p"), &norm).is_err());
    }

    #[test]
    fn test_pad_needs_exactly_one_target() {
        let norm = NormProfile::canonical().config();
        let both = step(json!({"type": "Pad", "size": [640, 640], "size_divisor": 32}));
        let neither = step(json!({"type": "Pad"}));
        let one = step(json!({"type": "Pad", "size_divisor": 32}));
        assert!(check_step(&both, &FieldPath::key("p"), &norm).is_err());
        assert!(check_step(&neither, &FieldPath::key("p"), &norm).is_err());
        assert!(check_step(&one, &FieldPath::key("p"), &norm).is_ok());
    }

    #[test]
    fn test_color_jitter_ranges() {
        let norm = NormProfile::canonical().config();
        let ok = step(json!({"type": "ColorJitter", "brightness": 0.125, "saturation": 0.5}));
        let negative = step(json!({"type": "ColorJitter", "contrast": -0.1}));
        let hue = step(json!({"type": "ColorJitter", "hue": 0.6}));
        assert!(check_step(&ok, &FieldPath::key("p"), &norm).is_ok());
        let err = check_step(&negative, &FieldPath::key("p"), &norm).unwrap_err();
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("p.contrast"));
        assert!(check_step(&hue, &FieldPath::key("p"), &norm).is_err());
    }

    #[test]
    fn test_dbnet_targets_thresholds() {
        let norm = NormProfile::canonical().config();
        let bad = step(json!({"type": "DBNetTargets", "thr_min": 0.7, "thr_max": 0.3}));
        let err = check_step(&bad, &FieldPath::key("p"), &norm).unwrap_err();
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("p.thr_min"));
        let shrink = step(json!({"type": "DBNetTargets", "shrink_ratio": 1.0}));
        assert!(check_step(&shrink, &FieldPath::key("p"), &norm).is_err());
    }

    #[test]
    fn test_collect_requires_img() {
        let norm = NormProfile::canonical().config();
        let bad = step(json!({"type": "Collect", "keys": ["gt_shrink"]}));
        assert!(check_step(&bad, &FieldPath::key("p"), &norm).is_err());
        let good = step(json!({"type": "Collect", "keys": ["img", "gt_shrink"]}));
        assert!(check_step(&good, &FieldPath::key("p"), &norm).is_ok());
    }

    #[test]
    fn test_negative_std_rejected() {
        let mut cfg = NormProfile::canonical().config();
        cfg.std[2] = 0.0;
        let err = check_img_norm(&cfg).unwrap_err();
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("img_norm_cfg.std[2]"));
    }
}
