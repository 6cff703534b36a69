//! Shared fixtures for dbnet-config integration tests.

#![allow(dead_code)]

use dbnet_config::{ConfigLoader, LoadOptions};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ANN_FILE: &str = "tests/data/toy_dataset/instances_test.json";
pub const IMG_PREFIX: &str = "tests/data/toy_dataset/imgs";

/// Temporary directory holding the toy dataset the fixture document points at.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(IMG_PREFIX)).unwrap();
        let annotations = r#"{"images": [], "annotations": [], "categories": []}"#;
        fs::write(dir.path().join(ANN_FILE), annotations).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn options(&self) -> LoadOptions {
        LoadOptions::default().with_base_dir(self.dir.path())
    }

    pub fn loader(&self) -> ConfigLoader {
        ConfigLoader::new().with_options(self.options())
    }
}

pub fn img_norm_cfg() -> Value {
    json!({
        "mean": [122.67891434, 116.66876762, 104.00698793],
        "std": [255, 255, 255],
        "to_rgb": false
    })
}

pub fn train_pipeline() -> Value {
    let mut normalize = img_norm_cfg();
    normalize["type"] = json!("Normalize");
    json!([
        {"type": "LoadImageFromFile"},
        {"type": "LoadTextAnnotations", "with_bbox": true, "with_mask": true, "poly2mask": false},
        {"type": "ColorJitter", "brightness": 32.0 / 255.0, "saturation": 0.5},
        normalize,
        {
            "type": "ImgAug",
            "args": [
                ["Fliplr", 0.5],
                {"cls": "Affine", "rotate": [-10, 10]},
                ["Resize", [0.5, 3.0]]
            ]
        },
        {"type": "EastRandomCrop", "target_size": [640, 640]},
        {"type": "DBNetTargets", "shrink_ratio": 0.4},
        {"type": "Pad", "size_divisor": 32},
        {
            "type": "CustomFormatBundle",
            "keys": ["gt_shrink", "gt_shrink_mask", "gt_thr", "gt_thr_mask"],
            "visualize": {"flag": false, "boundary_key": "gt_shrink"}
        },
        {"type": "Collect", "keys": ["img", "gt_shrink", "gt_shrink_mask", "gt_thr", "gt_thr_mask"]}
    ])
}

pub fn test_pipeline() -> Value {
    let mut normalize = img_norm_cfg();
    normalize["type"] = json!("Normalize");
    json!([
        {"type": "LoadImageFromFile"},
        {
            "type": "MultiScaleFlipAug",
            "img_scale": [4068, 1024],
            "flip": false,
            "transforms": [
                {"type": "Resize", "img_scale": [4068, 1024], "keep_ratio": true},
                normalize,
                {"type": "Pad", "size_divisor": 32},
                {"type": "ImageToTensor", "keys": ["img"]},
                {"type": "Collect", "keys": ["img"]}
            ]
        }
    ])
}

fn dataset(pipeline: Value) -> Value {
    json!({
        "type": "IcdarDataset",
        "ann_file": ANN_FILE,
        "img_prefix": IMG_PREFIX,
        "pipeline": pipeline
    })
}

/// DBNet R50 + DCNv2 configuration on the toy dataset.
pub fn dbnet_document() -> Value {
    json!({
        "model": {
            "type": "DBNet",
            "pretrained": "torchvision://resnet50",
            "backbone": {
                "type": "ResNet",
                "depth": 50,
                "num_stages": 4,
                "out_indices": [0, 1, 2, 3],
                "frozen_stages": -1,
                "norm_cfg": {"type": "BN", "requires_grad": true},
                "norm_eval": false,
                "style": "caffe",
                "dcn": {"type": "DCNv2", "deform_groups": 1, "fallback_on_stride": false},
                "stage_with_dcn": [false, true, true, true]
            },
            "neck": {
                "type": "FPNC",
                "in_channels": [256, 512, 1024, 2048],
                "lateral_channels": 256
            },
            "bbox_head": {
                "type": "DBHead",
                "text_repr_type": "quad",
                "in_channels": 256,
                "loss": {"type": "DBLoss", "alpha": 5.0, "beta": 10.0, "bbce_loss": true}
            }
        },
        "img_norm_cfg": img_norm_cfg(),
        "train_pipeline": train_pipeline(),
        "test_pipeline": test_pipeline(),
        "total_epochs": 100,
        "data": {
            "samples_per_gpu": 4,
            "workers_per_gpu": 4,
            "val_dataloader": {"samples_per_gpu": 4},
            "test_dataloader": {"samples_per_gpu": 4},
            "train": dataset(train_pipeline()),
            "val": dataset(test_pipeline()),
            "test": dataset(test_pipeline())
        },
        "evaluation": {"interval": 1, "metric": "hmean-iou"}
    })
}

/// Set the value at a `/`-separated JSON pointer. A missing last key is
/// inserted into its parent mapping.
pub fn set(doc: &mut Value, pointer: &str, value: Value) {
    if let Some(slot) = doc.pointer_mut(pointer) {
        *slot = value;
        return;
    }
    let (parent, key) = pointer.rsplit_once('/').unwrap();
    let parent = if parent.is_empty() {
        doc
    } else {
        doc.pointer_mut(parent).unwrap_or_else(|| panic!("no value at {parent}"))
    };
    parent
        .as_object_mut()
        .unwrap_or_else(|| panic!("{pointer} does not name a mapping key"))
        .insert(key.to_string(), value);
}

/// Remove the key a JSON pointer names.
pub fn remove(doc: &mut Value, pointer: &str) {
    let (parent, key) = pointer.rsplit_once('/').unwrap();
    let parent = if parent.is_empty() { doc } else { doc.pointer_mut(parent).unwrap() };
    parent.as_object_mut().unwrap().remove(key);
}
