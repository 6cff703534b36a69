//! Document rewrites applied before validation.
//!
//! - Mapping entries set to `null` are removed: `null` means "unset", so a
//!   required field reports as missing and an optional one takes its default.
//! - `img_norm_cfg = "<profile>"` becomes the profile's explicit mapping.
//! - `data.<split>.pipeline = "train_pipeline"` is replaced by a copy of that
//!   top-level pipeline.
//! - `Normalize` steps inherit `mean`/`std`/`to_rgb` they omit from
//!   `img_norm_cfg`.
//!
//! Anything that does not fit these shapes is left alone for the structural
//! walk to report.

use crate::registry::{Registries, RegistryScope};
use crate::schema::NormProfile;
use serde_json::{Map, Value};
use tracing::debug;

const PIPELINE_REFS: [&str; 2] = ["train_pipeline", "test_pipeline"];
const DATASET_SPLITS: [&str; 3] = ["train", "val", "test"];
const NORM_KEYS: [&str; 3] = ["mean", "std", "to_rgb"];

/// Apply every rewrite to the root mapping.
pub fn prepare(doc: Value, registries: &Registries) -> Value {
    let mut doc = drop_nulls(doc);
    if let Some(root) = doc.as_object_mut() {
        expand_norm_profile(root, registries);
        materialize_pipeline_refs(root);
        inherit_normalize(root);
    }
    doc
}

fn drop_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, drop_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(drop_nulls).collect()),
        other => other,
    }
}

fn expand_norm_profile(root: &mut Map<String, Value>, registries: &Registries) {
    let Some(Value::String(name)) = root.get("img_norm_cfg") else {
        return;
    };
    if registries.resolve(RegistryScope::NormProfile, name).is_err() {
        return;
    }
    let Some(profile) = NormProfile::from_name(name) else {
        return;
    };
    let cfg = profile.config();
    debug!(profile = %profile, "Expanding normalization profile");
    let expanded = serde_json::json!({"mean": cfg.mean, "std": cfg.std, "to_rgb": cfg.to_rgb});
    root.insert("img_norm_cfg".to_string(), expanded);
}

fn materialize_pipeline_refs(root: &mut Map<String, Value>) {
    let pipelines: Vec<(&str, Value)> = PIPELINE_REFS
        .iter()
        .filter_map(|name| match root.get(*name) {
            Some(steps @ Value::Array(_)) => Some((*name, steps.clone())),
            _ => None,
        })
        .collect();

    let Some(Value::Object(data)) = root.get_mut("data") else {
        return;
    };
    for split in DATASET_SPLITS {
        let Some(Value::Object(dataset)) = data.get_mut(split) else {
            continue;
        };
        let Some(Value::String(reference)) = dataset.get("pipeline") else {
            continue;
        };
        let found = pipelines.iter().find(|(name, _)| *name == reference.as_str());
        if let Some((name, steps)) = found {
            debug!(split, pipeline = *name, "Materializing pipeline reference");
            dataset.insert("pipeline".to_string(), steps.clone());
        }
    }
}

fn inherit_normalize(root: &mut Map<String, Value>) {
    let Some(Value::Object(norm)) = root.get("img_norm_cfg") else {
        return;
    };
    let norm = norm.clone();

    for name in PIPELINE_REFS {
        if let Some(steps) = root.get_mut(name) {
            fill_pipeline(steps, &norm);
        }
    }
    if let Some(Value::Object(data)) = root.get_mut("data") {
        for split in DATASET_SPLITS {
            if let Some(steps) = data.get_mut(split).and_then(|d| d.get_mut("pipeline")) {
                fill_pipeline(steps, &norm);
            }
        }
    }
}

fn fill_pipeline(steps: &mut Value, norm: &Map<String, Value>) {
    let Value::Array(steps) = steps else {
        return;
    };
    for step in steps.iter_mut().filter_map(Value::as_object_mut) {
        match step.get("type").and_then(Value::as_str) {
            Some("Normalize") => {
                for key in NORM_KEYS {
                    if let (false, Some(value)) = (step.contains_key(key), norm.get(key)) {
                        step.insert(key.to_string(), value.clone());
                    }
                }
            }
            Some("MultiScaleFlipAug") => {
                if let Some(inner) = step.get_mut("transforms") {
                    fill_pipeline(inner, norm);
                }
            }
            _ => {}
        }
    }
}
