//! Pipeline step ordering rules.

use crate::error::{ConfigError, ConfigResult};
use crate::path::FieldPath;
use crate::schema::{Config, Pipeline};
use serde::{Deserialize, Serialize};

/// Whether pipeline ordering rules are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderPolicy {
    /// Reject pipelines whose steps are out of order.
    #[default]
    Enforce,
    /// Accept pipelines as written.
    Ignore,
}

impl std::fmt::Display for OrderPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Enforce => "enforce",
            Self::Ignore => "ignore",
        })
    }
}

impl std::str::FromStr for OrderPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "enforce" => Ok(Self::Enforce),
            "ignore" => Ok(Self::Ignore),
            other => Err(format!("unknown order policy: {other}")),
        }
    }
}

/// `before` must precede `after` whenever both appear.
const PRECEDENCE: &[(&str, &str)] = &[
    ("Normalize", "Pad"),
    ("LoadTextAnnotations", "DBNetTargets"),
    ("EastRandomCrop", "DBNetTargets"),
];

const FIRST: &str = "LoadImageFromFile";
const LAST: &str = "Collect";

/// Check every pipeline in `config` under `policy`.
pub fn check(config: &Config, policy: OrderPolicy) -> ConfigResult<()> {
    if policy == OrderPolicy::Ignore {
        return Ok(());
    }
    for (path, pipeline) in config.pipelines() {
        check_pipeline(pipeline, &path)?;
    }
    Ok(())
}

/// Check one pipeline and every pipeline nested in it.
pub fn check_pipeline(pipeline: &Pipeline, path: &FieldPath) -> ConfigResult<()> {
    let names = pipeline.names();

    if let Some(idx) = names.iter().position(|n| *n == FIRST).filter(|idx| *idx != 0) {
        return Err(ConfigError::inconsistent(
            path.index(idx),
            format!("{FIRST} must be the first step, found at position {idx}"),
        ));
    }

    for (before, after) in PRECEDENCE {
        let after_idx = names.iter().position(|n| n == after);
        let before_idx = names.iter().rposition(|n| n == before);
        if let (Some(a), Some(b)) = (after_idx, before_idx) {
            if b > a {
                return Err(ConfigError::inconsistent(
                    path.index(b),
                    format!("{before} must come before {after} (found {after} at position {a})"),
                ));
            }
        }
    }

    let last = names.iter().position(|n| *n == LAST);
    if let Some(idx) = last.filter(|idx| *idx + 1 != names.len()) {
        return Err(ConfigError::inconsistent(
            path.index(idx),
            format!("{LAST} must be the last step"),
        ));
    }

    for (idx, step) in pipeline.iter().enumerate() {
        if let Some(inner) = step.inner_pipeline() {
            check_pipeline(inner, &path.index(idx).field("transforms"))?;
        }
    }
    Ok(())
}
