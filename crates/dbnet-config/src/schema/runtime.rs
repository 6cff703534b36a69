//! Schedule and runtime sections usually pulled in through `_base_` files.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OptimizerSpec {
    #[serde(rename = "SGD")]
    Sgd {
        lr: f64,
        #[serde(default)]
        momentum: f64,
        #[serde(default)]
        weight_decay: f64,
        #[serde(default)]
        nesterov: bool,
    },
    Adam(AdamSpec),
    AdamW(AdamSpec),
}

impl OptimizerSpec {
    #[must_use]
    pub fn lr(&self) -> f64 {
        match self {
            Self::Sgd { lr, .. } => *lr,
            Self::Adam(spec) | Self::AdamW(spec) => spec.lr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdamSpec {
    pub lr: f64,
    #[serde(default = "default_betas")]
    pub betas: (f64, f64),
    #[serde(default)]
    pub weight_decay: f64,
}

fn default_betas() -> (f64, f64) {
    (0.9, 0.999)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradClip {
    pub max_norm: f64,
    #[serde(default = "default_norm_type")]
    pub norm_type: f64,
}

fn default_norm_type() -> f64 {
    2.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grad_clip: Option<GradClip>,
}

/// Learning-rate schedule; discriminated by `policy` rather than `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum LrPolicySpec {
    Poly {
        #[serde(default = "default_power")]
        power: f64,
        #[serde(default)]
        min_lr: f64,
        #[serde(default = "default_true")]
        by_epoch: bool,
    },
    Step {
        step: Vec<u32>,
        #[serde(default = "default_gamma")]
        gamma: f64,
        #[serde(default = "default_true")]
        by_epoch: bool,
    },
}

fn default_power() -> f64 {
    1.0
}

fn default_gamma() -> f64 {
    0.1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    pub interval: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    pub interval: u32,
    #[serde(default)]
    pub hooks: Vec<LoggerHookSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LoggerHookSpec {
    TextLoggerHook {
        #[serde(default = "default_true")]
        by_epoch: bool,
    },
    TensorboardLoggerHook {
        #[serde(default = "default_true")]
        by_epoch: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sgd_from_schedule() {
        let opt: OptimizerSpec = serde_json::from_value(json!({
            "type": "SGD",
            "lr": 0.007,
            "momentum": 0.9,
            "weight_decay": 0.0001
        }))
        .unwrap();
        assert!((opt.lr() - 0.007).abs() < f64::EPSILON);
    }

    #[test]
    fn test_poly_policy_tag() {
        let policy = json!({"policy": "poly", "power": 0.9, "min_lr": 1e-7});
        let lr: LrPolicySpec = serde_json::from_value(policy).unwrap();
        match lr {
            LrPolicySpec::Poly { by_epoch, .. } => assert!(by_epoch),
            LrPolicySpec::Step { .. } => panic!("expected poly"),
        }
    }

    #[test]
    fn test_log_level_uppercase() {
        let level: LogLevel = serde_json::from_value(json!("WARNING")).unwrap();
        assert_eq!(level, LogLevel::Warning);
    }
}
