use serde::{Deserialize, Serialize};

/// Per-channel image normalization shared by every `Normalize` step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImgNormCfg {
    pub mean: [f64; 3],
    pub std: [f64; 3],
    /// Convert BGR input to RGB before normalizing.
    pub to_rgb: bool,
}

impl ImgNormCfg {
    /// The named profile these values correspond to, if any.
    #[must_use]
    pub fn profile(&self) -> Option<NormProfile> {
        NormProfile::ALL.into_iter().find(|p| p.config() == *self)
    }
}

/// Named normalization conventions.
///
/// `img_norm_cfg` may be given as one of these names instead of explicit
/// values. [`NormProfile::DbnetOfficial`] is the canonical choice for DBNet
/// training; `imagenet` matches torchvision-pretrained statistics and
/// `visualize` leaves pixel values untouched for inspecting augmented
/// samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormProfile {
    DbnetOfficial,
    Imagenet,
    Visualize,
}

impl NormProfile {
    pub const ALL: [Self; 3] = [Self::DbnetOfficial, Self::Imagenet, Self::Visualize];

    #[must_use]
    pub fn canonical() -> Self {
        Self::DbnetOfficial
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::DbnetOfficial => "dbnet_official",
            Self::Imagenet => "imagenet",
            Self::Visualize => "visualize",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    #[must_use]
    pub fn config(self) -> ImgNormCfg {
        match self {
            Self::DbnetOfficial => ImgNormCfg {
                mean: [122.678_914_34, 116.668_767_62, 104.006_987_93],
                std: [255.0, 255.0, 255.0],
                to_rgb: false,
            },
            Self::Imagenet => ImgNormCfg {
                mean: [123.675, 116.28, 103.53],
                std: [58.395, 57.12, 57.375],
                to_rgb: true,
            },
            Self::Visualize => ImgNormCfg {
                mean: [0.0, 0.0, 0.0],
                std: [1.0, 1.0, 1.0],
                to_rgb: true,
            },
        }
    }
}

impl std::fmt::Display for NormProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
