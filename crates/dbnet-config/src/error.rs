//! Error types for configuration loading.

use crate::document::ConfigFormat;
use crate::path::FieldPath;
use crate::registry::RegistryScope;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Coarse classification of a [`ConfigError`], stable for tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingField,
    UnknownDiscriminator,
    TypeMismatch,
    CrossFieldConsistency,
    PathNotFound,
    UnexpectedField,
    BaseCycle,
    Parse,
    Serialize,
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::MissingField => "missing_field",
            Self::UnknownDiscriminator => "unknown_discriminator",
            Self::TypeMismatch => "type_mismatch",
            Self::CrossFieldConsistency => "cross_field_consistency",
            Self::PathNotFound => "path_not_found",
            Self::UnexpectedField => "unexpected_field",
            Self::BaseCycle => "base_cycle",
            Self::Parse => "parse",
            Self::Serialize => "serialize",
            Self::Io => "io",
        };
        f.write_str(name)
    }
}

/// Fatal configuration error. Every field-level variant carries the dotted
/// path of the offending field.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field is absent (or null).
    #[error("missing required field `{path}`")]
    MissingField { path: FieldPath },

    /// A discriminator names nothing the registry knows.
    #[error("unknown {scope} `{name}` at `{path}` (known: {})", .known.join(", "))]
    UnknownDiscriminator {
        path: FieldPath,
        scope: RegistryScope,
        name: String,
        known: Vec<String>,
    },

    /// A value has the wrong kind or lies outside its domain.
    #[error("type mismatch at `{path}`: expected {expected}, found {found}")]
    TypeMismatch {
        path: FieldPath,
        expected: String,
        found: String,
    },

    /// Individually valid fields disagree with each other.
    #[error("inconsistent configuration at `{path}`: {message}")]
    CrossFieldConsistency { path: FieldPath, message: String },

    /// A referenced file or directory does not exist.
    #[error("path not found for `{path}`: {}", .target.display())]
    PathNotFound { path: FieldPath, target: PathBuf },

    /// A key not accepted by the component it appears in.
    #[error("unexpected field `{path}`")]
    UnexpectedField { path: FieldPath },

    /// `_base_` includes form a cycle.
    #[error("base config cycle: {}", display_chain(.chain))]
    BaseCycle { chain: Vec<PathBuf> },

    /// The document text could not be parsed.
    #[error("failed to parse {format} document {origin}: {message}")]
    Parse {
        format: ConfigFormat,
        origin: String,
        message: String,
    },

    /// A validated configuration could not be rendered.
    #[error("failed to render {format} document: {message}")]
    Serialize {
        format: ConfigFormat,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn missing(path: FieldPath) -> Self {
        Self::MissingField { path }
    }

    pub(crate) fn mismatch(
        path: FieldPath,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            path,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn inconsistent(path: FieldPath, message: impl Into<String>) -> Self {
        Self::CrossFieldConsistency {
            path,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField { .. } => ErrorKind::MissingField,
            Self::UnknownDiscriminator { .. } => ErrorKind::UnknownDiscriminator,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::CrossFieldConsistency { .. } => ErrorKind::CrossFieldConsistency,
            Self::PathNotFound { .. } => ErrorKind::PathNotFound,
            Self::UnexpectedField { .. } => ErrorKind::UnexpectedField,
            Self::BaseCycle { .. } => ErrorKind::BaseCycle,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Serialize { .. } => ErrorKind::Serialize,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Dotted path of the offending field, when the error is field-level.
    #[must_use]
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::MissingField { path }
            | Self::UnknownDiscriminator { path, .. }
            | Self::TypeMismatch { path, .. }
            | Self::CrossFieldConsistency { path, .. }
            | Self::PathNotFound { path, .. }
            | Self::UnexpectedField { path } => Some(path),
            Self::BaseCycle { .. }
            | Self::Parse { .. }
            | Self::Serialize { .. }
            | Self::Io(_) => None,
        }
    }
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
