//! DBNet Config
//!
//! Loader and validator for DBNet text-detection training configurations:
//! - Parsing TOML, JSON and YAML documents with `_base_` inheritance
//! - Resolving component discriminators against injectable registries
//! - Typed, immutable [`Config`] handed to the training engine
//! - Cross-field, pipeline ordering and path existence checks

pub mod catalog;
pub mod consistency;
pub mod document;
pub mod error;
pub mod inherit;
pub mod loader;
pub mod ordering;
pub mod path;
pub mod prepare;
pub mod probe;
pub mod registry;
pub mod schema;
pub mod structure;

pub use document::ConfigFormat;
pub use error::{ConfigError, ConfigResult, ErrorKind};
pub use loader::{ConfigLoader, LoadOptions, PathCheck};
pub use ordering::OrderPolicy;
pub use path::FieldPath;
pub use probe::{LocalFs, PathProbe};
pub use registry::{
    ComponentDescriptor, ComponentRegistry, FieldKind, FieldSpec, Registries, RegistryScope,
    StaticRegistry, UnknownComponent,
};
pub use schema::{Config, ImgNormCfg, NormProfile, Pipeline, TransformSpec};
pub use structure::StructureValidator;
