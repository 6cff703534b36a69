//! Component registries.
//!
//! The external framework maps discriminator strings (`"ResNet"`, `"Pad"`,
//! `"IcdarDataset"`, ...) to constructible implementations. The loader only
//! needs to ask two questions of it: is this name known, and which fields
//! does the component accept. [`ComponentRegistry`] is that seam. The
//! built-in catalogue is a [`StaticRegistry`] per [`RegistryScope`]; any
//! scope can be swapped out through [`Registries::with_registry`].

use crate::catalog;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Which registry a discriminator is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryScope {
    Detector,
    Backbone,
    Neck,
    Head,
    Loss,
    NormLayer,
    ConvLayer,
    Transform,
    #[serde(rename = "imgaug")]
    ImgAug,
    Dataset,
    Metric,
    Optimizer,
    LrPolicy,
    LoggerHook,
    NormProfile,
}

impl RegistryScope {
    pub const ALL: [Self; 15] = [
        Self::Detector,
        Self::Backbone,
        Self::Neck,
        Self::Head,
        Self::Loss,
        Self::NormLayer,
        Self::ConvLayer,
        Self::Transform,
        Self::ImgAug,
        Self::Dataset,
        Self::Metric,
        Self::Optimizer,
        Self::LrPolicy,
        Self::LoggerHook,
        Self::NormProfile,
    ];

    /// Key holding the discriminator in a component mapping.
    #[must_use]
    pub fn discriminator(self) -> &'static str {
        match self {
            Self::LrPolicy => "policy",
            Self::ImgAug => "cls",
            _ => "type",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Detector => "detector",
            Self::Backbone => "backbone",
            Self::Neck => "neck",
            Self::Head => "head",
            Self::Loss => "loss",
            Self::NormLayer => "norm_layer",
            Self::ConvLayer => "conv_layer",
            Self::Transform => "transform",
            Self::ImgAug => "imgaug",
            Self::Dataset => "dataset",
            Self::Metric => "metric",
            Self::Optimizer => "optimizer",
            Self::LrPolicy => "lr_policy",
            Self::LoggerHook => "logger_hook",
            Self::NormProfile => "norm_profile",
        }
    }
}

impl std::fmt::Display for RegistryScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RegistryScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| format!("unknown registry scope: {s}"))
    }
}

/// Shape a field value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Int,
    NonNegativeInt,
    PositiveInt,
    /// Any number; integers are accepted.
    Float,
    Str,
    IntChoice(&'static [i64]),
    StrChoice(&'static [&'static str]),
    /// Exactly three numbers (per-channel mean/std).
    FloatTriple,
    List(&'static FieldKind),
    /// Two-element sequence, e.g. `(640, 640)`.
    Pair(&'static FieldKind),
    /// Plain nested mapping without a discriminator.
    Mapping(&'static [FieldSpec]),
    Component(RegistryScope),
    /// A bare string naming a registered component.
    ComponentName(RegistryScope),
    /// Ordered list of transform components.
    Pipeline,
    /// `ImgAug.args`: `[name, arg...]` lists or `{cls = ...}` mappings.
    ImgAugArgs,
    /// `img_norm_cfg`: a profile name or explicit `mean`/`std`/`to_rgb`.
    NormConfig(&'static [FieldSpec]),
    Any,
}

impl FieldKind {
    /// Human-readable description used in `TypeMismatch` errors.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Bool => "boolean".to_string(),
            Self::Int => "integer".to_string(),
            Self::NonNegativeInt => "non-negative integer".to_string(),
            Self::PositiveInt => "positive integer".to_string(),
            Self::Float => "number".to_string(),
            Self::Str => "string".to_string(),
            Self::IntChoice(choices) => {
                let items: Vec<String> = choices.iter().map(ToString::to_string).collect();
                format!("one of {}", items.join(", "))
            }
            Self::StrChoice(choices) => format!("one of {}", choices.join(", ")),
            Self::FloatTriple => "list of 3 numbers".to_string(),
            Self::List(inner) => format!("list of {}", inner.describe()),
            Self::Pair(inner) => format!("pair of {}", inner.describe()),
            Self::Mapping(_) => "mapping".to_string(),
            Self::Component(scope) => format!("{scope} component mapping"),
            Self::ComponentName(scope) => format!("{scope} name"),
            Self::Pipeline => "list of transform components".to_string(),
            Self::ImgAugArgs => "list of imgaug augmenters".to_string(),
            Self::NormConfig(_) => "normalization profile name or mapping".to_string(),
            Self::Any => "any value".to_string(),
        }
    }
}

/// One keyword field accepted by a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    #[must_use]
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    #[must_use]
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// What the registry knows about one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentDescriptor {
    pub name: &'static str,
    pub scope: RegistryScope,
    pub summary: &'static str,
    pub fields: &'static [FieldSpec],
}

impl ComponentDescriptor {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }
}

/// A name the registry could not resolve.
#[derive(Debug, Clone, Error)]
#[error("unknown {scope} `{name}`")]
pub struct UnknownComponent {
    pub scope: RegistryScope,
    pub name: String,
    pub known: Vec<String>,
}

pub trait ComponentRegistry: Send + Sync {
    fn scope(&self) -> RegistryScope;

    fn resolve(&self, name: &str) -> Result<&ComponentDescriptor, UnknownComponent>;

    /// Registered names, sorted.
    fn names(&self) -> Vec<&str>;
}

/// Registry backed by a fixed table of descriptors.
#[derive(Debug, Clone)]
pub struct StaticRegistry {
    scope: RegistryScope,
    entries: BTreeMap<&'static str, ComponentDescriptor>,
}

impl StaticRegistry {
    #[must_use]
    pub fn new(scope: RegistryScope) -> Self {
        Self {
            scope,
            entries: BTreeMap::new(),
        }
    }

    /// The built-in catalogue for `scope`.
    #[must_use]
    pub fn builtin(scope: RegistryScope) -> Self {
        catalog::descriptors(scope).iter().fold(Self::new(scope), |reg, desc| reg.with(*desc))
    }

    /// Add or replace a descriptor. Returns false, and leaves the registry
    /// untouched, when the descriptor belongs to another scope.
    ///
    /// A replacement can only tighten validation: documents are still
    /// checked against the built-in field table of the same component.
    pub fn register(&mut self, descriptor: ComponentDescriptor) -> bool {
        if descriptor.scope != self.scope {
            tracing::warn!(
                registry = %self.scope,
                component = descriptor.name,
                scope = %descriptor.scope,
                "Ignoring descriptor registered in the wrong scope"
            );
            return false;
        }
        self.entries.insert(descriptor.name, descriptor);
        true
    }

    /// Builder form of [`Self::register`].
    #[must_use]
    pub fn with(mut self, descriptor: ComponentDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Drop a component, e.g. to model a framework build without it.
    #[must_use]
    pub fn without(mut self, name: &str) -> Self {
        self.entries.remove(name);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ComponentRegistry for StaticRegistry {
    fn scope(&self) -> RegistryScope {
        self.scope
    }

    fn resolve(&self, name: &str) -> Result<&ComponentDescriptor, UnknownComponent> {
        self.entries.get(name).ok_or_else(|| UnknownComponent {
            scope: self.scope,
            name: name.to_string(),
            known: self.entries.keys().map(|k| (*k).to_string()).collect(),
        })
    }

    fn names(&self) -> Vec<&str> {
        self.entries.keys().copied().collect()
    }
}

/// One registry per scope.
#[derive(Clone)]
pub struct Registries {
    scopes: BTreeMap<RegistryScope, Arc<dyn ComponentRegistry>>,
}

impl Registries {
    #[must_use]
    pub fn builtin() -> Self {
        let scopes = RegistryScope::ALL
            .into_iter()
            .map(|scope| {
                let registry: Arc<dyn ComponentRegistry> = Arc::new(StaticRegistry::builtin(scope));
                (scope, registry)
            })
            .collect();
        Self { scopes }
    }

    /// Replace the registry for the scope `registry` reports.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<dyn ComponentRegistry>) -> Self {
        self.scopes.insert(registry.scope(), registry);
        self
    }

    #[must_use]
    pub fn get(&self, scope: RegistryScope) -> Option<&dyn ComponentRegistry> {
        self.scopes.get(&scope).map(|r| r.as_ref())
    }

    pub fn resolve(
        &self,
        scope: RegistryScope,
        name: &str,
    ) -> Result<&ComponentDescriptor, UnknownComponent> {
        match self.get(scope) {
            Some(registry) => registry.resolve(name),
            None => Err(UnknownComponent {
                scope,
                name: name.to_string(),
                known: Vec::new(),
            }),
        }
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for Registries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (scope, registry) in &self.scopes {
            map.entry(&scope.as_str(), &registry.names());
        }
        map.finish()
    }
}
