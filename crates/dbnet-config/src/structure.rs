//! Descriptor-driven structural validation of a raw document.
//!
//! Walks the document in declaration order, resolving every discriminator
//! against the injected [`Registries`] and checking each field against the
//! [`FieldKind`] its descriptor declares. The first problem found is
//! returned.

use crate::catalog;
use crate::document::describe;
use crate::error::{ConfigError, ConfigResult};
use crate::path::FieldPath;
use crate::registry::{
    ComponentDescriptor, FieldKind, FieldSpec, Registries, RegistryScope, UnknownComponent,
};
use serde_json::{Map, Value};

pub struct StructureValidator<'a> {
    registries: &'a Registries,
}

impl<'a> StructureValidator<'a> {
    #[must_use]
    pub fn new(registries: &'a Registries) -> Self {
        Self { registries }
    }

    /// Validate a whole configuration document.
    pub fn validate(&self, doc: &Value) -> ConfigResult<()> {
        let root = FieldPath::root();
        let map = doc
            .as_object()
            .ok_or_else(|| ConfigError::mismatch(root.clone(), "mapping", describe(doc)))?;
        self.check_fields(map, catalog::ROOT_FIELDS, &root, &[])
    }

    /// Check declared fields first, then reject keys nobody declared.
    /// `reserved` keys (the discriminator) are skipped.
    fn check_fields(
        &self,
        map: &Map<String, Value>,
        fields: &[FieldSpec],
        path: &FieldPath,
        reserved: &[&str],
    ) -> ConfigResult<()> {
        for spec in fields {
            let field_path = path.field(spec.name);
            match map.get(spec.name) {
                None | Some(Value::Null) if spec.required => {
                    return Err(ConfigError::missing(field_path));
                }
                None | Some(Value::Null) => {}
                Some(value) => self.check_kind(value, &spec.kind, &field_path)?,
            }
        }

        for key in map.keys() {
            if reserved.iter().any(|r| *r == key.as_str())
                || fields.iter().any(|f| f.name == key.as_str())
            {
                continue;
            }
            return Err(ConfigError::UnexpectedField {
                path: path.field(key),
            });
        }
        Ok(())
    }

    fn check_kind(&self, value: &Value, kind: &FieldKind, path: &FieldPath) -> ConfigResult<()> {
        let mismatch = || ConfigError::mismatch(path.clone(), kind.describe(), describe(value));

        match kind {
            FieldKind::Any => Ok(()),
            FieldKind::Bool => value.as_bool().map(|_| ()).ok_or_else(mismatch),
            FieldKind::Int => value
                .as_i64()
                .filter(|n| i32::try_from(*n).is_ok())
                .map(|_| ())
                .ok_or_else(mismatch),
            FieldKind::NonNegativeInt => value
                .as_u64()
                .filter(|n| u32::try_from(*n).is_ok())
                .map(|_| ())
                .ok_or_else(mismatch),
            FieldKind::PositiveInt => value
                .as_u64()
                .filter(|n| *n > 0 && u32::try_from(*n).is_ok())
                .map(|_| ())
                .ok_or_else(mismatch),
            FieldKind::Float => value.as_f64().map(|_| ()).ok_or_else(mismatch),
            FieldKind::Str => value.as_str().map(|_| ()).ok_or_else(mismatch),
            FieldKind::IntChoice(choices) => value
                .as_i64()
                .filter(|n| choices.contains(n))
                .map(|_| ())
                .ok_or_else(mismatch),
            FieldKind::StrChoice(choices) => value
                .as_str()
                .filter(|s| choices.iter().any(|c| c == s))
                .map(|_| ())
                .ok_or_else(mismatch),
            FieldKind::FloatTriple => match value.as_array() {
                Some(items) if items.len() == 3 => {
                    for (idx, item) in items.iter().enumerate() {
                        self.check_kind(item, &FieldKind::Float, &path.index(idx))?;
                    }
                    Ok(())
                }
                _ => Err(mismatch()),
            },
            FieldKind::List(inner) => {
                let items = value.as_array().ok_or_else(mismatch)?;
                for (idx, item) in items.iter().enumerate() {
                    self.check_kind(item, inner, &path.index(idx))?;
                }
                Ok(())
            }
            FieldKind::Pair(inner) => match value.as_array() {
                Some(items) if items.len() == 2 => {
                    for (idx, item) in items.iter().enumerate() {
                        self.check_kind(item, inner, &path.index(idx))?;
                    }
                    Ok(())
                }
                _ => Err(mismatch()),
            },
            FieldKind::Mapping(fields) => {
                let map = value.as_object().ok_or_else(mismatch)?;
                self.check_fields(map, fields, path, &[])
            }
            FieldKind::Component(scope) => self.check_component(value, *scope, path),
            FieldKind::ComponentName(scope) => {
                let name = value.as_str().ok_or_else(mismatch)?;
                self.resolve(*scope, name, path.clone()).map(|_| ())
            }
            FieldKind::Pipeline => self.check_pipeline(value, path),
            FieldKind::ImgAugArgs => self.check_imgaug_args(value, path),
            FieldKind::NormConfig(fields) => match value {
                Value::String(name) => self
                    .resolve(RegistryScope::NormProfile, name, path.clone())
                    .map(|_| ()),
                Value::Object(map) => self.check_fields(map, fields, path, &[]),
                _ => Err(mismatch()),
            },
        }
    }

    fn check_component(
        &self,
        value: &Value,
        scope: RegistryScope,
        path: &FieldPath,
    ) -> ConfigResult<()> {
        let expected = FieldKind::Component(scope).describe();
        let map = value
            .as_object()
            .ok_or_else(|| ConfigError::mismatch(path.clone(), expected, describe(value)))?;

        let disc = scope.discriminator();
        let disc_path = path.field(disc);
        let name = match map.get(disc) {
            None | Some(Value::Null) => return Err(ConfigError::missing(disc_path)),
            Some(Value::String(name)) => name,
            Some(other) => return Err(ConfigError::mismatch(disc_path, "string", describe(other))),
        };

        let descriptor = self.resolve(scope, name, disc_path)?;
        self.check_fields(map, descriptor.fields, path, &[disc])?;

        // A replaced descriptor may be looser than the field table the typed
        // schema deserializes.
        match builtin(scope, name) {
            Some(builtin) if builtin.fields != descriptor.fields => {
                self.check_fields(map, builtin.fields, path, &[disc])
            }
            _ => Ok(()),
        }
    }

    fn check_pipeline(&self, value: &Value, path: &FieldPath) -> ConfigResult<()> {
        match value {
            Value::Array(steps) => {
                for (idx, step) in steps.iter().enumerate() {
                    self.check_component(step, RegistryScope::Transform, &path.index(idx))?;
                }
                Ok(())
            }
            Value::String(_) => Err(ConfigError::mismatch(
                path.clone(),
                "list of transform components or a reference to `train_pipeline`/`test_pipeline`",
                describe(value),
            )),
            _ => Err(ConfigError::mismatch(
                path.clone(),
                FieldKind::Pipeline.describe(),
                describe(value),
            )),
        }
    }

    fn check_imgaug_args(&self, value: &Value, path: &FieldPath) -> ConfigResult<()> {
        let expected = FieldKind::ImgAugArgs.describe();
        let items = value
            .as_array()
            .ok_or_else(|| ConfigError::mismatch(path.clone(), expected, describe(value)))?;

        for (idx, item) in items.iter().enumerate() {
            let item_path = path.index(idx);
            let (name_path, name) = match item {
                Value::Array(parts) => (item_path.index(0), parts.first()),
                Value::Object(map) => {
                    let disc = RegistryScope::ImgAug.discriminator();
                    (item_path.field(disc), map.get(disc))
                }
                other => {
                    return Err(ConfigError::mismatch(
                        item_path,
                        "`[name, arg...]` list or mapping with `cls`",
                        describe(other),
                    ));
                }
            };
            match name {
                None | Some(Value::Null) => return Err(ConfigError::missing(name_path)),
                Some(Value::String(name)) => {
                    self.resolve(RegistryScope::ImgAug, name, name_path)?;
                }
                Some(other) => {
                    return Err(ConfigError::mismatch(
                        name_path,
                        "augmenter name",
                        describe(other),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Resolve `name` in the injected registry. The name must also be one the
    /// typed schema can represent; an injected registry may narrow the
    /// built-in set but cannot extend it.
    fn resolve(
        &self,
        scope: RegistryScope,
        name: &str,
        path: FieldPath,
    ) -> ConfigResult<&'a ComponentDescriptor> {
        let unknown = |err: UnknownComponent| ConfigError::UnknownDiscriminator {
            path: path.clone(),
            scope,
            name: name.to_string(),
            known: err.known.into_iter().filter(|k| is_builtin(scope, k)).collect(),
        };

        let descriptor = self.registries.resolve(scope, name).map_err(unknown)?;
        if !is_builtin(scope, name) {
            let known = self
                .registries
                .get(scope)
                .map(|r| r.names())
                .unwrap_or_default();
            return Err(unknown(UnknownComponent {
                scope,
                name: name.to_string(),
                known: known.into_iter().map(str::to_string).collect(),
            }));
        }
        Ok(descriptor)
    }
}

fn builtin(scope: RegistryScope, name: &str) -> Option<&'static ComponentDescriptor> {
    catalog::descriptors(scope).iter().find(|d| d.name == name)
}

fn is_builtin(scope: RegistryScope, name: &str) -> bool {
    builtin(scope, name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn validate(doc: &Value) -> ConfigResult<()> {
        let regs = Registries::builtin();
        StructureValidator::new(&regs).check_fields(
            doc.as_object().unwrap(),
            catalog::ROOT_FIELDS,
            &FieldPath::root(),
            &[],
        )
    }

    fn check(value: &Value, kind: FieldKind) -> ConfigResult<()> {
        let regs = Registries::builtin();
        StructureValidator::new(&regs).check_kind(value, &kind, &FieldPath::key("field"))
    }

    #[test]
    fn test_positive_int_rejects_negative() {
        let err = check(&json!(-1), FieldKind::PositiveInt).unwrap_err();
        match err {
            ConfigError::TypeMismatch {
                expected,
                found,
                ..
            } => {
                assert_eq!(expected, "positive integer");
                assert_eq!(found, "integer `-1`");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(check(&json!(0), FieldKind::PositiveInt).is_err());
        assert!(check(&json!(8), FieldKind::PositiveInt).is_ok());
    }

    #[test]
    fn test_float_accepts_integers() {
        assert!(check(&json!(255), FieldKind::Float).is_ok());
        assert!(check(&json!("255"), FieldKind::Float).is_err());
    }

    #[test]
    fn test_float_triple_length() {
        assert!(check(&json!([1.0, 2.0, 3.0]), FieldKind::FloatTriple).is_ok());
        assert!(check(&json!([1.0, 2.0]), FieldKind::FloatTriple).is_err());
        let err = check(&json!([1.0, "x", 3.0]), FieldKind::FloatTriple).unwrap_err();
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("field[1]"));
    }

    #[test]
    fn test_int_choice() {
        assert!(check(&json!(50), FieldKind::IntChoice(catalog::RESNET_DEPTHS)).is_ok());
        assert!(check(&json!(42), FieldKind::IntChoice(catalog::RESNET_DEPTHS)).is_err());
    }

    #[test]
    fn test_component_missing_discriminator() {
        let kind = FieldKind::Component(RegistryScope::Backbone);
        let err = check(&json!({"depth": 50}), kind).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("field.type"));
    }

    #[test]
    fn test_component_unknown_name() {
        let kind = FieldKind::Component(RegistryScope::Neck);
        let err = check(&json!({"type": "FooBar"}), kind).unwrap_err();
        match err {
            ConfigError::UnknownDiscriminator {
                path,
                scope,
                name,
                known,
            } => {
                assert_eq!(path.to_string(), "field.type");
                assert_eq!(scope, RegistryScope::Neck);
                assert_eq!(name, "FooBar");
                assert_eq!(known, vec!["FPNC".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_component_unexpected_field() {
        let err = check(
            &json!({"type": "Pad", "size_divisor": 32, "colour": 1}),
            FieldKind::Component(RegistryScope::Transform),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnexpectedField { .. }));
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("field.colour"));
    }

    #[test]
    fn test_lr_policy_uses_policy_key() {
        let kind = FieldKind::Component(RegistryScope::LrPolicy);
        assert!(check(&json!({"policy": "poly", "power": 0.9}), kind).is_ok());
        let err = check(&json!({"type": "poly"}), kind).unwrap_err();
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("field.policy"));
    }

    #[test]
    fn test_imgaug_args_resolve_augmenters() {
        let kind = FieldKind::ImgAugArgs;
        let args = json!([["Fliplr", 0.5], {"cls": "Affine", "rotate": [-10, 10]}]);
        assert!(check(&args, kind).is_ok());

        let err = check(&json!([["Fliplr", 0.5], {"cls": "Sharpen"}]), kind).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDiscriminator { .. }));
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("field[1].cls"));

        let err = check(&json!([["Blur"]]), kind).unwrap_err();
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("field[0][0]"));
    }

    #[test]
    fn test_pipeline_reference_left_unresolved() {
        let err = check(&json!("eval_pipeline"), FieldKind::Pipeline).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
        assert!(err.to_string().contains("reference"));
    }

    #[test]
    fn test_norm_config_unknown_profile() {
        let kind = FieldKind::NormConfig(catalog::IMG_NORM_FIELDS);
        let err = check(&json!("bogus"), kind).unwrap_err();
        match err {
            ConfigError::UnknownDiscriminator { scope, known, .. } => {
                assert_eq!(scope, RegistryScope::NormProfile);
                assert_eq!(known, vec!["dbnet_official", "imagenet", "visualize"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_root_missing_section() {
        let err = validate(&json!({})).unwrap_err();
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("model"));
    }

    #[test]
    fn test_root_unknown_section() {
        let doc = json!({"mdoel": {}});
        let err = validate(&doc).unwrap_err();
        // declared sections are checked before stray keys
        assert!(matches!(err, ConfigError::MissingField { .. }));
    }

    #[test]
    fn test_custom_registry_cannot_extend_schema() {
        let extended = StaticRegistry::builtin(RegistryScope::Neck).with(ComponentDescriptor {
            name: "FPN",
            scope: RegistryScope::Neck,
            summary: "Feature pyramid",
            fields: &[],
        });
        let regs = Registries::builtin().with_registry(Arc::new(extended));
        let err = StructureValidator::new(&regs)
            .check_kind(
                &json!({"type": "FPN"}),
                &FieldKind::Component(RegistryScope::Neck),
                &FieldPath::key("neck"),
            )
            .unwrap_err();
        match err {
            ConfigError::UnknownDiscriminator { name, known, .. } => {
                assert_eq!(name, "FPN");
                assert_eq!(known, vec!["FPNC".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_replaced_descriptor_still_checked_against_builtin_fields() {
        const LOOSE_FPNC: &[FieldSpec] = &[
            FieldSpec::required("in_channels", FieldKind::Any),
            FieldSpec::required("lateral_channels", FieldKind::Any),
            FieldSpec::optional("out_channels", FieldKind::Any),
            FieldSpec::optional("dilation", FieldKind::Int),
        ];
        let mut necks = StaticRegistry::builtin(RegistryScope::Neck);
        assert!(necks.register(ComponentDescriptor {
            name: "FPNC",
            scope: RegistryScope::Neck,
            summary: "Loose FPNC",
            fields: LOOSE_FPNC,
        }));
        let regs = Registries::builtin().with_registry(Arc::new(necks));
        let validator = StructureValidator::new(&regs);
        let kind = FieldKind::Component(RegistryScope::Neck);
        let neck = |value: Value| validator.check_kind(&value, &kind, &FieldPath::key("neck"));

        let err = neck(json!({
            "type": "FPNC",
            "in_channels": [256],
            "lateral_channels": 256,
            "out_channels": "wide",
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("neck.out_channels"));

        let err = neck(json!({
            "type": "FPNC",
            "in_channels": [256],
            "lateral_channels": 256,
            "dilation": 2,
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnexpectedField { .. }));
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("neck.dilation"));

        let valid = json!({"type": "FPNC", "in_channels": [256], "lateral_channels": 256});
        assert!(neck(valid).is_ok());
    }

    #[test]
    fn test_narrowed_registry_rejects_removed_component() {
        let convs = StaticRegistry::builtin(RegistryScope::ConvLayer).without("DCNv2");
        let regs = Registries::builtin().with_registry(Arc::new(convs));
        let err = StructureValidator::new(&regs)
            .check_kind(
                &json!({"type": "DCNv2"}),
                &FieldKind::Component(RegistryScope::ConvLayer),
                &FieldPath::key("dcn"),
            )
            .unwrap_err();
        match err {
            ConfigError::UnknownDiscriminator { known, .. } => {
                assert_eq!(known, vec!["DCN".to_string()])
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
