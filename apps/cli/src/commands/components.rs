//! List the components each built-in registry knows.

use colored::Colorize;
use dbnet_config::{ComponentDescriptor, Registries, RegistryScope};
use serde::Serialize;

#[derive(Serialize)]
struct ScopeInfo {
    scope: RegistryScope,
    discriminator: &'static str,
    components: Vec<ComponentInfo>,
}

#[derive(Serialize)]
struct ComponentInfo {
    name: &'static str,
    summary: &'static str,
    fields: Vec<FieldInfo>,
}

#[derive(Serialize)]
struct FieldInfo {
    name: &'static str,
    kind: String,
    required: bool,
}

impl From<&ComponentDescriptor> for ComponentInfo {
    fn from(desc: &ComponentDescriptor) -> Self {
        Self {
            name: desc.name,
            summary: desc.summary,
            fields: desc
                .fields
                .iter()
                .map(|f| FieldInfo {
                    name: f.name,
                    kind: f.kind.describe(),
                    required: f.required,
                })
                .collect(),
        }
    }
}

pub fn execute(scope: Option<RegistryScope>, json: bool) -> anyhow::Result<()> {
    let registries = Registries::builtin();
    let scopes: Vec<RegistryScope> =
        scope.map_or_else(|| RegistryScope::ALL.to_vec(), |s| vec![s]);

    let mut listing = Vec::with_capacity(scopes.len());
    for scope in scopes {
        let registry = registries
            .get(scope)
            .ok_or_else(|| anyhow::anyhow!("No registry for scope {scope}"))?;
        let components = registry
            .names()
            .into_iter()
            .map(|name| registry.resolve(name).map(ComponentInfo::from))
            .collect::<Result<Vec<_>, _>>()?;
        listing.push(ScopeInfo {
            scope,
            discriminator: scope.discriminator(),
            components,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    for info in &listing {
        println!(
            "{} {}",
            info.scope.to_string().bold().cyan(),
            format!("({})", info.discriminator).dimmed()
        );
        for component in &info.components {
            println!("  {} {}", component.name.bold(), component.summary.dimmed());
            for field in &component.fields {
                let required = if field.required {
                    "required".yellow().to_string()
                } else {
                    "optional".dimmed().to_string()
                };
                println!("    {:<22} {:<40} {}", field.name, field.kind, required);
            }
        }
        println!();
    }
    Ok(())
}
