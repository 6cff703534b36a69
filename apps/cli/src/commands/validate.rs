//! Configuration validation command.
//!
//! Loads a document through every validation stage and reports the first
//! error with its kind and dotted field path.

use super::LoadArgs;
use crate::config::CliConfig;
use colored::Colorize;
use dbnet_config::{Config, ConfigError};
use serde::Serialize;

#[derive(Serialize)]
struct JsonOutput {
    file: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
}

#[derive(Serialize)]
struct Summary {
    model: &'static str,
    backbone: &'static str,
    depth: u32,
    neck: &'static str,
    head: &'static str,
    img_norm_profile: Option<String>,
    train_steps: Vec<&'static str>,
    test_steps: Vec<&'static str>,
    datasets: Vec<&'static str>,
    total_epochs: Option<u32>,
}

#[derive(Serialize)]
struct JsonError {
    kind: dbnet_config::ErrorKind,
    path: Option<String>,
    message: String,
}

impl Summary {
    fn new(config: &Config) -> Self {
        Self {
            model: config.model.name(),
            backbone: config.model.backbone().name(),
            depth: config.model.backbone().resnet().depth,
            neck: config.model.neck().name(),
            head: config.model.head().name(),
            img_norm_profile: config.img_norm_cfg.profile().map(|p| p.to_string()),
            train_steps: config.train_pipeline.names(),
            test_steps: config.test_pipeline.names(),
            datasets: config
                .data
                .datasets()
                .into_iter()
                .map(|(split, _)| split)
                .collect(),
            total_epochs: config.total_epochs,
        }
    }
}

/// Execute the validate command. Exits with status 1 when the document is invalid.
pub fn execute(args: &LoadArgs, json: bool, cli_config: &CliConfig) -> anyhow::Result<()> {
    let json = json || cli_config.output.always_json;
    let file = args.file.display().to_string();

    if !json {
        println!("{}", "dbcfg validate".bold().cyan());
        println!();
        println!("  Validating {}...", file);
        println!();
    }

    let result = args.loader(cli_config).load_path(&args.file);

    if json {
        let output = match &result {
            Ok(config) => JsonOutput {
                file,
                valid: true,
                summary: Some(Summary::new(config)),
                error: None,
            },
            Err(err) => JsonOutput {
                file,
                valid: false,
                summary: None,
                error: Some(JsonError {
                    kind: err.kind(),
                    path: err.path().map(ToString::to_string),
                    message: err.to_string(),
                }),
            },
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        match &result {
            Ok(config) => output_valid(&Summary::new(config)),
            Err(err) => output_invalid(err),
        }
    }

    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

fn output_valid(summary: &Summary) {
    println!("  {} {}", "✓".green().bold(), "Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    println!(
        "  Model:     {} ({}-{} + {} + {})",
        summary.model, summary.backbone, summary.depth, summary.neck, summary.head
    );
    println!(
        "  Norm:      {}",
        summary.img_norm_profile.as_deref().unwrap_or("custom").to_string().dimmed()
    );
    println!("  Train:     {}", summary.train_steps.join(" → ").dimmed());
    println!("  Test:      {}", summary.test_steps.join(" → ").dimmed());
    println!("  Datasets:  {}", summary.datasets.join(", "));
    if let Some(epochs) = summary.total_epochs {
        println!("  Epochs:    {}", epochs);
    }
    println!();
}

fn output_invalid(err: &ConfigError) {
    println!("  {} {}", "✗".red().bold(), "Configuration is invalid".red());
    println!();
    println!("    {}: {}", "Kind".red(), err.kind());
    if let Some(path) = err.path() {
        println!("    {}: {}", "Path".red(), path.to_string().bold());
    }
    println!("    {}: {}", "Error".red(), err.to_string().dimmed());
    println!();
}
