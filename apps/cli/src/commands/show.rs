//! Print the validated, fully explicit configuration.

use super::LoadArgs;
use crate::config::CliConfig;
use anyhow::Context;
use dbnet_config::ConfigFormat;

pub fn execute(
    args: &LoadArgs,
    format: Option<ConfigFormat>,
    cli_config: &CliConfig,
) -> anyhow::Result<()> {
    let format = match format {
        Some(format) => format,
        None => cli_config
            .output
            .show_format
            .parse::<ConfigFormat>()
            .map_err(anyhow::Error::msg)
            .context("Invalid show_format in CLI config")?,
    };

    let config = args
        .loader(cli_config)
        .load_path(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;

    let rendered = config
        .to_string_as(format)
        .context("Failed to render configuration")?;
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(())
}
