//! List named image normalization profiles.

use colored::Colorize;
use dbnet_config::NormProfile;
use serde::Serialize;

#[derive(Serialize)]
struct ProfileInfo {
    name: &'static str,
    canonical: bool,
    mean: [f64; 3],
    std: [f64; 3],
    to_rgb: bool,
}

pub fn execute(json: bool) -> anyhow::Result<()> {
    let profiles: Vec<ProfileInfo> = NormProfile::ALL
        .into_iter()
        .map(|profile| {
            let cfg = profile.config();
            ProfileInfo {
                name: profile.name(),
                canonical: profile == NormProfile::canonical(),
                mean: cfg.mean,
                std: cfg.std,
                to_rgb: cfg.to_rgb,
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    println!("{}", "Normalization profiles".bold().cyan());
    println!();
    for profile in &profiles {
        let marker = if profile.canonical {
            " (canonical)".green().to_string()
        } else {
            String::new()
        };
        println!("  {}{}", profile.name.bold(), marker);
        println!("    mean:   {:?}", profile.mean);
        println!("    std:    {:?}", profile.std);
        println!("    to_rgb: {}", profile.to_rgb);
    }
    println!();
    Ok(())
}
