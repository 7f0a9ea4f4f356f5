//! `keyhints check-config`: load and validate settings.

use std::path::PathBuf;

use anyhow::bail;

use keyhints_config::{ConfigLoader, ConfigValidator};

pub(crate) fn run(config: Option<&PathBuf>) -> anyhow::Result<()> {
    match config.cloned().or_else(ConfigLoader::default_path) {
        Some(path) if path.exists() => println!("Checking {}", path.display()),
        _ => println!("No settings file; checking defaults"),
    }
    let settings = crate::load_settings(config)?;
    let result = ConfigValidator::validate(&settings)?;

    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }
    if !result.is_valid() {
        bail!("{} invalid setting(s)", result.errors.len());
    }
    println!(
        "Settings OK ({} hint characters, {} exclusion rules)",
        settings.link_hint_characters.chars().count(),
        settings.exclusion_rules.len()
    );
    Ok(())
}
