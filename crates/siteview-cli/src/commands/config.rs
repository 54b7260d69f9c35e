//! Effective configuration dump

use anyhow::{Context, Result};
use siteview_core::SiteviewConfig;

pub fn run() -> Result<()> {
    let config = SiteviewConfig::load().context("Failed to load configuration")?;
    let text = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    print!("{}", text);
    Ok(())
}
