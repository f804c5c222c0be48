use anyhow::{Context, Result};
use culler_core::config::CullerConfig;
use culler_infrastructure::ConfigService;

pub fn path(service: &ConfigService) -> Result<()> {
    println!("{}", service.path().display());
    Ok(())
}

pub fn show(config: &CullerConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
    print!("{}", rendered);
    Ok(())
}
