use anyhow::{Context, Result};
use cardiregen_core::config::AppConfig;
use cardiregen_infrastructure::ConfigService;

pub fn show(config: &AppConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    print!("{rendered}");
    if config.endpoint.is_none() {
        eprintln!("# endpoint is not set; pass --endpoint or set CARDIREGEN_ENDPOINT");
    }
    Ok(())
}

pub fn path(service: &ConfigService) {
    println!("{}", service.path().display());
}
