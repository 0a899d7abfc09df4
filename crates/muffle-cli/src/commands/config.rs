/// Configuration management command handlers
use anyhow::Result;
use muffle_core::{config::get_config_path, Config};

pub fn show_path() -> Result<()> {
    println!("{}", get_config_path()?.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let config = Config::load()?;
    print!("{}", config.masked().to_toml()?);
    Ok(())
}

pub fn init_config() -> Result<()> {
    let path = get_config_path()?;
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }
    Config::default().save_to(&path)?;
    println!("Wrote default config to {}", path.display());
    println!("Set service.api_key there or export MUFFLE_API_KEY.");
    Ok(())
}
