use anyhow::{Context, Result};

use idleprefs::config;

pub fn run(key: &str, value: &str) -> Result<()> {
    let root = config::project_root()?;
    let mut settings = super::open_settings(&root)?;

    settings
        .set_value(key, value)
        .with_context(|| format!("Failed to set '{}'", key))?;

    println!("Setting '{}' saved.", key);
    Ok(())
}
