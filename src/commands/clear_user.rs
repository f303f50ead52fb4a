use anyhow::{Context, Result};

use idleprefs::config;

pub fn run() -> Result<()> {
    let root = config::project_root()?;
    let mut settings = super::open_settings(&root)?;

    settings.clear_user().context("Failed to clear user")?;

    println!("Logged out. Device preferences were kept.");
    Ok(())
}
