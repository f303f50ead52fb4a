use anyhow::Result;

use idleprefs::config;

pub fn run(key: &str) -> Result<()> {
    let root = config::project_root()?;
    let settings = super::open_settings(&root)?;

    println!("{}", settings.get_value(key)?);
    Ok(())
}
