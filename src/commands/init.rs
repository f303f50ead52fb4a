use anyhow::{bail, Context, Result};

use idleprefs::cipher::random_hex;
use idleprefs::config;

pub fn run() -> Result<()> {
    let root = config::project_root()?;
    let cfg_path = config::config_path(&root);

    if cfg_path.exists() {
        bail!(
            "idleprefs is already initialized in this directory. \
             To reinitialize, delete .idleprefs/ first."
        );
    }

    println!("Initializing preference store...");

    let cfg = config::Config::default_new(random_hex(config::SALT_LEN));

    // Write config first; this creates the .idleprefs/ directory
    config::write(&root, &cfg).context("Failed to write config")?;
    config::write_device_key(&root).context("Failed to write device key")?;

    let settings = super::open_settings(&root)?;

    println!("Initialized (schema version {}).", settings.version());
    println!();
    println!("  1. Store the account:  idleprefs set username <name>");
    println!("  2. Store the password: idleprefs password set");
    println!("  3. Review settings:    idleprefs list");

    Ok(())
}
