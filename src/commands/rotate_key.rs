use anyhow::{Context, Result};

use idleprefs::cipher::random_hex;
use idleprefs::config;

pub fn run() -> Result<()> {
    let root = config::project_root()?;
    let mut settings = super::open_settings(&root)?;
    let mut cfg = config::read(&root)?;
    let old_salt = cfg.salt.clone();

    // The old key stays on disk until the password is saved under the new one.
    let key_path = config::device_key_path(&root);
    let backup_path = key_path.with_extension("key.old");
    let backed_up = key_path.exists();
    if backed_up {
        std::fs::copy(&key_path, &backup_path).context("Failed to back up device key")?;
    }

    cfg.salt = random_hex(config::SALT_LEN);
    let rotated = config::write(&root, &cfg)
        .and_then(|()| config::write_device_key(&root))
        .and_then(|()| config::load_cipher(&root, &cfg))
        .and_then(|cipher| settings.rekey(Box::new(cipher)));

    if let Err(e) = rotated {
        cfg.salt = old_salt;
        config::write(&root, &cfg).context("Failed to restore config")?;
        if backed_up {
            std::fs::rename(&backup_path, &key_path).context("Failed to restore device key")?;
        } else {
            let _ = std::fs::remove_file(&key_path);
        }
        return Err(e).context("Failed to rotate device key");
    }

    if backed_up {
        std::fs::remove_file(&backup_path)?;
    }
    println!("Device key rotated successfully.");
    Ok(())
}
