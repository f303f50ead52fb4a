use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};

use idleprefs::{config, PrefsError};

pub fn set() -> Result<()> {
    let root = config::project_root()?;
    let mut settings = super::open_settings(&root)?;

    let password =
        rpassword::prompt_password("Account password: ").context("Failed to read password")?;
    let confirm = rpassword::prompt_password("Confirm account password: ")
        .context("Failed to read password confirmation")?;
    if password != confirm {
        bail!("Passwords do not match.");
    }

    settings
        .write_password(&SecretString::new(password))
        .context("Failed to store password")?;

    println!("Password saved.");
    Ok(())
}

pub fn check() -> Result<()> {
    let root = config::project_root()?;
    let settings = super::open_settings(&root)?;

    if !settings.has_password() {
        println!("No password stored.");
        return Ok(());
    }

    match settings.read_password() {
        Ok(password) if password.expose_secret().is_empty() => println!("Stored password is empty."),
        Ok(_) => println!("Stored password decrypts correctly."),
        Err(PrefsError::Decryption) => {
            bail!("Stored password could not be decrypted. Please log in again.")
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
