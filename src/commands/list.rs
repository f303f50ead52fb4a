use anyhow::Result;

use idleprefs::{config, schema};

pub fn run() -> Result<()> {
    let root = config::project_root()?;
    let settings = super::open_settings(&root)?;

    for desc in schema::ALL {
        if desc.sensitive {
            let shown = if settings.has_password() {
                "<encrypted>"
            } else {
                "<unset>"
            };
            println!("{} = {}", desc.key, shown);
        } else {
            println!("{} = {}", desc.key, settings.get_value(desc.key)?);
        }
    }

    Ok(())
}
