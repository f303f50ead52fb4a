use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "idleprefs",
    about = "Inspect and edit the idler's preference store.",
    version
)]
pub struct Cli {
    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new preference store in the current directory.
    Init,

    /// Print the value of a setting.
    Get {
        /// The setting key, e.g. hours_until_drops.
        key: String,
    },

    /// Change the value of a setting.
    Set {
        /// The setting key.
        key: String,
        /// New value. Booleans are `true`/`false`; the blacklist is comma-separated.
        value: String,
    },

    /// List every setting and its current value (the password is never shown).
    List,

    /// Manage the encrypted account password.
    Password {
        #[command(subcommand)]
        action: PasswordCommand,
    },

    /// Log out: clear credentials and identity, keep device preferences.
    ClearUser,

    /// Generate a new device key and re-encrypt the stored password.
    RotateKey,
}

#[derive(Subcommand, Debug)]
pub enum PasswordCommand {
    /// Store a new password (prompted interactively).
    Set,

    /// Verify the stored password can still be decrypted.
    Check,
}
