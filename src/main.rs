mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, PasswordCommand};

fn main() -> Result<()> {
    let cli = Cli::parse();
    commands::init_logging(cli.verbose);

    match cli.command {
        Command::Init => commands::init::run()?,
        Command::Get { key } => commands::get::run(&key)?,
        Command::Set { key, value } => commands::set::run(&key, &value)?,
        Command::List => commands::list::run()?,
        Command::Password { action } => match action {
            PasswordCommand::Set => commands::password::set()?,
            PasswordCommand::Check => commands::password::check()?,
        },
        Command::ClearUser => commands::clear_user::run()?,
        Command::RotateKey => commands::rotate_key::run()?,
    }

    Ok(())
}
