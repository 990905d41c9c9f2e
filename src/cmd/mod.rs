//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`serve`], [`invoke`], [`check`], or [`health`].
//! Each handler lives in its own submodule.

pub mod check;
pub mod health;
pub mod invoke;
pub mod serve;

use crate::cli::{Cli, Commands};
use crate::error::FormrelayError;

pub async fn dispatch(cli: Cli) -> Result<(), FormrelayError> {
    match cli.command {
        Some(Commands::Serve(args)) => serve::execute(*args).await,
        Some(Commands::Invoke(args)) => invoke::execute(*args).await,
        Some(Commands::Check(ref args)) => check::execute(args),
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  formrelay v{version} \u{2014} form submissions to Airtable\n\n  \
         No command provided. To get started:\n\n    \
         formrelay check                   Verify the AIRTABLE_* settings\n    \
         formrelay serve                   Listen for submission webhooks\n    \
         formrelay invoke event.json       Handle one event locally\n    \
         formrelay --help                  See all commands and options\n"
    );
}
