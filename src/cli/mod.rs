//! Command-line interface parsing and startup dispatch.

use clap::{Parser, Subcommand};
use std::error::Error;
use std::sync::Arc;

use crate::auth::{AuthGuard, Navigation, SessionGate};
use crate::core::config::Config;
use crate::core::session::{FileSessionStore, SessionStore};
use crate::ui::shell::run_shell;

#[derive(Parser)]
#[command(name = "textwo")]
#[command(about = "A terminal client for the Textwo one-to-one chat service")]
#[command(version)]
#[command(
    long_about = "Textwo is a full-screen terminal client for one-to-one chats. It reads the \
session stored by the login flow, announces your presence to the backend, and lets you pick a \
contact to chat with.\n\n\
Controls:\n\
  Mouse             Open the menu, toggle the account dropdown, pick a contact\n\
  Enter / Esc       Confirm or cancel the logout prompt\n\
  q / Ctrl+C        Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the contact-list endpoint base URL for this run
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Override the presence WebSocket origin for this run
    #[arg(long, value_name = "URL")]
    pub presence_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set a configuration value (api-base-url, presence-url, wide-min-width)
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key
        value: String,
    },
    /// Unset a configuration value, reverting to the default
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut config = Config::load()?;

    match args.command {
        Some(Commands::Set { key, value }) => {
            apply_setting(&mut config, &key, &value)?;
            config.save()?;
            println!("Set {key} = {value}");
            return Ok(());
        }
        Some(Commands::Unset { key }) => {
            clear_setting(&mut config, &key)?;
            config.save()?;
            println!("Unset {key}");
            return Ok(());
        }
        None => {}
    }

    if args.api_url.is_some() {
        config.api_base_url = args.api_url;
    }
    if args.presence_url.is_some() {
        config.presence_url = args.presence_url;
    }

    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new()?);

    // The session gate runs once, before any UI comes up. No session is the
    // normal logged-out state: redirect to the login flow and render nothing.
    let guard = AuthGuard::new(&*store);
    if guard.check()? == SessionGate::RedirectToLogin {
        print_login_hint();
        return Ok(());
    }

    match run_shell(&config, store).await? {
        Some(Navigation::Login) => print_login_hint(),
        Some(Navigation::Root) => println!("Logged out."),
        None => {}
    }
    Ok(())
}

fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    match key {
        "api-base-url" => config.api_base_url = Some(value.to_string()),
        "presence-url" => config.presence_url = Some(value.to_string()),
        "wide-min-width" => {
            let width: u16 = value
                .parse()
                .map_err(|_| format!("wide-min-width must be a column count, got '{value}'"))?;
            config.wide_min_width = Some(width);
        }
        _ => {
            return Err(format!(
                "Unknown config key '{key}'. Valid keys: api-base-url, presence-url, wide-min-width"
            )
            .into())
        }
    }
    Ok(())
}

fn clear_setting(config: &mut Config, key: &str) -> Result<(), Box<dyn Error>> {
    match key {
        "api-base-url" => config.api_base_url = None,
        "presence-url" => config.presence_url = None,
        "wide-min-width" => config.wide_min_width = None,
        _ => {
            return Err(format!(
                "Unknown config key '{key}'. Valid keys: api-base-url, presence-url, wide-min-width"
            )
            .into())
        }
    }
    Ok(())
}

fn print_login_hint() {
    eprintln!("No active session. Sign in with the Textwo login flow, then run textwo again.");
}
