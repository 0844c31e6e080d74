//! inbox-assistant - run the inbox tools from a terminal
//!
//! Stands in for an agent host: lists the tool definitions and invokes tools
//! by name, printing the same text a language model would be handed.

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info, warn};
use mail::{GmailAuth, GmailClient, GmailCredentials, InMemoryMailbox, InboxTools, MailProvider};
use std::process::ExitCode;
use std::sync::Arc;

mod cli;

use cli::{Cli, Commands};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Err(e) = config::init() {
        warn!("Failed to initialize config directory: {}", e);
    }

    match &cli.command {
        Commands::Login => {
            let auth = build_auth(&cli)?;
            if auth.is_authenticated() {
                info!("Already signed in (tokens at {})", auth.token_path().display());
                return Ok(());
            }
            auth.init()?;
            info!("Tokens stored at {}", auth.token_path().display());
        }
        Commands::Logout => {
            build_auth(&cli)?.teardown()?;
            info!("Logged out");
        }
        Commands::Tools => {
            let defs = InboxTools::definitions();
            println!("{}", serde_json::to_string_pretty(&defs)?);
        }
        Commands::Call { name, args } => {
            let args = match args {
                Some(raw) => serde_json::from_str(raw).context("--args must be valid JSON")?,
                None => serde_json::Value::Null,
            };
            println!("{}", build_tools(&cli)?.call(name, args));
        }
        Commands::Unread { max } => {
            println!("{}", build_tools(&cli)?.get_unread_mail(*max));
        }
        Commands::Read { identifier } => {
            println!("{}", build_tools(&cli)?.read_email(identifier));
        }
        Commands::MarkRead { message_id } => {
            println!("{}", build_tools(&cli)?.mark_email_as_read(message_id));
        }
    }

    Ok(())
}

fn build_tools(cli: &Cli) -> Result<InboxTools> {
    let provider: Arc<dyn MailProvider> = if cli.demo {
        info!("Using the sample mailbox");
        Arc::new(InMemoryMailbox::sample())
    } else {
        Arc::new(GmailClient::new(build_auth(cli)?))
    };
    Ok(InboxTools::new(provider))
}

fn build_auth(cli: &Cli) -> Result<GmailAuth> {
    let credentials = match &cli.credentials {
        Some(path) => GmailCredentials::from_file(path)?,
        None => match GmailCredentials::load_with_source() {
            Ok((credentials, source)) => {
                debug!("Using Gmail credentials from {}", source);
                credentials
            }
            Err(e) => {
                if let Some(path) = GmailCredentials::default_credentials_path() {
                    warn!(
                        "To configure Gmail access, either:\n\
                         1. Place your Google OAuth credentials at: {}\n\
                         2. Pass --credentials <path to credentials.json>\n\
                         3. Or set environment variables: GMAIL_CLIENT_ID and GMAIL_CLIENT_SECRET",
                        path.display()
                    );
                }
                return Err(e);
            }
        },
    };

    match &cli.token_path {
        Some(path) => Ok(GmailAuth::new(credentials, path)),
        None => GmailAuth::with_default_token_path(credentials),
    }
}
