///! Session token commands
///!
///! Tokens are issued elsewhere; this only stores the one the backend handed out.

use crate::api::ApiClient;
use crate::config::Config;
use crate::output;
use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store the session token sent with every request
    SetToken {
        /// Token (will be prompted if not provided)
        token: Option<String>,
    },

    /// Forget the stored token
    Logout,

    /// Show current authentication status
    Status,
}

pub async fn handle_auth_command(
    command: AuthCommands,
    api: &ApiClient,
    config: &mut Config,
) -> Result<()> {
    match command {
        AuthCommands::SetToken { token } => {
            let token = if let Some(token) = token {
                token
            } else {
                use dialoguer::Password;
                Password::new().with_prompt("Token").interact()?
            };

            let token = token.trim().to_string();
            if token.is_empty() {
                anyhow::bail!("Token must not be empty");
            }

            api.set_token(token.clone()).await;
            config.token = Some(token);
            config.save()?;

            output::print_success("Token saved");
        }

        AuthCommands::Logout => {
            config.token = None;
            config.save()?;

            output::print_success("Logged out successfully");
        }

        AuthCommands::Status => match &config.token {
            Some(token) => {
                let shown: String = token.chars().take(8).collect();
                println!("Token: {}...", shown);
                println!("Server: {}", config.default_server);
            }
            None => {
                println!("Not authenticated");
                println!("Requests are sent with an empty bearer token");
                println!("Use 'lms-admin auth set-token' to store one");
            }
        },
    }

    Ok(())
}
