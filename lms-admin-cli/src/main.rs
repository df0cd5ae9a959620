///! LMS Admin CLI
///!
///! Backup/restore and trash recovery for the learning-management backend

mod api;
mod commands;
mod config;
mod logging;
mod notify;
mod output;
mod panels;
mod prompt;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::auth::AuthCommands;
use commands::backup::BackupCommands;
use commands::trash::TrashCommands;
use commands::AlreadyReported;
use notify::{ConsoleNotifier, Notifier};
use prompt::{AssumeAnswer, Confirm, TerminalConfirm};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "lms-admin", author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// API server address (overrides the config file)
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, list and restore database backups
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },
    /// Recover or purge soft-deleted records
    Trash {
        #[command(subcommand)]
        command: TrashCommands,
    },
    /// Session token management
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is::<AlreadyReported>() => ExitCode::FAILURE,
        Err(err) => {
            output::print_error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = config::Config::load().unwrap_or_else(|err| {
        output::print_warning(&format!("Ignoring unreadable config file: {}", err));
        config::Config::default()
    });

    let _log_guard = logging::LoggingConfig {
        level: cli.log_level.clone().unwrap_or_else(|| config.log_level.clone()),
        file_dir: config.log_dir.clone(),
    }
    .init()?;

    let server = cli.server.clone().unwrap_or_else(|| config.default_server.clone());
    let output_format = cli.output.clone().unwrap_or_else(|| config.default_output.clone());
    tracing::debug!("using server {}", server);

    let api_client = api::ApiClient::new(&server);
    if let Some(token) = &config.token {
        api_client.set_token(token.clone()).await;
    }

    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier::new());
    let confirm: Arc<dyn Confirm> = if cli.yes {
        Arc::new(AssumeAnswer(true))
    } else {
        Arc::new(TerminalConfirm)
    };

    match cli.command {
        Commands::Backup { command } => {
            commands::backup::handle_backup_command(
                command,
                &api_client,
                &config,
                notifier,
                confirm,
                &output_format,
            )
            .await?
        }
        Commands::Trash { command } => {
            commands::trash::handle_trash_command(
                command,
                &api_client,
                &config,
                notifier,
                confirm,
                &output_format,
            )
            .await?
        }
        Commands::Auth { command } => {
            commands::auth::handle_auth_command(command, &api_client, &mut config).await?
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
    }

    Ok(())
}

/// Generate shell completions
fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut io::stdout());
}
