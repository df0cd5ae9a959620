use crate::api::ApiClient;
use crate::commands::AlreadyReported;
use crate::config::Config;
use crate::notify::Notifier;
use crate::output::{self, OutputFormat};
use crate::panels::{BackupPanel, BackupSort, HttpBackupService, SortOrder};
use crate::prompt::Confirm;
use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use lms_admin_common::format::format_timestamp;
use lms_admin_common::{BackupRecord, RetentionLocation};
use std::sync::Arc;
use tabled::Tabled;

#[derive(Subcommand)]
pub enum BackupCommands {
    /// List backups
    List {
        /// Column to sort by
        #[arg(long, value_enum, default_value = "date")]
        sort: SortKey,
        /// Sort ascending instead of newest/last first
        #[arg(long)]
        asc: bool,
    },
    /// Create a backup
    Create {
        /// Backup name (defaults to a dated name)
        #[arg(short, long)]
        name: Option<String>,
        /// Where to keep the backup
        #[arg(short, long, value_enum)]
        location: Option<LocationArg>,
    },
    /// Remove a backup from the list
    Delete { id: String },
    /// Restore the database from a backup
    Restore { id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortKey {
    Name,
    Date,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LocationArg {
    /// Download the dump to this machine
    Local,
    /// Keep the dump on the backup server
    Server,
}

impl From<LocationArg> for RetentionLocation {
    fn from(arg: LocationArg) -> Self {
        match arg {
            LocationArg::Local => RetentionLocation::Local,
            LocationArg::Server => RetentionLocation::Server,
        }
    }
}

#[derive(Tabled)]
struct BackupRow {
    id: String,
    name: String,
    created: String,
    location: String,
}

impl From<&BackupRecord> for BackupRow {
    fn from(b: &BackupRecord) -> Self {
        let location = match &b.locator {
            Some(locator) => format!("{} ({})", b.retention, locator),
            None => b.retention.to_string(),
        };

        Self {
            id: b.id.clone(),
            name: b.name.clone(),
            created: format_timestamp(&b.date),
            location,
        }
    }
}

fn print_backups(records: &[&BackupRecord], format: OutputFormat) -> Result<()> {
    let rows: Vec<BackupRow> = records.iter().map(|b| BackupRow::from(*b)).collect();
    output::print_output(rows, &records, format)
}

pub async fn handle_backup_command(
    command: BackupCommands,
    api: &ApiClient,
    config: &Config,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn Confirm>,
    output_format: &str,
) -> Result<()> {
    let service = Arc::new(HttpBackupService::new(api.clone()));
    let mut panel = BackupPanel::new(service, notifier, confirm, config.download_dir());

    run_backup_command(command, &mut panel, OutputFormat::from_str(output_format)).await
}

async fn run_backup_command(
    command: BackupCommands,
    panel: &mut BackupPanel,
    format: OutputFormat,
) -> Result<()> {
    // Creating needs no listing; the load error has already been shown
    let loaded = panel.load().await;
    if !loaded && !matches!(command, BackupCommands::Create { .. }) {
        return Err(AlreadyReported.into());
    }

    match command {
        BackupCommands::List { sort, asc } => {
            let sort = match sort {
                SortKey::Name => BackupSort::Name,
                SortKey::Date => BackupSort::Date,
            };
            let order = if asc { SortOrder::Ascending } else { SortOrder::Descending };
            print_backups(&panel.sorted(sort, order), format)?;
        }
        BackupCommands::Create { name, location } => {
            let Some(mut form) = panel.open_create_dialog() else {
                return Err(AlreadyReported.into());
            };
            if let Some(name) = name {
                form.name = name;
            }
            form.location = location.map(RetentionLocation::from);

            match panel.start_backup(&form).await {
                Ok(Some(record)) => {
                    if let Some(locator) = &record.locator {
                        output::print_info(&format!("Stored at {}", locator));
                    }
                }
                Ok(None) => return Err(AlreadyReported.into()),
                Err(errors) => {
                    for error in errors {
                        output::print_error(&error.to_string());
                    }
                    return Err(AlreadyReported.into());
                }
            }
        }
        BackupCommands::Delete { id } => {
            if !panel.delete_backup(&id).await {
                return Err(AlreadyReported.into());
            }
        }
        BackupCommands::Restore { id } => {
            if !panel.restore_backup(&id).await {
                return Err(AlreadyReported.into());
            }
        }
    }

    Ok(())
}
