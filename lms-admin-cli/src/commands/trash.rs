///! Trash (soft-deleted records) commands

use crate::api::ApiClient;
use crate::commands::AlreadyReported;
use crate::config::{Config, TrashSourceKind};
use crate::notify::Notifier;
use crate::output::{self, expiry_tag, truncate, OutputFormat};
use crate::panels::trash::expiry;
use crate::panels::{FixtureTrashSource, HttpTrashSource, TrashPanel, TrashSource, TrashStats};
use crate::prompt::Confirm;
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use colored::Colorize;
use lms_admin_common::format::format_bytes;
use lms_admin_common::{TrashRecord, TrashTab, RETENTION_DAYS};
use std::sync::Arc;
use tabled::Tabled;

#[derive(Subcommand)]
pub enum TrashCommands {
    /// List soft-deleted records
    List {
        /// Category (all, student, course, document, payment, other)
        #[arg(short, long, default_value = "all")]
        tab: TrashTab,
        /// Match name, description or who deleted it
        #[arg(short = 'q', long)]
        search: Option<String>,
    },
    /// Show trash statistics
    Stats,
    /// Restore a record
    Restore { id: String },
    /// Permanently delete a record
    Delete { id: String },
    /// Restore several records
    RestoreBatch {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Permanently delete several records
    DeleteBatch {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Permanently delete everything in the trash
    Empty,
}

#[derive(Tabled)]
struct TrashRow {
    id: String,
    name: String,
    #[tabled(rename = "type")]
    entity_type: String,
    deleted: String,
    deleted_by: String,
    expires: String,
    size: String,
    description: String,
}

impl TrashRow {
    fn new(record: &TrashRecord, now: DateTime<Utc>) -> Self {
        let (days, urgency) = expiry(record, now);

        Self {
            id: record.id.clone(),
            name: truncate(&record.name, 32),
            entity_type: record.entity_type.to_string(),
            deleted: record
                .deleted_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            deleted_by: record.deleted_by.clone(),
            expires: expiry_tag(days, urgency),
            size: record.size.map(format_bytes).unwrap_or_else(|| "-".to_string()),
            description: record
                .description
                .as_deref()
                .map(|d| truncate(d, 40))
                .unwrap_or_default(),
        }
    }
}

fn print_stats(stats: &TrashStats) {
    println!(
        "{} records, {} total, {} expiring within 5 days",
        stats.total.to_string().bold(),
        stats.total_size_display.bold(),
        if stats.expiring_soon > 0 {
            stats.expiring_soon.to_string().red().bold()
        } else {
            stats.expiring_soon.to_string().normal()
        }
    );
}

fn source_for(config: &Config, api: &ApiClient) -> Arc<dyn TrashSource> {
    match config.trash_source {
        TrashSourceKind::Fixture => {
            tracing::debug!("using fixture trash records");
            Arc::new(FixtureTrashSource::new(Utc::now()))
        }
        TrashSourceKind::Remote => Arc::new(HttpTrashSource::new(api.clone())),
    }
}

fn select_all(panel: &mut TrashPanel, ids: &[String]) {
    for id in ids {
        if !panel.select(id) {
            output::print_warning(&format!("No trash record with id '{}', skipping", id));
        }
    }
}

pub async fn handle_trash_command(
    command: TrashCommands,
    api: &ApiClient,
    config: &Config,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn Confirm>,
    output_format: &str,
) -> Result<()> {
    let mut panel = TrashPanel::new(source_for(config, api), notifier, confirm);
    let format = OutputFormat::from_str(output_format);

    if !panel.load().await {
        return Err(AlreadyReported.into());
    }

    let done = match command {
        TrashCommands::List { tab, search } => {
            panel.set_tab(tab);
            if let Some(search) = search {
                panel.set_search(search);
            }

            let now = Utc::now();
            let visible = panel.visible();
            if format == OutputFormat::Table {
                print_stats(&panel.stats(now));
                if panel.tab() != TrashTab::All {
                    output::print_info(&format!("Showing {} records only", panel.tab()));
                }
                output::print_info(&format!(
                    "Records are kept for {} days before they are removed for good",
                    RETENTION_DAYS
                ));
            }
            let rows: Vec<TrashRow> = visible.iter().map(|r| TrashRow::new(r, now)).collect();
            output::print_output(rows, &visible, format)?;
            true
        }
        TrashCommands::Stats => {
            let stats = panel.stats(Utc::now());
            match format {
                OutputFormat::Table => print_stats(&stats),
                OutputFormat::Json => output::print_json(&stats)?,
                OutputFormat::Yaml => output::print_yaml(&stats)?,
            }
            true
        }
        TrashCommands::Restore { id } => panel.restore_one(&id).await,
        TrashCommands::Delete { id } => panel.delete_one(&id).await,
        TrashCommands::RestoreBatch { ids } => {
            select_all(&mut panel, &ids);
            if panel.selected().is_empty() {
                output::print_info("Nothing selected");
            }
            panel.restore_selected().await
        }
        TrashCommands::DeleteBatch { ids } => {
            select_all(&mut panel, &ids);
            if panel.selected().is_empty() {
                output::print_info("Nothing selected");
            }
            panel.delete_selected().await
        }
        TrashCommands::Empty => {
            if panel.records().is_empty() {
                output::print_info("Trash is already empty");
                true
            } else {
                panel.empty_trash().await
            }
        }
    };

    if !done {
        return Err(AlreadyReported.into());
    }
    Ok(())
}
