///! Backup panel: list, create, delete and restore database backups

use async_trait::async_trait;
use chrono::{Local, Utc};
use lms_admin_common::format::{default_backup_name, download_file_name};
use lms_admin_common::{BackupListItem, BackupLocator, BackupRecord, Error, RetentionLocation};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::api::{ApiClient, ApiResult};
use crate::notify::{Notification, Notifier};
use crate::prompt::Confirm;

/// Remote backup service
#[async_trait]
pub trait BackupService: Send + Sync {
    async fn list(&self) -> ApiResult<Vec<BackupListItem>>;

    /// Dump kept by the server, answers with the dump's URL
    async fn dump_to_server(&self) -> ApiResult<String>;

    /// Dump streamed back to the caller
    async fn dump_local(&self) -> ApiResult<Vec<u8>>;

    async fn restore(&self, backup_url: &str) -> ApiResult<()>;

    async fn delete(&self, id: &str) -> ApiResult<()>;
}

/// `BackupService` over the backend's `/api/backup` endpoints.
///
/// Database connection settings live on the server; none are sent from here.
pub struct HttpBackupService {
    api: ApiClient,
}

impl HttpBackupService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn restore_path(backup_url: &str) -> String {
        format!(
            "/api/backup/api/restore/remote?backupFileUrl={}",
            urlencoding::encode(backup_url)
        )
    }
}

#[async_trait]
impl BackupService for HttpBackupService {
    async fn list(&self) -> ApiResult<Vec<BackupListItem>> {
        self.api.get("/api/backup/list").await
    }

    async fn dump_to_server(&self) -> ApiResult<String> {
        let body = self.api.get_text("/api/backup/api/dump/remote").await?;
        Ok(body.trim().to_string())
    }

    async fn dump_local(&self) -> ApiResult<Vec<u8>> {
        self.api.get_bytes("/api/backup/api/dump/remote/local").await
    }

    async fn restore(&self, backup_url: &str) -> ApiResult<()> {
        self.api.post_empty(&Self::restore_path(backup_url)).await
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        self.api
            .delete(&format!("/api/backup/{}", urlencoding::encode(id)))
            .await
    }
}

/// Create-backup form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupForm {
    pub name: String,
    pub location: Option<RetentionLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("a backup name is required")]
    MissingName,
    #[error("choose where to keep the backup (local or server)")]
    MissingLocation,
}

impl BackupForm {
    fn validate(&self) -> Result<(String, RetentionLocation), Vec<FieldError>> {
        let mut errors = Vec::new();
        let name = self.name.trim();

        if name.is_empty() {
            errors.push(FieldError::MissingName);
        }
        match self.location {
            Some(location) if errors.is_empty() => Ok((name.to_string(), location)),
            Some(_) => Err(errors),
            None => {
                errors.push(FieldError::MissingLocation);
                Err(errors)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackupSort {
    Name,
    #[default]
    Date,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

pub struct BackupPanel {
    records: Vec<BackupRecord>,
    in_progress: bool,
    dialog_open: bool,
    download_dir: PathBuf,
    service: Arc<dyn BackupService>,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn Confirm>,
}

impl BackupPanel {
    pub fn new(
        service: Arc<dyn BackupService>,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn Confirm>,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            records: Vec::new(),
            in_progress: false,
            dialog_open: false,
            download_dir,
            service,
            notifier,
            confirm,
        }
    }

    pub fn records(&self) -> &[BackupRecord] {
        &self.records
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn dialog_open(&self) -> bool {
        self.dialog_open
    }

    /// Replace the list with the server's. On failure the list is kept.
    pub async fn load(&mut self) -> bool {
        match self.service.list().await {
            Ok(items) => {
                self.records = items.into_iter().map(BackupRecord::from).collect();
                tracing::debug!("loaded {} backups", self.records.len());
                true
            }
            Err(err) => {
                tracing::error!("failed to list backups: {}", err);
                self.notifier
                    .notify(Notification::error_with("Failed to load backups", &err));
                false
            }
        }
    }

    /// Open the create dialog with a dated default name. `None` while one is already open.
    pub fn open_create_dialog(&mut self) -> Option<BackupForm> {
        if self.dialog_open {
            return None;
        }
        self.dialog_open = true;

        Some(BackupForm {
            name: default_backup_name(Local::now().date_naive()),
            location: None,
        })
    }

    pub fn cancel_create_dialog(&mut self) {
        self.dialog_open = false;
    }

    /// Run a backup. Field errors go back to the form without any notification;
    /// `Ok(None)` means the backup itself failed and the user was told.
    pub async fn start_backup(
        &mut self,
        form: &BackupForm,
    ) -> Result<Option<BackupRecord>, Vec<FieldError>> {
        let (name, location) = form.validate()?;

        self.dialog_open = false;
        self.in_progress = true;
        self.notifier
            .notify(Notification::Loading("Creating backup...".to_string()));
        tracing::info!("starting {} backup '{}'", location, name);

        let locator = match location {
            RetentionLocation::Server => self
                .service
                .dump_to_server()
                .await
                .map(BackupLocator::Remote)
                .map_err(|err| err.to_string()),
            RetentionLocation::Local => match self.service.dump_local().await {
                Ok(payload) => self
                    .save_download(&payload)
                    .await
                    .map(BackupLocator::Session)
                    .map_err(|err| format!("could not save backup file: {}", err)),
                Err(err) => Err(err.to_string()),
            },
        };

        self.in_progress = false;

        match locator {
            Ok(locator) => {
                let record = BackupRecord {
                    id: uuid::Uuid::new_v4().to_string(),
                    name,
                    date: Utc::now().to_rfc3339(),
                    retention: location,
                    locator: Some(locator),
                };
                self.records.insert(0, record.clone());
                self.notifier.notify(Notification::Success(format!(
                    "Backup '{}' created",
                    record.name
                )));
                Ok(Some(record))
            }
            Err(detail) => {
                tracing::error!("backup failed: {}", detail);
                self.notifier
                    .notify(Notification::error_with("Backup failed", detail));
                Ok(None)
            }
        }
    }

    async fn save_download(&self, payload: &[u8]) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.download_dir).await?;
        let (path, mut file) = create_unique(
            &self.download_dir,
            &download_file_name(Local::now().date_naive()),
        )
        .await?;
        file.write_all(payload).await?;
        file.flush().await?;
        tracing::info!("saved {} bytes to {}", payload.len(), path.display());
        Ok(path)
    }

    /// Remove a backup from the list. Backups with a remote URL are also deleted remotely.
    pub async fn delete_backup(&mut self, id: &str) -> bool {
        let Some(index) = self.records.iter().position(|r| r.id == id) else {
            self.notifier
                .notify(Notification::error(Error::BackupNotFound(id.to_string()).to_string()));
            return false;
        };

        if self.records[index].remote_url().is_some() {
            if let Err(err) = self.service.delete(id).await {
                tracing::error!("failed to delete backup {}: {}", id, err);
                self.notifier
                    .notify(Notification::error_with("Failed to delete backup", &err));
                return false;
            }
        }

        let removed = self.records.remove(index);
        self.notifier.notify(Notification::Success(format!(
            "Backup '{}' deleted",
            removed.name
        )));
        true
    }

    /// Restore the database from a backup after confirmation
    pub async fn restore_backup(&mut self, id: &str) -> bool {
        let url = match self.restorable_url(id) {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!("restore refused: {}", err);
                self.notifier.notify(Notification::error(err.to_string()));
                return false;
            }
        };

        let Some(record) = self.records.iter().find(|r| r.id == id) else {
            return false;
        };
        let detail = format!(
            "Restoring from '{}' (created {}) will overwrite all current data. This cannot be undone.",
            record.name,
            lms_admin_common::format::format_timestamp(&record.date)
        );
        if !self.confirm.confirm("Restore the database from this backup?", &detail) {
            tracing::debug!("restore of {} cancelled", id);
            return false;
        }

        self.notifier
            .notify(Notification::Loading("Restoring database...".to_string()));

        match self.service.restore(&url).await {
            Ok(()) => {
                self.notifier
                    .notify(Notification::Success("Database restored".to_string()));
                true
            }
            Err(err) => {
                tracing::error!("restore from {} failed: {}", url, err);
                self.notifier
                    .notify(Notification::error_with("Restore failed", &err));
                false
            }
        }
    }

    fn restorable_url(&self, id: &str) -> lms_admin_common::Result<String> {
        let record = self
            .records
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::BackupNotFound(id.to_string()))?;

        match &record.locator {
            Some(BackupLocator::Remote(url)) => Ok(url.clone()),
            Some(BackupLocator::Session(_)) => Err(Error::SessionLocator(record.name.clone())),
            None => Err(Error::MissingLocator(record.name.clone())),
        }
    }

    pub fn sorted(&self, sort: BackupSort, order: SortOrder) -> Vec<&BackupRecord> {
        let mut rows: Vec<&BackupRecord> = self.records.iter().collect();

        match sort {
            BackupSort::Name => rows.sort_by(|a, b| a.name.cmp(&b.name)),
            BackupSort::Date => rows.sort_by_key(|r| r.created_at()),
        }
        if order == SortOrder::Descending {
            rows.reverse();
        }

        rows
    }
}

/// Create `dir/name`, or `dir/stem (n).ext` when that name is taken.
/// The name check and the creation are one step, so concurrent saves never share a file.
async fn create_unique(dir: &Path, name: &str) -> std::io::Result<(PathBuf, tokio::fs::File)> {
    let (stem, ext) = name.rsplit_once('.').unwrap_or((name, ""));
    let mut n = 0u32;

    loop {
        let path = match (n, ext.is_empty()) {
            (0, _) => dir.join(name),
            (_, true) => dir.join(format!("{} ({})", stem, n)),
            (_, false) => dir.join(format!("{} ({}).{}", stem, n, ext)),
        };

        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => n += 1,
            Err(err) => return Err(err),
        }
    }
}
