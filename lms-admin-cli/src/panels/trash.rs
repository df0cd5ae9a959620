///! Trash panel: recover or permanently remove soft-deleted records

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use lms_admin_common::format::{days_until, format_bytes, ExpiryUrgency};
use lms_admin_common::{EntityType, Error, TrashRecord, TrashTab};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::{ApiClient, ApiResult};
use crate::notify::{Notification, Notifier};
use crate::prompt::Confirm;

/// Records due within this many days count as expiring soon
const EXPIRING_SOON_DAYS: i64 = 5;

/// Backend holding soft-deleted records
#[async_trait]
pub trait TrashSource: Send + Sync {
    async fn list(&self) -> ApiResult<Vec<TrashRecord>>;
    async fn restore(&self, id: &str) -> ApiResult<()>;
    async fn delete(&self, id: &str) -> ApiResult<()>;
    async fn restore_many(&self, ids: &[String]) -> ApiResult<()>;
    async fn delete_many(&self, ids: &[String]) -> ApiResult<()>;
    async fn purge(&self) -> ApiResult<()>;
}

#[derive(Serialize)]
struct IdsRequest<'a> {
    ids: &'a [String],
}

/// `TrashSource` over the backend's `/api/trash` endpoints
pub struct HttpTrashSource {
    api: ApiClient,
}

impl HttpTrashSource {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl TrashSource for HttpTrashSource {
    async fn list(&self) -> ApiResult<Vec<TrashRecord>> {
        let records: Vec<TrashRecord> = self.api.get("/api/trash").await?;

        Ok(records
            .into_iter()
            .filter(|record| match record.validate() {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!("dropping trash record: {}", err);
                    false
                }
            })
            .collect())
    }

    async fn restore(&self, id: &str) -> ApiResult<()> {
        self.api
            .post_empty(&format!("/api/trash/{}/restore", urlencoding::encode(id)))
            .await
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        self.api
            .delete(&format!("/api/trash/{}", urlencoding::encode(id)))
            .await
    }

    async fn restore_many(&self, ids: &[String]) -> ApiResult<()> {
        self.api.post_json("/api/trash/restore", &IdsRequest { ids }).await
    }

    async fn delete_many(&self, ids: &[String]) -> ApiResult<()> {
        self.api.post_json("/api/trash/delete", &IdsRequest { ids }).await
    }

    async fn purge(&self) -> ApiResult<()> {
        self.api.delete("/api/trash").await
    }
}

/// Sample records kept in memory, for use without a trash API
pub struct FixtureTrashSource {
    records: Mutex<Vec<TrashRecord>>,
}

impl FixtureTrashSource {
    pub fn new(now: DateTime<Utc>) -> Self {
        let ago = |days: i64, hours: i64| now - Duration::days(days) - Duration::hours(hours);

        let records = vec![
            TrashRecord::new("stu-1042", "Emma Thompson", EntityType::Student, ago(3, 2), "admin")
                .with_size(12_288)
                .with_description("Student profile, grade 10"),
            TrashRecord::new("crs-207", "Advanced Mathematics", EntityType::Course, ago(12, 5), "academic.office")
                .with_size(52_428_800)
                .with_description("Course materials and assignments"),
            TrashRecord::new("doc-88", "Midterm Exam Paper.pdf", EntityType::Document, ago(26, 1), "teacher.li")
                .with_size(2_621_440),
            TrashRecord::new("pay-5531", "Tuition payment #5531", EntityType::Payment, ago(28, 20), "finance")
                .with_size(4_096)
                .with_description("Refunded duplicate payment"),
            TrashRecord::new("oth-9", "Classroom schedule draft", EntityType::Other, ago(17, 0), "admin")
                .with_size(65_536),
            TrashRecord::new("crs-311", "Introduction to Physics", EntityType::Course, ago(31, 0), "academic.office")
                .with_size(104_857_600)
                .with_description("Superseded by the new syllabus"),
        ];

        Self {
            records: Mutex::new(records),
        }
    }

    fn records(&self) -> MutexGuard<'_, Vec<TrashRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("fixture trash lock was poisoned, reusing its records");
            poisoned.into_inner()
        })
    }

    fn remove(&self, ids: &[String]) {
        self.records().retain(|r| !ids.contains(&r.id));
    }
}

#[async_trait]
impl TrashSource for FixtureTrashSource {
    async fn list(&self) -> ApiResult<Vec<TrashRecord>> {
        Ok(self.records().clone())
    }

    async fn restore(&self, id: &str) -> ApiResult<()> {
        self.remove(&[id.to_string()]);
        Ok(())
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        self.remove(&[id.to_string()]);
        Ok(())
    }

    async fn restore_many(&self, ids: &[String]) -> ApiResult<()> {
        self.remove(ids);
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> ApiResult<()> {
        self.remove(ids);
        Ok(())
    }

    async fn purge(&self) -> ApiResult<()> {
        self.records().clear();
        Ok(())
    }
}

/// Summary shown above the trash table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrashStats {
    pub total: usize,
    pub total_size: u64,
    pub total_size_display: String,
    pub expiring_soon: usize,
}

pub struct TrashPanel {
    records: Vec<TrashRecord>,
    search: String,
    selected: BTreeSet<String>,
    tab: TrashTab,
    source: Arc<dyn TrashSource>,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn Confirm>,
}

impl TrashPanel {
    pub fn new(
        source: Arc<dyn TrashSource>,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self {
            records: Vec::new(),
            search: String::new(),
            selected: BTreeSet::new(),
            tab: TrashTab::All,
            source,
            notifier,
            confirm,
        }
    }

    pub fn records(&self) -> &[TrashRecord] {
        &self.records
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn tab(&self) -> TrashTab {
        self.tab
    }

    pub async fn load(&mut self) -> bool {
        match self.source.list().await {
            Ok(records) => {
                self.records = records;
                let ids: BTreeSet<&str> = self.records.iter().map(|r| r.id.as_str()).collect();
                self.selected.retain(|id| ids.contains(id.as_str()));
                tracing::debug!("loaded {} trash records", self.records.len());
                true
            }
            Err(err) => {
                tracing::error!("failed to list trash: {}", err);
                self.notifier
                    .notify(Notification::error_with("Failed to load trash", &err));
                false
            }
        }
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn set_tab(&mut self, tab: TrashTab) {
        self.tab = tab;
    }

    /// Select a record by id; unknown ids are ignored
    pub fn select(&mut self, id: &str) -> bool {
        if self.records.iter().any(|r| r.id == id) {
            self.selected.insert(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn deselect(&mut self, id: &str) {
        self.selected.remove(id);
    }

    /// Select every record currently visible
    pub fn select_visible(&mut self) {
        let ids: Vec<String> = self.visible().iter().map(|r| r.id.clone()).collect();
        self.selected.extend(ids);
    }

    /// Records passing the tab filter and the search text
    pub fn visible(&self) -> Vec<&TrashRecord> {
        let needle = self.search.to_lowercase();

        self.records
            .iter()
            .filter(|r| self.tab.admits(r.entity_type))
            .filter(|r| r.matches_search(&needle))
            .collect()
    }

    pub async fn restore_one(&mut self, id: &str) -> bool {
        let Some(name) = self.name_of(id) else {
            return false;
        };

        if let Err(err) = self.source.restore(id).await {
            tracing::error!("failed to restore {}: {}", id, err);
            self.notifier
                .notify(Notification::error_with(format!("Failed to restore '{}'", name), &err));
            return false;
        }

        self.remove(&[id.to_string()]);
        self.notifier
            .notify(Notification::Success(format!("'{}' restored", name)));
        true
    }

    pub async fn delete_one(&mut self, id: &str) -> bool {
        let Some(name) = self.name_of(id) else {
            return false;
        };

        let detail = format!(
            "'{}' and all of its data will be erased permanently. This cannot be undone.",
            name
        );
        if !self.confirm.confirm("Delete permanently?", &detail) {
            return false;
        }

        if let Err(err) = self.source.delete(id).await {
            tracing::error!("failed to delete {}: {}", id, err);
            self.notifier
                .notify(Notification::error_with(format!("Failed to delete '{}'", name), &err));
            return false;
        }

        self.remove(&[id.to_string()]);
        self.notifier
            .notify(Notification::Success(format!("'{}' permanently deleted", name)));
        true
    }

    /// Restore the selection. Does nothing when nothing is selected.
    pub async fn restore_selected(&mut self) -> bool {
        if self.selected.is_empty() {
            return false;
        }
        let ids: Vec<String> = self.selected.iter().cloned().collect();

        if let Err(err) = self.source.restore_many(&ids).await {
            tracing::error!("batch restore failed: {}", err);
            self.notifier
                .notify(Notification::error_with("Failed to restore selected records", &err));
            return false;
        }

        self.remove(&ids);
        self.selected.clear();
        self.notifier
            .notify(Notification::Success(format!("{} records restored", ids.len())));
        true
    }

    /// Permanently delete the selection. Does nothing when nothing is selected.
    pub async fn delete_selected(&mut self) -> bool {
        if self.selected.is_empty() {
            return false;
        }
        let ids: Vec<String> = self.selected.iter().cloned().collect();

        let detail = format!(
            "{} selected records and all of their data will be erased permanently. This cannot be undone.",
            ids.len()
        );
        if !self.confirm.confirm("Delete selected records permanently?", &detail) {
            return false;
        }

        if let Err(err) = self.source.delete_many(&ids).await {
            tracing::error!("batch delete failed: {}", err);
            self.notifier
                .notify(Notification::error_with("Failed to delete selected records", &err));
            return false;
        }

        self.remove(&ids);
        self.selected.clear();
        self.notifier.notify(Notification::Success(format!(
            "{} records permanently deleted",
            ids.len()
        )));
        true
    }

    /// Purge everything in the trash. Does nothing when it is already empty.
    pub async fn empty_trash(&mut self) -> bool {
        if self.records.is_empty() {
            return false;
        }
        let count = self.records.len();

        let detail = format!(
            "ALL {} records in the trash will be destroyed forever, together with their data. \
             Nothing can be recovered afterwards.",
            count
        );
        if !self.confirm.confirm("Empty the trash?", &detail) {
            return false;
        }

        if let Err(err) = self.source.purge().await {
            tracing::error!("purge failed: {}", err);
            self.notifier
                .notify(Notification::error_with("Failed to empty trash", &err));
            return false;
        }

        self.records.clear();
        self.selected.clear();
        self.notifier
            .notify(Notification::Success(format!("Trash emptied, {} records removed", count)));
        true
    }

    /// Statistics over the full list, ignoring filters
    pub fn stats(&self, now: DateTime<Utc>) -> TrashStats {
        let total_size: u64 = self.records.iter().filter_map(|r| r.size).sum();
        let expiring_soon = self
            .records
            .iter()
            .filter(|r| days_until(r.expire_at, now) <= EXPIRING_SOON_DAYS)
            .count();

        TrashStats {
            total: self.records.len(),
            total_size,
            total_size_display: format_bytes(total_size),
            expiring_soon,
        }
    }

    fn name_of(&self, id: &str) -> Option<String> {
        match self.records.iter().find(|r| r.id == id) {
            Some(record) => Some(record.name.clone()),
            None => {
                self.notifier.notify(Notification::error(
                    Error::TrashRecordNotFound(id.to_string()).to_string(),
                ));
                None
            }
        }
    }

    fn remove(&mut self, ids: &[String]) {
        self.records.retain(|r| !ids.contains(&r.id));
        for id in ids {
            self.selected.remove(id);
        }
    }
}

/// Days left and urgency tag of a record
pub fn expiry(record: &TrashRecord, now: DateTime<Utc>) -> (i64, ExpiryUrgency) {
    let days = days_until(record.expire_at, now);
    (days, ExpiryUrgency::classify(days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::RecordingNotifier;
    use crate::prompt::testing::RecordingConfirm;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    /// Fixture source that counts calls and can be made to fail
    struct CountingSource {
        inner: FixtureTrashSource,
        fail: bool,
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                inner: FixtureTrashSource::new(now()),
                fail,
                calls: AtomicUsize::new(0),
            }
        }

        fn hit(&self) -> ApiResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(crate::api::ApiError::Status {
                    status: 500,
                    message: "trash service error".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TrashSource for CountingSource {
        async fn list(&self) -> ApiResult<Vec<TrashRecord>> {
            self.inner.list().await
        }
        async fn restore(&self, id: &str) -> ApiResult<()> {
            self.hit()?;
            self.inner.restore(id).await
        }
        async fn delete(&self, id: &str) -> ApiResult<()> {
            self.hit()?;
            self.inner.delete(id).await
        }
        async fn restore_many(&self, ids: &[String]) -> ApiResult<()> {
            self.hit()?;
            self.inner.restore_many(ids).await
        }
        async fn delete_many(&self, ids: &[String]) -> ApiResult<()> {
            self.hit()?;
            self.inner.delete_many(ids).await
        }
        async fn purge(&self) -> ApiResult<()> {
            self.hit()?;
            self.inner.purge().await
        }
    }

    struct Harness {
        panel: TrashPanel,
        source: Arc<CountingSource>,
        notifier: Arc<RecordingNotifier>,
        confirm: Arc<RecordingConfirm>,
    }

    async fn harness(answer: bool, fail: bool) -> Harness {
        let source = Arc::new(CountingSource::new(fail));
        let notifier = Arc::new(RecordingNotifier::default());
        let confirm = Arc::new(RecordingConfirm::new(answer));
        let mut panel = TrashPanel::new(source.clone(), notifier.clone(), confirm.clone());
        assert!(panel.load().await);
        Harness {
            panel,
            source,
            notifier,
            confirm,
        }
    }

    fn ids(records: Vec<&TrashRecord>) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_tab_filter() {
        let mut h = harness(true, false).await;

        h.panel.set_tab(TrashTab::Course);
        let visible = h.panel.visible();
        assert_eq!(ids(visible.clone()), vec!["crs-207", "crs-311"]);
        assert!(visible.iter().all(|r| r.entity_type == EntityType::Course));

        h.panel.set_tab(TrashTab::All);
        assert_eq!(h.panel.visible().len(), 6);
    }

    #[tokio::test]
    async fn test_tab_and_search_intersect() {
        let mut h = harness(true, false).await;

        h.panel.set_search("ACADEMIC");
        assert_eq!(ids(h.panel.visible()), vec!["crs-207", "crs-311"]);

        h.panel.set_search("physics");
        h.panel.set_tab(TrashTab::Course);
        assert_eq!(ids(h.panel.visible()), vec!["crs-311"]);

        // Matches by description but not in this tab
        h.panel.set_search("duplicate");
        assert!(h.panel.visible().is_empty());
        h.panel.set_tab(TrashTab::Payment);
        assert_eq!(ids(h.panel.visible()), vec!["pay-5531"]);
    }

    #[tokio::test]
    async fn test_selection_survives_filtering() {
        let mut h = harness(true, false).await;

        assert!(h.panel.select("stu-1042"));
        assert!(!h.panel.select("nope"));
        h.panel.set_tab(TrashTab::Course);
        h.panel.select_visible();

        let selected: Vec<_> = h.panel.selected().iter().cloned().collect();
        assert_eq!(selected, vec!["crs-207", "crs-311", "stu-1042"]);

        h.panel.deselect("crs-311");
        assert_eq!(h.panel.selected().len(), 2);
    }

    #[tokio::test]
    async fn test_restore_one() {
        let mut h = harness(true, false).await;

        assert!(h.panel.restore_one("doc-88").await);
        assert_eq!(h.panel.records().len(), 5);
        match h.notifier.last() {
            Some(Notification::Success(msg)) => assert!(msg.contains("Midterm Exam Paper.pdf")),
            other => panic!("expected success, got {:?}", other),
        }

        assert!(!h.panel.restore_one("doc-88").await);
        assert!(matches!(h.notifier.last(), Some(Notification::Error { .. })));
    }

    #[tokio::test]
    async fn test_delete_one_requires_confirmation() {
        let mut declined = harness(false, false).await;
        assert!(!declined.panel.delete_one("oth-9").await);
        assert_eq!(declined.panel.records().len(), 6);
        assert_eq!(declined.source.calls.load(Ordering::SeqCst), 0);
        assert!(declined
            .confirm
            .last_detail()
            .unwrap()
            .contains("Classroom schedule draft"));

        let mut accepted = harness(true, false).await;
        accepted.panel.select("oth-9");
        assert!(accepted.panel.delete_one("oth-9").await);
        assert_eq!(accepted.panel.records().len(), 5);
        assert!(accepted.panel.selected().is_empty());
    }

    #[tokio::test]
    async fn test_batch_actions_noop_without_selection() {
        let mut h = harness(true, false).await;

        assert!(!h.panel.restore_selected().await);
        assert!(!h.panel.delete_selected().await);

        assert_eq!(h.panel.records().len(), 6);
        assert!(h.notifier.events().is_empty());
        assert_eq!(h.confirm.asked(), 0);
        assert_eq!(h.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batch_restore() {
        let mut h = harness(true, false).await;
        h.panel.select("stu-1042");
        h.panel.select("pay-5531");

        assert!(h.panel.restore_selected().await);
        assert_eq!(h.panel.records().len(), 4);
        assert!(h.panel.selected().is_empty());
        assert_eq!(
            h.notifier.last(),
            Some(Notification::Success("2 records restored".to_string()))
        );
    }

    #[tokio::test]
    async fn test_batch_delete_states_count() {
        let mut h = harness(true, false).await;
        h.panel.set_tab(TrashTab::Course);
        h.panel.select_visible();

        assert!(h.panel.delete_selected().await);
        assert!(h.confirm.last_detail().unwrap().starts_with("2 selected records"));
        assert_eq!(h.panel.records().len(), 4);
        assert!(h.panel.visible().is_empty());
        assert!(h.panel.selected().is_empty());
    }

    #[tokio::test]
    async fn test_failed_batch_keeps_state() {
        let mut h = harness(true, true).await;
        h.panel.select("stu-1042");

        assert!(!h.panel.restore_selected().await);
        assert_eq!(h.panel.records().len(), 6);
        assert_eq!(h.panel.selected().len(), 1);
        match h.notifier.last() {
            Some(Notification::Error { detail: Some(detail), .. }) => {
                assert!(detail.contains("trash service error"))
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_trash() {
        let mut h = harness(true, false).await;

        assert!(h.panel.empty_trash().await);
        assert!(h.confirm.last_detail().unwrap().contains("ALL 6 records"));
        assert!(h.panel.records().is_empty());

        // Already empty: no prompt, no notification
        let asked = h.confirm.asked();
        let events = h.notifier.events().len();
        assert!(!h.panel.empty_trash().await);
        assert_eq!(h.confirm.asked(), asked);
        assert_eq!(h.notifier.events().len(), events);
    }

    #[tokio::test]
    async fn test_stats() {
        let mut h = harness(true, false).await;

        let stats = h.panel.stats(now());
        assert_eq!(stats.total, 6);
        assert_eq!(
            stats.total_size,
            12_288 + 52_428_800 + 2_621_440 + 4_096 + 65_536 + 104_857_600
        );
        assert_eq!(stats.total_size_display, format_bytes(stats.total_size));
        // doc-88 (4 days left), pay-5531 (2 days left), crs-311 (expired)
        assert_eq!(stats.expiring_soon, 3);

        // Filters do not affect the statistics
        h.panel.set_tab(TrashTab::Student);
        assert_eq!(h.panel.stats(now()), stats);

        h.panel.empty_trash().await;
        let empty = h.panel.stats(now());
        assert_eq!(empty.total, 0);
        assert_eq!(empty.total_size_display, "0 Bytes");
        assert_eq!(empty.expiring_soon, 0);
    }

    #[test]
    fn test_expiry_tags() {
        let record = |deleted_days_ago: i64| {
            TrashRecord::new("x", "x", EntityType::Other, now() - Duration::days(deleted_days_ago), "a")
        };

        assert_eq!(expiry(&record(25), now()), (5, ExpiryUrgency::Critical));
        assert_eq!(expiry(&record(20), now()), (10, ExpiryUrgency::Warning));
        assert_eq!(expiry(&record(2), now()), (28, ExpiryUrgency::Normal));
        assert_eq!(expiry(&record(30), now()), (0, ExpiryUrgency::Expired));
        assert_eq!(expiry(&record(40), now()).1, ExpiryUrgency::Expired);
    }

    #[tokio::test]
    async fn test_fixture_records_are_valid() {
        let source = FixtureTrashSource::new(now());
        let records = source.list().await.unwrap();
        assert!(records.iter().all(|r| r.validate().is_ok()));

        source.purge().await.unwrap();
        assert!(source.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_search_is_not_empty() {
        let mut h = harness(true, false).await;

        h.panel.set_search("   ");
        assert!(h.panel.visible().is_empty());

        h.panel.set_search("");
        assert_eq!(h.panel.visible().len(), 6);
    }

    #[tokio::test]
    async fn test_fixture_survives_poisoned_lock() {
        let source = FixtureTrashSource::new(now());
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = source.records.lock().unwrap();
            panic!("writer died");
        }));
        assert!(source.records.is_poisoned());

        assert_eq!(source.list().await.unwrap().len(), 6);
        source.restore("stu-1042").await.unwrap();
        assert_eq!(source.list().await.unwrap().len(), 5);
    }
}
