///! Headless admin panels
///!
///! Each panel owns its list state and talks to the outside world only through
///! a collaborator trait, a `Notifier` and a `Confirm` prompt.

pub mod backup;
pub mod trash;

pub use backup::{BackupPanel, BackupSort, HttpBackupService, SortOrder};
pub use trash::{FixtureTrashSource, HttpTrashSource, TrashPanel, TrashSource, TrashStats};
