//! User activity store
//!
//! Recent activity and bookmarks are client-durable only and never sent to
//! the backend. The whole slice is persisted on every change.

use super::{ActionStatus, Store, StoreState};
use crate::config::{MAX_RECENT_ACTIVITY, USER_ACTIVITY_KEY};
use crate::error::{AppError, Result};
use crate::models::{ActivityAction, Bookmark, RecentActivity, TargetKind};
use crate::storage::local_store::persist_quietly;
use crate::storage::{LocalStorage, Persist};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct UserState {
    /// Newest first, at most `MAX_RECENT_ACTIVITY` entries
    pub recent_activity: Vec<RecentActivity>,
    pub bookmarks: Vec<Bookmark>,
    pub status: ActionStatus,
}

impl StoreState for UserState {
    fn status(&self) -> &ActionStatus {
        &self.status
    }
    fn status_mut(&mut self) -> &mut ActionStatus {
        &mut self.status
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredActivity {
    #[serde(default)]
    recent_activity: Vec<RecentActivity>,
    #[serde(default)]
    bookmarks: Vec<Bookmark>,
}

impl Persist for StoredActivity {
    const KEY: &'static str = USER_ACTIVITY_KEY;
    const VERSION: u32 = 1;
}

#[derive(Clone)]
pub struct UserStateStore {
    store: Store<UserState>,
    storage: LocalStorage,
}

impl UserStateStore {
    pub fn new(storage: LocalStorage) -> Self {
        let stored = storage.load::<StoredActivity>().unwrap_or_default();
        let mut recent_activity = stored.recent_activity;
        recent_activity.truncate(MAX_RECENT_ACTIVITY);

        let state = UserState {
            recent_activity,
            bookmarks: stored.bookmarks,
            status: ActionStatus::default(),
        };

        Self {
            store: Store::new(state),
            storage,
        }
    }

    pub fn state(&self) -> UserState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<UserState> {
        self.store.subscribe()
    }

    /// Prepend an activity entry, dropping the oldest past the cap
    pub fn record_activity(
        &self,
        action: ActivityAction,
        kind: TargetKind,
        target_id: &str,
        title: &str,
    ) {
        let entry = RecentActivity::new(action, kind, target_id, title);
        self.store.update(|s| {
            s.recent_activity.insert(0, entry);
            s.recent_activity.truncate(MAX_RECENT_ACTIVITY);
        });
        self.persist();
    }

    pub fn clear_activity(&self) {
        self.store.update(|s| s.recent_activity.clear());
        self.persist();
    }

    /// Bookmark an entity; bookmarking it again returns the existing one
    pub fn add_bookmark(&self, kind: TargetKind, target_id: &str, title: &str) -> Bookmark {
        if let Some(existing) = self.find_bookmark(kind, target_id) {
            return existing;
        }

        let bookmark = Bookmark::new(kind, target_id, title);
        self.store.update(|s| s.bookmarks.push(bookmark.clone()));
        self.persist();
        bookmark
    }

    pub fn remove_bookmark(&self, bookmark_id: &str) -> bool {
        let mut removed = false;
        self.store.update(|s| {
            let before = s.bookmarks.len();
            s.bookmarks.retain(|b| b.id != bookmark_id);
            removed = s.bookmarks.len() != before;
        });
        if removed {
            self.persist();
        }
        removed
    }

    pub fn tag_bookmark(&self, bookmark_id: &str, tag: &str) -> Result<()> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(AppError::Validation("Tag cannot be empty".to_string()));
        }
        self.modify_bookmark(bookmark_id, |b| {
            b.tags.insert(tag.to_string());
        })
    }

    pub fn untag_bookmark(&self, bookmark_id: &str, tag: &str) -> Result<()> {
        self.modify_bookmark(bookmark_id, |b| {
            b.tags.remove(tag);
        })
    }

    pub fn bookmarks_with_tag(&self, tag: &str) -> Vec<Bookmark> {
        self.store.read(|s| {
            s.bookmarks
                .iter()
                .filter(|b| b.tags.contains(tag))
                .cloned()
                .collect()
        })
    }

    pub fn is_bookmarked(&self, kind: TargetKind, target_id: &str) -> bool {
        self.find_bookmark(kind, target_id).is_some()
    }

    fn find_bookmark(&self, kind: TargetKind, target_id: &str) -> Option<Bookmark> {
        self.store.read(|s| {
            s.bookmarks
                .iter()
                .find(|b| b.points_at(kind, target_id))
                .cloned()
        })
    }

    fn modify_bookmark(&self, bookmark_id: &str, f: impl FnOnce(&mut Bookmark)) -> Result<()> {
        let mut found = false;
        self.store.update(|s| {
            if let Some(bookmark) = s.bookmarks.iter_mut().find(|b| b.id == bookmark_id) {
                f(bookmark);
                found = true;
            }
        });

        if !found {
            return Err(AppError::NotFound(format!("bookmark {}", bookmark_id)));
        }
        self.persist();
        Ok(())
    }

    fn persist(&self) {
        let stored = self.store.read(|s| StoredActivity {
            recent_activity: s.recent_activity.clone(),
            bookmarks: s.bookmarks.clone(),
        });
        persist_quietly(&self.storage, &stored);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::test_support::temp_storage;

    #[test]
    fn test_activity_is_capped_newest_first() {
        let (storage, _temp) = temp_storage();
        let store = UserStateStore::new(storage);

        for i in 0..(MAX_RECENT_ACTIVITY + 5) {
            store.record_activity(
                ActivityAction::Opened,
                TargetKind::Session,
                &format!("s{i}"),
                "Chat",
            );
        }

        let activity = store.state().recent_activity;
        assert_eq!(activity.len(), MAX_RECENT_ACTIVITY);
        assert_eq!(activity[0].target_id, format!("s{}", MAX_RECENT_ACTIVITY + 4));
        assert_eq!(activity.last().unwrap().target_id, "s5");
    }

    #[test]
    fn test_activity_and_bookmarks_survive_restart() {
        let (storage, _temp) = temp_storage();

        {
            let store = UserStateStore::new(storage.clone());
            store.record_activity(ActivityAction::Created, TargetKind::Project, "p1", "Research");
            let bookmark = store.add_bookmark(TargetKind::Template, "t1", "Review");
            store.tag_bookmark(&bookmark.id, "work").unwrap();
        }

        let store = UserStateStore::new(storage);
        let state = store.state();
        assert_eq!(state.recent_activity.len(), 1);
        assert_eq!(state.recent_activity[0].title, "Research");
        assert_eq!(store.bookmarks_with_tag("work").len(), 1);
    }

    #[test]
    fn test_bookmark_is_not_duplicated() {
        let (storage, _temp) = temp_storage();
        let store = UserStateStore::new(storage);

        let first = store.add_bookmark(TargetKind::Session, "s1", "Chat");
        let second = store.add_bookmark(TargetKind::Session, "s1", "Chat again");

        assert_eq!(first.id, second.id);
        assert_eq!(store.state().bookmarks.len(), 1);
        assert!(store.is_bookmarked(TargetKind::Session, "s1"));
        assert!(!store.is_bookmarked(TargetKind::Project, "s1"));
    }

    #[test]
    fn test_tagging() {
        let (storage, _temp) = temp_storage();
        let store = UserStateStore::new(storage);
        let bookmark = store.add_bookmark(TargetKind::Message, "m1", "Useful answer");

        assert!(store.tag_bookmark(&bookmark.id, "  ").is_err());
        assert!(matches!(
            store.tag_bookmark("missing", "x"),
            Err(AppError::NotFound(_))
        ));

        store.tag_bookmark(&bookmark.id, "rust").unwrap();
        assert_eq!(store.bookmarks_with_tag("rust").len(), 1);

        store.untag_bookmark(&bookmark.id, "rust").unwrap();
        assert!(store.bookmarks_with_tag("rust").is_empty());

        assert!(store.remove_bookmark(&bookmark.id));
        assert!(!store.remove_bookmark(&bookmark.id));
    }

    #[test]
    fn test_clear_activity() {
        let (storage, _temp) = temp_storage();
        let store = UserStateStore::new(storage);
        store.record_activity(ActivityAction::Used, TargetKind::Template, "t1", "Review");

        store.clear_activity();

        assert!(store.state().recent_activity.is_empty());
    }
}
