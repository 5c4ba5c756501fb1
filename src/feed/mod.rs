//! Live homework feed.
//!
//! A collection publishes its full contents on every change; consumers keep
//! the latest snapshot and re-derive what they show from it. Nothing is
//! patched incrementally.

mod filter;

pub use filter::*;

use std::sync::Arc;

use tokio::sync::watch;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{HomeworkEntry, UserProfile};

/// Full contents of a collection at one revision.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub revision: i64,
    pub items: Arc<Vec<T>>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            revision: self.revision,
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Snapshot<T> {
    pub fn new(revision: i64, items: Vec<T>) -> Self {
        Self {
            revision,
            items: Arc::new(items),
        }
    }
}

/// A collection that pushes its whole result set to every subscriber.
///
/// Backed by a `watch` channel, so a subscriber sees snapshots in publish
/// order and always ends on the latest one, though a slow subscriber may
/// skip intermediate ones.
pub struct LiveCollection<T> {
    tx: watch::Sender<Snapshot<T>>,
}

impl<T: Send + Sync + 'static> LiveCollection<T> {
    pub fn new(initial: Snapshot<T>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Replace the current snapshot and wake subscribers. Older revisions
    /// than the one already held are dropped.
    pub fn publish(&self, snapshot: Snapshot<T>) {
        self.tx.send_if_modified(|current| {
            if snapshot.revision < current.revision {
                return false;
            }
            *current = snapshot;
            true
        });
    }

    pub fn current(&self) -> Snapshot<T> {
        self.tx.borrow().clone()
    }

    /// Subscribe; the current snapshot counts as unseen so the first
    /// `next()` returns immediately.
    pub fn subscribe(&self) -> Subscription<T> {
        let mut rx = self.tx.subscribe();
        rx.mark_changed();
        Subscription { rx }
    }
}

/// Receiving end of a [`LiveCollection`].
pub struct Subscription<T> {
    rx: watch::Receiver<Snapshot<T>>,
}

impl<T> Subscription<T> {
    /// Wait for the next snapshot. `None` once the collection is gone.
    pub async fn next(&mut self) -> Option<Snapshot<T>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

pub type HomeworkFeed = LiveCollection<HomeworkEntry>;
pub type UserDirectory = LiveCollection<UserProfile>;

/// Re-read `homework` and publish it.
pub async fn refresh_homework(repo: &Repository, feed: &HomeworkFeed) -> Result<(), AppError> {
    let revision = repo.get_revision_id().await?;
    let entries = repo.list_homework().await?;
    tracing::debug!(revision, count = entries.len(), "Publishing homework snapshot");
    feed.publish(Snapshot::new(revision, entries));
    Ok(())
}

/// Re-read `users` and publish it.
pub async fn refresh_users(repo: &Repository, users: &UserDirectory) -> Result<(), AppError> {
    let revision = repo.get_revision_id().await?;
    let profiles = repo.list_users().await?;
    tracing::debug!(revision, count = profiles.len(), "Publishing user snapshot");
    users.publish(Snapshot::new(revision, profiles));
    Ok(())
}

/// View state for one consumer of the homework feed: the latest snapshot
/// and the latest filter, nothing else.
#[derive(Debug, Clone, Default)]
pub struct FeedView {
    entries: Arc<Vec<HomeworkEntry>>,
    filter: FilterState,
}

impl FeedView {
    /// A view with no snapshot yet, each filter input applied in turn.
    pub fn new(filter: FilterState) -> Self {
        let FilterState {
            term,
            date,
            subject,
        } = filter;
        let mut view = Self::default();
        view.set_term(term);
        view.set_date(date);
        view.set_subject(subject);
        view
    }

    pub fn apply_snapshot(&mut self, snapshot: &Snapshot<HomeworkEntry>) -> Vec<HomeworkEntry> {
        self.entries = Arc::clone(&snapshot.items);
        self.visible()
    }

    pub fn set_term(&mut self, term: impl Into<String>) -> Vec<HomeworkEntry> {
        self.filter.term = term.into();
        self.visible()
    }

    pub fn set_date(&mut self, date: impl Into<String>) -> Vec<HomeworkEntry> {
        self.filter.date = date.into();
        self.visible()
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) -> Vec<HomeworkEntry> {
        self.filter.subject = subject.into();
        self.visible()
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Latest snapshot filtered by the latest filter.
    pub fn visible(&self) -> Vec<HomeworkEntry> {
        self.filter.apply(&self.entries)
    }
}
