//! Observable domain stores
//!
//! Each store owns one slice of state in a `tokio::sync::watch` channel and
//! exposes synchronous setters plus async actions. Actions follow one
//! protocol, implemented by [`Store::run`]:
//!
//! 1. `loading = true`, `error = None`
//! 2. await the backend call
//! 3. on success apply the result and clear `loading` in a single update
//! 4. on failure record the message, clear `loading`, return the error
//!
//! Mutations (create/update/delete) re-fetch the collection for the same
//! scope before applying, so after a successful mutation the collection
//! equals the backend list. Every store exposes that re-fetch as `reload()`.
//!
//! There is no retry, cancellation or de-duplication. Two overlapping
//! actions both run and the last one to finish determines the state.

pub mod projects;
pub mod providers;
pub mod sessions;
pub mod settings;
pub mod templates;
pub mod user_state;

pub use projects::{ProjectsState, ProjectsStore};
pub use providers::{ProvidersState, ProvidersStore};
pub use sessions::{ChatSessionsState, ChatSessionsStore};
pub use settings::{SettingsState, SettingsStore};
pub use templates::{TemplatesState, TemplatesStore};
pub use user_state::{UserState, UserStateStore};

use crate::error::{AppError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Loading flag and last error message shared by every store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionStatus {
    pub loading: bool,
    pub error: Option<String>,
}

pub trait StoreState: Clone + Send + Sync + 'static {
    fn status(&self) -> &ActionStatus;
    fn status_mut(&mut self) -> &mut ActionStatus;
}

/// Observable state cell with the action protocol
pub struct Store<S> {
    tx: Arc<watch::Sender<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<S: StoreState> Store<S> {
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> S {
        self.tx.borrow().clone()
    }

    /// Read part of the state without cloning all of it
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }

    /// Synchronous setter; subscribers are notified
    pub fn update(&self, f: impl FnOnce(&mut S)) {
        self.tx.send_modify(f);
    }

    pub fn status(&self) -> ActionStatus {
        self.read(|s| s.status().clone())
    }

    pub fn set_error(&self, message: Option<String>) {
        self.update(|s| s.status_mut().error = message);
    }

    /// Run one action under the loading/error protocol.
    ///
    /// `apply` receives the action's output and runs inside the same state
    /// update that clears `loading`.
    pub async fn run<T, R, Fut>(
        &self,
        action: &'static str,
        fut: Fut,
        apply: impl FnOnce(&mut S, T) -> R,
    ) -> Result<R>
    where
        Fut: Future<Output = Result<T>>,
    {
        self.update(|s| {
            let status = s.status_mut();
            status.loading = true;
            status.error = None;
        });

        match fut.await {
            Ok(value) => {
                let mut output = None;
                self.update(|s| {
                    s.status_mut().loading = false;
                    output = Some(apply(s, value));
                });
                output.ok_or_else(|| AppError::Generic(format!("{action}: state not applied")))
            }
            Err(e) => {
                tracing::error!("{} failed: {}", action, e);
                let message = e.to_string();
                self.update(|s| {
                    let status = s.status_mut();
                    status.loading = false;
                    status.error = Some(message);
                });
                Err(e)
            }
        }
    }
}
