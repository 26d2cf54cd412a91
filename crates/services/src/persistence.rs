//! Loading tracker state on start and writing it back in the background.
//!
//! Mutations never wait on storage. The change hook encodes whichever
//! collections changed and queues them for a single writer task, which
//! applies writes in the order they were queued.

use std::collections::HashSet;
use std::sync::Arc;

use storage::records::{
    decode_chapters, decode_subjects, decode_tasks, encode_chapters, encode_subjects, encode_tasks,
};
use storage::repository::{KeyValueStore, StorageError, StoreKey};
use tokio::sync::{mpsc, oneshot};
use tracker_core::model::SubjectId;
use tracker_core::{ChangeHook, Collection, ProgressTree, TaskInbox, TrackerState};

use crate::error::TrackerServiceError;

enum WriteCommand {
    Put { key: StoreKey, value: String },
    Flush(oneshot::Sender<()>),
}

/// Handle to the background writer. Cloning shares the same queue.
#[derive(Clone)]
pub struct Persister {
    tx: mpsc::UnboundedSender<WriteCommand>,
}

impl Persister {
    /// Start the writer task on the current tokio runtime.
    ///
    /// The task stops once every `Persister` handle has been dropped and the
    /// queue is drained.
    #[must_use]
    pub fn spawn(store: Arc<dyn KeyValueStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriteCommand>();
        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    WriteCommand::Put { key, value } => {
                        if let Err(err) = store.put(key, &value).await {
                            tracing::warn!(?err, %key, "failed to persist collection");
                        }
                    }
                    WriteCommand::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            tracing::debug!("persistence writer stopped");
        });
        Self { tx }
    }

    /// Queue `value` to be written under `key`.
    pub fn put(&self, key: StoreKey, value: String) {
        if self.tx.send(WriteCommand::Put { key, value }).is_err() {
            tracing::warn!(%key, "persistence writer is gone; dropping write");
        }
    }

    /// Wait until every write queued before this call has been applied.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(WriteCommand::Flush(done)).is_err() {
            return;
        }
        let _ = wait.await;
    }

    /// Build a tracker change hook that queues the touched collections.
    #[must_use]
    pub fn change_hook(&self) -> ChangeHook {
        let persister = self.clone();
        Box::new(move |state: &TrackerState, touched: &[Collection]| {
            for collection in touched {
                let (key, encoded) = encode_collection(state, *collection);
                match encoded {
                    Ok(value) => persister.put(key, value),
                    Err(err) => tracing::warn!(?err, %key, "failed to encode collection"),
                }
            }
        })
    }
}

fn encode_collection(
    state: &TrackerState,
    collection: Collection,
) -> (StoreKey, Result<String, StorageError>) {
    match collection {
        Collection::Subjects => (StoreKey::Subjects, encode_subjects(state.tree())),
        Collection::Chapters => (StoreKey::Chapters, encode_chapters(state.tree())),
        Collection::Tasks => (StoreKey::Tasks, encode_tasks(state.inbox().tasks())),
    }
}

/// Read the tree and inbox from `store`. Missing keys load as empty.
///
/// # Errors
///
/// Returns `TrackerServiceError::Storage` if a stored document cannot be read
/// or decoded, and `TrackerServiceError::Tracker` if the documents contain
/// duplicate ids.
pub async fn load_state(store: &dyn KeyValueStore) -> Result<TrackerState, TrackerServiceError> {
    let subjects = match store.get(StoreKey::Subjects).await? {
        Some(raw) => decode_subjects(&raw)?,
        None => Vec::new(),
    };
    let chapters = match store.get(StoreKey::Chapters).await? {
        Some(raw) => decode_chapters(&raw)?,
        None => Vec::new(),
    };
    let tasks = match store.get(StoreKey::Tasks).await? {
        Some(raw) => decode_tasks(&raw)?,
        None => Vec::new(),
    };

    let known: HashSet<SubjectId> = subjects.iter().map(|s| s.id()).collect();
    let orphans = chapters
        .iter()
        .filter(|c| !known.contains(&c.subject_id()))
        .count();
    if orphans > 0 {
        tracing::warn!(orphans, "dropping chapters whose subject no longer exists");
    }

    let tree = ProgressTree::from_persisted(subjects, chapters)?;
    let inbox = TaskInbox::from_persisted(tasks);
    tracing::info!(
        subjects = tree.subjects().len(),
        chapters = tree.chapters().len(),
        tasks = inbox.tasks().len(),
        "loaded tracker state"
    );
    Ok(TrackerState::new(tree, inbox))
}
