//! Poll-based document watcher.
//!
//! The REST surface has no push channel, so live views (like counts under a
//! player, the settings panel) watch a document by polling it and publishing
//! only actual changes. Consumers hold a `tokio::sync::watch` receiver; the
//! poll task dies with the handle.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::FirestoreClient;
use crate::types::Document;

/// Default poll cadence for live document views.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Handle to a watched document.
///
/// Dropping the handle stops the poll task. In-flight reads are allowed to
/// finish on their own.
pub struct DocumentWatch {
    receiver: watch::Receiver<Option<Document>>,
    task: JoinHandle<()>,
}

impl DocumentWatch {
    /// A receiver for the latest observed document state.
    ///
    /// `None` means the document does not currently exist (or has not been
    /// observed yet).
    pub fn receiver(&self) -> watch::Receiver<Option<Document>> {
        self.receiver.clone()
    }
}

impl Drop for DocumentWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start watching one document.
///
/// Errors during polling are logged and skipped; a backend hiccup must not
/// kill the watcher, it just delays the next observation.
pub fn watch_document(
    client: FirestoreClient,
    collection: impl Into<String>,
    doc_id: impl Into<String>,
    poll_interval: Duration,
) -> DocumentWatch {
    let collection = collection.into();
    let doc_id = doc_id.into();
    let (sender, receiver) = watch::channel(None);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // Signature of the last published state: (exists, updateTime).
        let mut last_seen: Option<(bool, Option<String>)> = None;

        loop {
            ticker.tick().await;

            let observed = match client.get_document(&collection, &doc_id).await {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(
                        collection = %collection,
                        doc_id = %doc_id,
                        "Document poll failed, will retry: {}",
                        e
                    );
                    continue;
                }
            };

            let signature = (
                observed.is_some(),
                observed.as_ref().and_then(|d| d.update_time.clone()),
            );

            if last_seen.as_ref() != Some(&signature) {
                debug!(
                    collection = %collection,
                    doc_id = %doc_id,
                    exists = signature.0,
                    "Watched document changed"
                );
                last_seen = Some(signature);
                if sender.send(observed).is_err() {
                    // Every receiver is gone; nothing left to notify.
                    break;
                }
            }
        }
    });

    DocumentWatch { receiver, task }
}
