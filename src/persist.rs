//! Write-through persistence for the score store.
//!
//! Mutations commit to memory first and hand a snapshot to a background
//! worker. The worker drains its queue before each write and only stores the
//! newest snapshot, so the durable copy always converges on the last
//! committed state rather than whichever write happened to finish last.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::score::{ScoreEntry, HISTORY_KEY, VISIBLE_SCORES_KEY};
use crate::storage::KeyValueStore;

/// Final fate of a snapshot handed to the persister
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    /// This snapshot was written to storage.
    Written,
    /// A newer snapshot was written in its place.
    Superseded,
    /// The write failed or the persister was gone; storage may be stale.
    Dropped,
}

impl Durability {
    pub fn is_durable(self) -> bool {
        matches!(self, Durability::Written | Durability::Superseded)
    }
}

/// Completion signal for one mutation. Dropping it is fire-and-forget.
#[derive(Debug)]
pub struct PendingWrite {
    rx: Receiver<Durability>,
}

impl PendingWrite {
    /// Block until the snapshot is settled
    pub fn wait(self) -> Durability {
        self.rx.recv().unwrap_or(Durability::Dropped)
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    seq: u64,
    visible: Vec<ScoreEntry>,
    history: Vec<ScoreEntry>,
}

enum Job {
    Write {
        snapshot: Snapshot,
        done: Sender<Durability>,
    },
    Flush(Sender<()>),
}

/// Owner of the background writer thread
pub struct ScorePersister {
    tx: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    next_seq: u64,
}

impl ScorePersister {
    pub fn spawn(storage: Arc<dyn KeyValueStore>) -> Self {
        let (tx, rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("mathoff-persist".to_string())
            .spawn(move || run_worker(storage.as_ref(), rx));

        let (tx, worker) = match worker {
            Ok(handle) => (Some(tx), Some(handle)),
            Err(e) => {
                tracing::error!(error = %e, "failed to start persister; scores will not be saved");
                (None, None)
            }
        };

        Self {
            tx,
            worker,
            next_seq: 0,
        }
    }

    /// Queue a snapshot of both lists. Never blocks on storage.
    pub fn submit(&mut self, visible: &[ScoreEntry], history: &[ScoreEntry]) -> PendingWrite {
        self.next_seq += 1;
        let seq = self.next_seq;
        let (done, rx) = mpsc::channel();

        let job = Job::Write {
            snapshot: Snapshot {
                seq,
                visible: visible.to_vec(),
                history: history.to_vec(),
            },
            done,
        };

        match &self.tx {
            Some(tx) => {
                if tx.send(job).is_err() {
                    tracing::error!(seq, "persister stopped; dropping score write");
                }
            }
            None => tracing::error!(seq, "persister unavailable; dropping score write"),
        }

        PendingWrite { rx }
    }

    /// Block until every snapshot submitted so far is settled
    pub fn flush(&self) {
        let Some(tx) = &self.tx else {
            return;
        };
        let (done, rx) = mpsc::channel();
        if tx.send(Job::Flush(done)).is_ok() {
            let _ = rx.recv();
        }
    }
}

impl Drop for ScorePersister {
    fn drop(&mut self) {
        // Closing the channel lets the worker finish queued writes and exit
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl std::fmt::Debug for ScorePersister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScorePersister")
            .field("running", &self.tx.is_some())
            .field("next_seq", &self.next_seq)
            .finish()
    }
}

fn run_worker(storage: &dyn KeyValueStore, rx: Receiver<Job>) {
    while let Ok(first) = rx.recv() {
        let mut batch = vec![first];
        while let Ok(next) = rx.try_recv() {
            batch.push(next);
        }

        let newest = batch.iter().rposition(|job| matches!(job, Job::Write { .. }));
        let outcome = match newest.map(|idx| &batch[idx]) {
            Some(Job::Write { snapshot, .. }) => {
                Some((snapshot.seq, write_snapshot(storage, snapshot)))
            }
            _ => None,
        };

        for job in batch {
            match job {
                Job::Write { snapshot, done } => {
                    let durability = match outcome {
                        Some((seq, written)) if seq == snapshot.seq => {
                            if written {
                                Durability::Written
                            } else {
                                Durability::Dropped
                            }
                        }
                        Some((seq, true)) => {
                            tracing::debug!(
                                seq = snapshot.seq,
                                by = seq,
                                "score snapshot superseded"
                            );
                            Durability::Superseded
                        }
                        _ => Durability::Dropped,
                    };
                    let _ = done.send(durability);
                }
                Job::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
    }
}

fn write_snapshot(storage: &dyn KeyValueStore, snapshot: &Snapshot) -> bool {
    let visible_ok = write_list(storage, VISIBLE_SCORES_KEY, &snapshot.visible, snapshot.seq);
    let history_ok = write_list(storage, HISTORY_KEY, &snapshot.history, snapshot.seq);
    visible_ok && history_ok
}

fn write_list(storage: &dyn KeyValueStore, key: &str, entries: &[ScoreEntry], seq: u64) -> bool {
    let encoded = match serde_json::to_string(entries) {
        Ok(encoded) => encoded,
        Err(e) => {
            tracing::error!(key, seq, error = %e, "failed to encode scores");
            return false;
        }
    };

    match storage.set_item(key, &encoded) {
        Ok(()) => {
            tracing::debug!(key, seq, entries = entries.len(), "scores persisted");
            true
        }
        Err(e) => {
            tracing::error!(key, seq, error = %e, "failed to persist scores");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::{FailingStorage, MemoryStorage};
    use std::sync::Mutex;

    /// Storage that blocks every write until the test opens the gate.
    /// Each write announces itself on `entered` before blocking.
    struct GatedStorage {
        inner: MemoryStorage,
        entered: Mutex<Sender<()>>,
        gate: Mutex<Receiver<()>>,
    }

    impl KeyValueStore for GatedStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            let _ = self.entered.lock().unwrap().send(());
            let _ = self.gate.lock().unwrap().recv();
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove_item(key)
        }
    }

    fn entry(points: i64) -> ScoreEntry {
        ScoreEntry::new(points, None, None, None)
    }

    #[test]
    fn test_submit_then_wait_is_written() {
        let storage = Arc::new(MemoryStorage::new());
        let mut persister = ScorePersister::spawn(storage.clone());

        let pending = persister.submit(&[entry(1)], &[entry(1)]);
        assert_eq!(pending.wait(), Durability::Written);

        assert_eq!(
            storage.get_item(VISIBLE_SCORES_KEY).unwrap().as_deref(),
            Some(r#"[{"points":1}]"#)
        );
        assert_eq!(
            storage.get_item(HISTORY_KEY).unwrap().as_deref(),
            Some(r#"[{"points":1}]"#)
        );
    }

    #[test]
    fn test_queued_snapshots_collapse_to_newest() {
        let (open, gate) = mpsc::channel();
        let (entered, entered_rx) = mpsc::channel();
        let storage = Arc::new(GatedStorage {
            inner: MemoryStorage::new(),
            entered: Mutex::new(entered),
            gate: Mutex::new(gate),
        });
        let mut persister = ScorePersister::spawn(storage.clone());

        // Worker is parked inside the first write before more are queued
        let first = persister.submit(&[entry(1)], &[entry(1)]);
        entered_rx.recv().unwrap();
        let second = persister.submit(&[entry(1), entry(2)], &[entry(1), entry(2)]);
        let third = persister.submit(&[], &[entry(1), entry(2)]);

        // 2 keys for the first snapshot, 2 for the newest
        for _ in 0..4 {
            open.send(()).unwrap();
        }

        assert_eq!(first.wait(), Durability::Written);
        assert_eq!(second.wait(), Durability::Superseded);
        assert_eq!(third.wait(), Durability::Written);
        assert_eq!(
            storage.get_item(VISIBLE_SCORES_KEY).unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn test_failed_write_is_dropped_not_raised() {
        let mut persister = ScorePersister::spawn(Arc::new(FailingStorage));
        let pending = persister.submit(&[entry(3)], &[entry(3)]);
        let outcome = pending.wait();
        assert_eq!(outcome, Durability::Dropped);
        assert!(!outcome.is_durable());
    }

    #[test]
    fn test_flush_waits_for_all_submissions() {
        let storage = Arc::new(MemoryStorage::new());
        let mut persister = ScorePersister::spawn(storage.clone());

        for points in 0..10 {
            let _ = persister.submit(&[entry(points)], &[entry(points)]);
        }
        persister.flush();

        assert_eq!(
            storage.get_item(HISTORY_KEY).unwrap().as_deref(),
            Some(r#"[{"points":9}]"#)
        );
    }

    #[test]
    fn test_drop_finishes_queued_writes() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let mut persister = ScorePersister::spawn(storage.clone());
            let _ = persister.submit(&[entry(7)], &[entry(7)]);
        }
        assert_eq!(
            storage.get_item(VISIBLE_SCORES_KEY).unwrap().as_deref(),
            Some(r#"[{"points":7}]"#)
        );
    }
}
