use std::{
    collections::hash_map::DefaultHasher,
    fs,
    hash::{Hash, Hasher},
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::{
    constants::LEDGER_COLLECTION,
    data::models::redemption_ledger::ledger_entry_model::LedgerEntryModel,
    errors::ReceiptVerificationError,
};

use super::redemption_ledger_datasource::RedemptionLedgerDatasource;

/// Number of lock stripes shared by all users of one ledger.
const LOCK_STRIPES: usize = 64;

/// Ledger persisted as one JSON document per user under
/// `<root>/Receipt/<encoded uid>.json`.
///
/// Writes go to a temporary file that is renamed over the document, so a
/// reader never observes a partial document. Each uid maps to one of a fixed
/// set of async lock stripes; file I/O runs on the blocking pool while the
/// stripe is held. Serialization is process-local; a directory must not be
/// shared by several processes.
pub struct FileRedemptionLedgerDatasource {
    collection_dir: PathBuf,
    lock_stripes: Vec<Arc<Mutex<()>>>,
}

impl FileRedemptionLedgerDatasource {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ReceiptVerificationError> {
        let collection_dir = root.as_ref().join(LEDGER_COLLECTION);
        fs::create_dir_all(&collection_dir).map_err(|e| {
            ReceiptVerificationError::Ledger(format!(
                "failed to create ledger directory {}; {e}",
                collection_dir.display()
            ))
        })?;
        Ok(Self {
            collection_dir,
            lock_stripes: (0..LOCK_STRIPES).map(|_| Arc::new(Mutex::new(()))).collect(),
        })
    }

    fn document_path(&self, uid: &str) -> PathBuf {
        document_path(&self.collection_dir, uid)
    }

    fn lock_for(&self, uid: &str) -> Arc<Mutex<()>> {
        let mut hasher = DefaultHasher::new();
        uid.hash(&mut hasher);
        self.lock_stripes[(hasher.finish() as usize) % self.lock_stripes.len()].clone()
    }

    /// Runs `operation` on the blocking pool while holding the uid's stripe.
    ///
    /// Waiting for the stripe can be cancelled. Once `operation` has started
    /// the guard travels with it, so the stripe is only released after the
    /// file work completes even if the caller stops waiting.
    async fn with_user_lock<T, F>(&self, uid: &str, operation: F) -> Result<T, ReceiptVerificationError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, ReceiptVerificationError> + Send + 'static,
    {
        let guard: OwnedMutexGuard<()> = self.lock_for(uid).lock_owned().await;
        let collection_dir = self.collection_dir.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            operation(&collection_dir)
        })
        .await
        .map_err(|e| ReceiptVerificationError::Ledger(format!("ledger task failed; {e}")))?
    }
}

fn document_path(collection_dir: &Path, uid: &str) -> PathBuf {
    // Encoded so that arbitrary uids map to a single flat file name.
    collection_dir.join(format!("{}.json", URL_SAFE_NO_PAD.encode(uid.as_bytes())))
}

fn read_document(
    collection_dir: &Path,
    uid: &str,
) -> Result<Option<LedgerEntryModel>, ReceiptVerificationError> {
    let path = document_path(collection_dir, uid);
    let contents = match fs::read(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ReceiptVerificationError::Ledger(format!(
                "failed to read {}; {e}",
                path.display()
            )))
        }
    };
    serde_json::from_slice(&contents).map(Some).map_err(|e| {
        ReceiptVerificationError::Ledger(format!("corrupt document {}; {e}", path.display()))
    })
}

fn write_document(
    collection_dir: &Path,
    entry: &LedgerEntryModel,
) -> Result<(), ReceiptVerificationError> {
    let path = document_path(collection_dir, &entry.uid);
    let tmp_path = path.with_extension("json.tmp");
    let contents = serde_json::to_vec(entry).map_err(|e| {
        ReceiptVerificationError::Ledger(format!("failed to encode document; {e}"))
    })?;
    fs::write(&tmp_path, contents)
        .and_then(|()| fs::rename(&tmp_path, &path))
        .map_err(|e| {
            ReceiptVerificationError::Ledger(format!("failed to write {}; {e}", path.display()))
        })
}

#[async_trait]
impl RedemptionLedgerDatasource for FileRedemptionLedgerDatasource {
    async fn get(&self, uid: &str) -> Result<Option<LedgerEntryModel>, ReceiptVerificationError> {
        let owned_uid = uid.to_owned();
        self.with_user_lock(uid, move |dir| read_document(dir, &owned_uid))
            .await
    }

    async fn compare_and_set(
        &self,
        uid: &str,
        transaction_id: &str,
    ) -> Result<bool, ReceiptVerificationError> {
        let entry = LedgerEntryModel {
            uid: uid.to_owned(),
            transaction_id: transaction_id.to_owned(),
        };
        // Read, compare and write all happen in one blocking task under the
        // stripe lock.
        let written = self
            .with_user_lock(uid, move |dir| {
                if read_document(dir, &entry.uid)?
                    .is_some_and(|current| current.transaction_id == entry.transaction_id)
                {
                    return Ok(false);
                }
                write_document(dir, &entry)?;
                Ok(true)
            })
            .await?;
        if written {
            debug!(uid, transaction_id, "ledger document written");
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_documents_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let ledger = FileRedemptionLedgerDatasource::open(dir.path()).expect("open");
            assert!(ledger.compare_and_set("user/1", "1000").await.expect("cas"));
        }
        let ledger = FileRedemptionLedgerDatasource::open(dir.path()).expect("reopen");
        let entry = ledger.get("user/1").await.expect("get").expect("entry");
        assert_eq!(entry.uid, "user/1");
        assert_eq!(entry.transaction_id, "1000");
        assert!(!ledger.compare_and_set("user/1", "1000").await.expect("cas"));
        assert!(ledger.compare_and_set("user/1", "1001").await.expect("cas"));
    }

    #[tokio::test]
    async fn test_document_layout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = FileRedemptionLedgerDatasource::open(dir.path()).expect("open");
        assert!(ledger.compare_and_set("user-1", "1000").await.expect("cas"));

        let files: Vec<_> = fs::read_dir(dir.path().join("Receipt"))
            .expect("collection dir")
            .map(|entry| entry.expect("dir entry").file_name())
            .collect();
        assert_eq!(files.len(), 1);

        let contents = fs::read(ledger.document_path("user-1")).expect("document");
        let json: serde_json::Value = serde_json::from_slice(&contents).expect("json");
        assert_eq!(
            json,
            serde_json::json!({ "uid": "user-1", "transactionId": "1000" })
        );
    }

    #[tokio::test]
    async fn test_corrupt_document_is_store_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = FileRedemptionLedgerDatasource::open(dir.path()).expect("open");
        fs::write(ledger.document_path("user-1"), b"not json").expect("write");
        let err = ledger.get("user-1").await.expect_err("corrupt");
        assert!(err.is_fatal());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_compare_and_set_single_winner() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = Arc::new(FileRedemptionLedgerDatasource::open(dir.path()).expect("open"));
        let handles: Vec<_> = (0..100)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.compare_and_set("user-1", "1000").await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.expect("join").expect("cas") {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_held_lock_does_not_block_past_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = FileRedemptionLedgerDatasource::open(dir.path()).expect("open");
        let held = ledger.lock_for("user-1").lock_owned().await;

        let started = std::time::Instant::now();
        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            ledger.compare_and_set("user-1", "1000"),
        )
        .await;
        assert!(outcome.is_err());
        assert!(started.elapsed() < Duration::from_secs(1));

        drop(held);
        assert!(ledger.get("user-1").await.expect("get").is_none());
        assert!(ledger.compare_and_set("user-1", "1000").await.expect("cas"));
    }

    #[tokio::test]
    async fn test_lock_stripes_stay_bounded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = FileRedemptionLedgerDatasource::open(dir.path()).expect("open");
        for i in 0..500 {
            assert!(ledger
                .compare_and_set(&format!("user-{i}"), "1000")
                .await
                .expect("cas"));
        }
        assert_eq!(ledger.lock_stripes.len(), LOCK_STRIPES);
        assert!(Arc::ptr_eq(&ledger.lock_for("user-7"), &ledger.lock_for("user-7")));
    }
}
