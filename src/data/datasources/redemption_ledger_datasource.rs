use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    data::models::redemption_ledger::ledger_entry_model::LedgerEntryModel,
    errors::ReceiptVerificationError,
};

/// Document store holding the last redeemed transaction per user.
///
/// Implementations must make `compare_and_set` atomic per `uid`: two
/// concurrent calls for the same user and transaction must not both return
/// `true`, and dropping the returned future must never leave a partially
/// written document.
#[async_trait]
pub trait RedemptionLedgerDatasource: Send + Sync {
    async fn get(&self, uid: &str) -> Result<Option<LedgerEntryModel>, ReceiptVerificationError>;

    /// Records `transaction_id` as the user's last redeemed transaction.
    ///
    /// Returns `false` without writing if it is already the recorded one.
    async fn compare_and_set(
        &self,
        uid: &str,
        transaction_id: &str,
    ) -> Result<bool, ReceiptVerificationError>;
}

#[async_trait]
impl<T: RedemptionLedgerDatasource + ?Sized> RedemptionLedgerDatasource for Arc<T> {
    async fn get(&self, uid: &str) -> Result<Option<LedgerEntryModel>, ReceiptVerificationError> {
        (**self).get(uid).await
    }

    async fn compare_and_set(
        &self,
        uid: &str,
        transaction_id: &str,
    ) -> Result<bool, ReceiptVerificationError> {
        (**self).compare_and_set(uid, transaction_id).await
    }
}

/// Process-local ledger. Entries are lost when the process exits.
#[derive(Default)]
pub struct InMemoryRedemptionLedgerDatasource {
    entries: Mutex<HashMap<String, LedgerEntryModel>>,
}

impl InMemoryRedemptionLedgerDatasource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl RedemptionLedgerDatasource for InMemoryRedemptionLedgerDatasource {
    async fn get(&self, uid: &str) -> Result<Option<LedgerEntryModel>, ReceiptVerificationError> {
        Ok(self.entries.lock().get(uid).cloned())
    }

    async fn compare_and_set(
        &self,
        uid: &str,
        transaction_id: &str,
    ) -> Result<bool, ReceiptVerificationError> {
        let mut entries = self.entries.lock();
        if entries
            .get(uid)
            .is_some_and(|entry| entry.transaction_id == transaction_id)
        {
            return Ok(false);
        }
        entries.insert(
            uid.to_owned(),
            LedgerEntryModel {
                uid: uid.to_owned(),
                transaction_id: transaction_id.to_owned(),
            },
        );
        Ok(true)
    }
}
