use serde::{Deserialize, Serialize};

/// Ledger document stored per user, keyed by `uid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntryModel {
    pub uid: String,
    #[serde(rename = "transactionId")]
    pub transaction_id: String,
}
