use super::purchase_record::PurchaseRecord;

/// A receipt accepted by the verification endpoint and belonging to this
/// application.
#[derive(Debug, Clone)]
pub struct VerifiedReceipt {
    pub bundle_id: String,
    pub is_sandbox: bool,
    /// The most recent purchase record, as chosen by the configured
    /// `TransactionOrdering`.
    pub latest_transaction: PurchaseRecord,
    pub purchase_record_count: usize,
}
