use chrono::{DateTime, Utc};

/// A single purchase event contained in a receipt.
///
/// Receipts may carry several records (renewals, restores); records are
/// unique by `transaction_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRecord {
    pub transaction_id: String,
    pub original_transaction_id: Option<String>,
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
    pub purchase_date: Option<DateTime<Utc>>,
    /// Expiration exactly as returned by the verification endpoint.
    pub expires_date: Option<String>,
    /// Expiration resolved from `expires_date`, or from the millisecond
    /// timestamp when the text is missing or unparsable.
    pub expiration_time: Option<DateTime<Utc>>,
}

impl PurchaseRecord {
    /// Whether the purchase is still valid at `now`.
    ///
    /// A record without a resolvable expiration time is considered expired.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_time
            .map(|expiration_time| now < expiration_time)
            .unwrap_or(false)
    }
}
