use async_trait::async_trait;

use crate::{
    domain::entities::{ledger_entry::LedgerEntry, verified_receipt::VerifiedReceipt},
    errors::ReceiptVerificationError,
};

#[async_trait]
pub trait ReceiptRepository: Send + Sync {
    /// Sends the receipt to the verification endpoint and interprets the
    /// answer, selecting the most recent purchase record.
    async fn verify_receipt(
        &self,
        receipt_data: &str,
    ) -> Result<VerifiedReceipt, ReceiptVerificationError>;

    /// Atomically records `transaction_id` as the user's last redeemed
    /// transaction. Returns `false` if it was already recorded.
    async fn redeem_transaction(
        &self,
        user_id: &str,
        transaction_id: &str,
    ) -> Result<bool, ReceiptVerificationError>;

    async fn get_redemption(
        &self,
        user_id: &str,
    ) -> Result<Option<LedgerEntry>, ReceiptVerificationError>;
}
