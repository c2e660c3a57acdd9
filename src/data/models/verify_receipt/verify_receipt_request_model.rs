use serde::Serialize;

/// Request body sent to the verifyReceipt endpoint.
///
/// https://developer.apple.com/documentation/appstorereceipts/requestbody
#[derive(Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct VerifyReceiptRequestModel {
    /// The Base64-encoded receipt data.
    pub(crate) receipt_data: String,
    /// The app's shared secret, a hexadecimal string.
    pub(crate) password: String,
    /// Whether the response includes only the latest renewal transaction for
    /// any subscriptions. Always true.
    pub(crate) exclude_old_transactions: bool,
}

impl VerifyReceiptRequestModel {
    pub(crate) fn new(receipt_data: &str, shared_secret: &str) -> Self {
        Self {
            receipt_data: receipt_data.to_owned(),
            password: shared_secret.to_owned(),
            exclude_old_transactions: true,
        }
    }
}

impl std::fmt::Debug for VerifyReceiptRequestModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyReceiptRequestModel")
            .field("receipt_data_len", &self.receipt_data.len())
            .field("password", &"<redacted>")
            .field("exclude_old_transactions", &self.exclude_old_transactions)
            .finish()
    }
}
