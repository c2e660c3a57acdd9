/// verifyReceipt endpoint of the App Store sandbox environment.
pub const SANDBOX_VERIFY_RECEIPT_URL: &str = "https://sandbox.itunes.apple.com/verifyReceipt";

/// verifyReceipt endpoint of the App Store production environment.
pub const PRODUCTION_VERIFY_RECEIPT_URL: &str = "https://buy.itunes.apple.com/verifyReceipt";

/// Status returned by verifyReceipt when the receipt is valid.
pub const STATUS_OK: i64 = 0;

/// Status returned when a sandbox receipt is sent to the production
/// environment for verification.
pub const STATUS_SANDBOX_RECEIPT_ON_PRODUCTION: i64 = 21007;

/// Layout of the textual `*_date` fields in verifyReceipt responses (UTC). The
/// endpoint usually appends a zone label such as `Etc/GMT`, which is stripped
/// before parsing.
pub const RECEIPT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub(crate) const DEFAULT_LEDGER_TIMEOUT_MS: u64 = 5_000;

/// Name of the ledger collection. Each user has one document in it.
pub(crate) const LEDGER_COLLECTION: &str = "Receipt";
