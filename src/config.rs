//! Configuration for the receipt verifier.

use std::{env, fmt, time::Duration};

use serde::Deserialize;
use tracing::debug;

use crate::{
    constants::{DEFAULT_LEDGER_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS, SANDBOX_VERIFY_RECEIPT_URL},
    domain::entities::transaction_ordering::TransactionOrdering,
    errors::ReceiptVerificationError,
};

pub const ENV_SHARED_SECRET: &str = "PASSWORD";
pub const ENV_BUNDLE_ID: &str = "BUNDLE_ID";
pub const ENV_VERIFY_URL: &str = "VERIFY_RECEIPT_URL";
pub const ENV_RETRY_URL: &str = "VERIFY_RECEIPT_RETRY_URL";
pub const ENV_TRANSACTION_ORDERING: &str = "TRANSACTION_ORDERING";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "REQUEST_TIMEOUT_MS";
pub const ENV_LEDGER_TIMEOUT_MS: &str = "LEDGER_TIMEOUT_MS";

#[derive(Clone, Deserialize)]
pub struct ReceiptVerifierConfig {
    /// App-specific shared secret sent as the `password` of each request.
    pub shared_secret: String,

    /// Bundle identifier that verified receipts must belong to.
    pub bundle_id: String,

    /// Endpoint every receipt is sent to first.
    #[serde(default = "default_verify_url")]
    pub verify_url: String,

    /// Endpoint used for the single retry after a 21007 status. Follows
    /// `verify_url` when unset.
    #[serde(default)]
    pub retry_url: Option<String>,

    #[serde(default)]
    pub transaction_ordering: TransactionOrdering,

    /// Timeout for each verifyReceipt callout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Timeout for each ledger read or write.
    #[serde(default = "default_ledger_timeout_ms")]
    pub ledger_timeout_ms: u64,
}

fn default_verify_url() -> String {
    SANDBOX_VERIFY_RECEIPT_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_ledger_timeout_ms() -> u64 {
    DEFAULT_LEDGER_TIMEOUT_MS
}

impl ReceiptVerifierConfig {
    pub fn new(shared_secret: impl Into<String>, bundle_id: impl Into<String>) -> Self {
        Self {
            shared_secret: shared_secret.into(),
            bundle_id: bundle_id.into(),
            verify_url: default_verify_url(),
            retry_url: None,
            transaction_ordering: TransactionOrdering::default(),
            request_timeout_ms: default_request_timeout_ms(),
            ledger_timeout_ms: default_ledger_timeout_ms(),
        }
    }

    /// Loads the configuration from the process environment, after applying
    /// a `.env` file from the working directory if one exists.
    pub fn from_env() -> Result<Self, ReceiptVerificationError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("no .env file loaded: {}", e);
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ReceiptVerificationError> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| {
                ReceiptVerificationError::Config(format!("{key} environment variable is required"))
            })
        };
        let parse_ms = |key: &str, default: u64| match lookup(key) {
            Some(value) => value.trim().parse::<u64>().map_err(|e| {
                ReceiptVerificationError::Config(format!("{key} must be an integer; {e}"))
            }),
            None => Ok(default),
        };

        let mut config = Self::new(required(ENV_SHARED_SECRET)?, required(ENV_BUNDLE_ID)?);
        if let Some(verify_url) = lookup(ENV_VERIFY_URL) {
            config.verify_url = verify_url;
        }
        config.retry_url = lookup(ENV_RETRY_URL);
        if let Some(ordering) = lookup(ENV_TRANSACTION_ORDERING) {
            config.transaction_ordering = ordering
                .parse()
                .map_err(ReceiptVerificationError::Config)?;
        }
        config.request_timeout_ms = parse_ms(ENV_REQUEST_TIMEOUT_MS, config.request_timeout_ms)?;
        config.ledger_timeout_ms = parse_ms(ENV_LEDGER_TIMEOUT_MS, config.ledger_timeout_ms)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReceiptVerificationError> {
        if self.shared_secret.trim().is_empty() {
            return Err(ReceiptVerificationError::Config(
                "shared secret must not be empty".to_string(),
            ));
        }
        if self.bundle_id.trim().is_empty() {
            return Err(ReceiptVerificationError::Config(
                "bundle id must not be empty".to_string(),
            ));
        }
        for url in [self.verify_url.as_str(), self.effective_retry_url()] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ReceiptVerificationError::Config(format!(
                    "verification URL must start with http:// or https://: {url}"
                )));
            }
        }
        if self.request_timeout_ms == 0 || self.ledger_timeout_ms == 0 {
            return Err(ReceiptVerificationError::Config(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Endpoint the 21007 retry is sent to.
    pub fn effective_retry_url(&self) -> &str {
        self.retry_url.as_deref().unwrap_or(&self.verify_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_timeout_ms)
    }
}

impl fmt::Debug for ReceiptVerifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiptVerifierConfig")
            .field("shared_secret", &"<redacted>")
            .field("bundle_id", &self.bundle_id)
            .field("verify_url", &self.verify_url)
            .field("retry_url", &self.retry_url)
            .field("transaction_ordering", &self.transaction_ordering)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("ledger_timeout_ms", &self.ledger_timeout_ms)
            .finish()
    }
}
