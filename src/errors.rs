use std::time::Duration;

use thiserror::Error;

/// Errors produced while verifying and redeeming a receipt.
///
/// None of these escape `ReceiptVerifierUtil::verify_receipt`; they are
/// logged and folded into a `VerificationVerdict`.
#[derive(Debug, Error)]
pub enum ReceiptVerificationError {
    #[error("verifyReceipt callout to {url} failed to send")]
    CalloutFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("verifyReceipt callout to {url} returned HTTP {status}: {body}")]
    CalloutStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[error("failed to parse verifyReceipt response from {url}: {details}")]
    InvalidResponse { url: String, details: String },

    #[error("receipt rejected by verifyReceipt with status {0}")]
    ReceiptRejected(i64),

    #[error("verifyReceipt response did not contain a status")]
    MissingStatus,

    #[error("receipt bundle id {actual:?} does not match expected {expected:?}")]
    BundleIdMismatch {
        expected: String,
        actual: Option<String>,
    },

    #[error("receipt contains no purchase records")]
    NoPurchaseRecords,

    #[error("transaction {transaction_id} was already redeemed by user {user_id}")]
    AlreadyRedeemed {
        user_id: String,
        transaction_id: String,
    },

    #[error("transaction {transaction_id} is out of date (expires_date: {expires_date:?})")]
    ReceiptExpired {
        transaction_id: String,
        expires_date: Option<String>,
    },

    #[error("redemption ledger error: {0}")]
    Ledger(String),

    #[error("redemption ledger did not respond within {0:?}")]
    LedgerTimeout(Duration),

    #[error("verification did not complete within {0:?}")]
    DeadlineExceeded(Duration),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Coarse classification of a `ReceiptVerificationError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The verification endpoint could not be reached or answered with
    /// something other than a verifyReceipt response.
    Transport,
    /// The endpoint answered, but the receipt is not acceptable.
    Validation,
    /// The selected transaction is already recorded for the user.
    DuplicateRedemption,
    /// The selected transaction has expired. The ledger has been updated.
    ExpiredReceipt,
    /// The redemption ledger could not be read or written.
    Store,
    Config,
}

impl ReceiptVerificationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CalloutFailed { .. }
            | Self::CalloutStatus { .. }
            | Self::InvalidResponse { .. }
            | Self::DeadlineExceeded(_) => ErrorKind::Transport,
            Self::ReceiptRejected(_)
            | Self::MissingStatus
            | Self::BundleIdMismatch { .. }
            | Self::NoPurchaseRecords => ErrorKind::Validation,
            Self::AlreadyRedeemed { .. } => ErrorKind::DuplicateRedemption,
            Self::ReceiptExpired { .. } => ErrorKind::ExpiredReceipt,
            Self::Ledger(_) | Self::LedgerTimeout(_) => ErrorKind::Store,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Fatal errors abort the pipeline for reasons unrelated to the receipt
    /// itself (network, storage, deadlines).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Transport | ErrorKind::Store | ErrorKind::Config
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ReceiptVerificationError::ReceiptRejected(21003).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ReceiptVerificationError::NoPurchaseRecords.kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ReceiptVerificationError::AlreadyRedeemed {
                user_id: "u".to_string(),
                transaction_id: "1".to_string(),
            }
            .kind(),
            ErrorKind::DuplicateRedemption
        );
        assert_eq!(
            ReceiptVerificationError::LedgerTimeout(Duration::from_secs(1)).kind(),
            ErrorKind::Store
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(ReceiptVerificationError::Ledger("down".to_string()).is_fatal());
        assert!(ReceiptVerificationError::DeadlineExceeded(Duration::from_secs(1)).is_fatal());
        assert!(!ReceiptVerificationError::ReceiptRejected(21002).is_fatal());
        assert!(!ReceiptVerificationError::ReceiptExpired {
            transaction_id: "1".to_string(),
            expires_date: None,
        }
        .is_fatal());
    }
}
