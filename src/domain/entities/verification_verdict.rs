use serde::{Deserialize, Serialize};

use crate::errors::{ErrorKind, ReceiptVerificationError};

pub const VERDICT_CODE_SUCCESS: u16 = 200;
pub const VERDICT_CODE_FAILURE: u16 = 400;

pub const MESSAGE_VERIFICATION_FAILED: &str = "Failed to verify receipt";
pub const MESSAGE_ALREADY_REDEEMED: &str = "This receipt is already redeemed";
pub const MESSAGE_OUT_OF_DATE: &str = "This receipt is out of date";

/// Result of one verification call, returned to the caller as
/// `{"code": int, "message": string}`. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub code: u16,
    pub message: String,
}

impl VerificationVerdict {
    pub fn success() -> Self {
        Self {
            code: VERDICT_CODE_SUCCESS,
            message: String::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            code: VERDICT_CODE_FAILURE,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == VERDICT_CODE_SUCCESS
    }

    pub fn to_json(&self) -> String {
        // Two plain fields; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"message":""}}"#, self.code)
        })
    }
}

impl From<&ReceiptVerificationError> for VerificationVerdict {
    fn from(error: &ReceiptVerificationError) -> Self {
        match error.kind() {
            ErrorKind::DuplicateRedemption => Self::failure(MESSAGE_ALREADY_REDEEMED),
            ErrorKind::ExpiredReceipt => Self::failure(MESSAGE_OUT_OF_DATE),
            ErrorKind::Transport | ErrorKind::Validation | ErrorKind::Store | ErrorKind::Config => {
                Self::failure(MESSAGE_VERIFICATION_FAILED)
            }
        }
    }
}
