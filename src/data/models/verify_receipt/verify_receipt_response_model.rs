#![allow(dead_code)]

use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use super::common::Environment;

type TimestampMillis = i64;

/// Response body returned by the verifyReceipt endpoint.
///
/// https://developer.apple.com/documentation/appstorereceipts/responsebody
///
/// Every field is treated as optional: the endpoint omits most of them when
/// the status is non-zero.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyReceiptResponseModel {
    /// Either 0 if the receipt is valid, or a status code if there is an
    /// error.
    #[serde(default)]
    pub(crate) status: Option<i64>,
    /// The environment for which the receipt was generated.
    #[serde(default)]
    pub(crate) environment: Option<Environment>,
    /// A JSON representation of the receipt that was sent for verification.
    #[serde(default)]
    pub(crate) receipt: Option<ReceiptModel>,
    /// An array that contains all in-app purchase transactions, for receipts
    /// containing auto-renewable subscriptions.
    #[serde(default)]
    pub(crate) latest_receipt_info: Vec<InAppPurchaseModel>,
    /// The latest Base64-encoded app receipt, for receipts containing
    /// auto-renewable subscriptions.
    #[serde(default)]
    pub(crate) latest_receipt: Option<String>,
    /// Pending renewal information for each auto-renewable subscription.
    #[serde(default)]
    pub(crate) pending_renewal_info: Vec<PendingRenewalInfoModel>,
}

/// https://developer.apple.com/documentation/appstorereceipts/responsebody/receipt
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReceiptModel {
    #[serde(default)]
    pub(crate) receipt_type: Option<String>,
    #[serde(default)]
    pub(crate) adam_id: Option<i64>,
    #[serde(default)]
    pub(crate) app_item_id: Option<i64>,
    /// The bundle identifier for the app to which the receipt belongs.
    #[serde(default)]
    pub(crate) bundle_id: Option<String>,
    #[serde(default)]
    pub(crate) application_version: Option<String>,
    #[serde(default)]
    pub(crate) download_id: Option<i64>,
    #[serde(default)]
    pub(crate) version_external_identifier: Option<i64>,
    #[serde(default)]
    pub(crate) receipt_creation_date: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub(crate) receipt_creation_date_ms: Option<TimestampMillis>,
    #[serde(default)]
    pub(crate) request_date: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub(crate) request_date_ms: Option<TimestampMillis>,
    #[serde(default)]
    pub(crate) original_purchase_date: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub(crate) original_purchase_date_ms: Option<TimestampMillis>,
    #[serde(default)]
    pub(crate) original_application_version: Option<String>,
    /// The in-app purchase receipt fields for all in-app purchase
    /// transactions.
    #[serde(default)]
    pub(crate) in_app: Vec<InAppPurchaseModel>,
}

/// https://developer.apple.com/documentation/appstorereceipts/responsebody/receipt/in_app
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct InAppPurchaseModel {
    /// The number of consumable products purchased.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub(crate) quantity: Option<i64>,
    /// The unique identifier of the product purchased.
    #[serde(default)]
    pub(crate) product_id: Option<String>,
    /// A unique identifier for a transaction such as a purchase, restore, or
    /// renewal.
    #[serde(default)]
    pub(crate) transaction_id: Option<String>,
    /// The transaction identifier of the original purchase.
    #[serde(default)]
    pub(crate) original_transaction_id: Option<String>,
    #[serde(default)]
    pub(crate) purchase_date: Option<String>,
    /// The time the App Store charged the user's account, in UNIX epoch time
    /// milliseconds.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub(crate) purchase_date_ms: Option<TimestampMillis>,
    #[serde(default)]
    pub(crate) original_purchase_date: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub(crate) original_purchase_date_ms: Option<TimestampMillis>,
    /// The time a subscription expires or when it will renew, in a date-time
    /// format similar to ISO 8601.
    #[serde(default)]
    pub(crate) expires_date: Option<String>,
    /// The same expiration time, in UNIX epoch time milliseconds.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub(crate) expires_date_ms: Option<TimestampMillis>,
    #[serde(default)]
    pub(crate) web_order_line_item_id: Option<String>,
    #[serde(default)]
    pub(crate) is_trial_period: Option<String>,
    #[serde(default)]
    pub(crate) is_in_intro_offer_period: Option<String>,
}

/// https://developer.apple.com/documentation/appstorereceipts/responsebody/pending_renewal_info
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PendingRenewalInfoModel {
    #[serde(default)]
    pub(crate) expiration_intent: Option<String>,
    #[serde(default)]
    pub(crate) auto_renew_product_id: Option<String>,
    #[serde(default)]
    pub(crate) original_transaction_id: Option<String>,
    #[serde(default)]
    pub(crate) is_in_billing_retry_period: Option<String>,
    #[serde(default)]
    pub(crate) product_id: Option<String>,
    #[serde(default)]
    pub(crate) auto_renew_status: Option<String>,
}
