use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    constants::STATUS_SANDBOX_RECEIPT_ON_PRODUCTION,
    data::models::verify_receipt::{
        verify_receipt_request_model::VerifyReceiptRequestModel,
        verify_receipt_response_model::VerifyReceiptResponseModel,
    },
    errors::ReceiptVerificationError,
};

#[async_trait]
pub trait VerifyReceiptDatasource: Send + Sync {
    /// Verify Receipt:
    /// https://developer.apple.com/documentation/appstorereceipts/verifyreceipt
    ///
    /// request:
    ///   The receipt payload and shared secret. The same payload is reused
    ///   for the retry.
    async fn verify_receipt(
        &self,
        request: &VerifyReceiptRequestModel,
    ) -> Result<VerifyReceiptResponseModel, ReceiptVerificationError>;
}

pub struct VerifyReceiptDatasourceImpl {
    client: reqwest::Client,
    verify_url: String,
    retry_url: String,
}

#[async_trait]
impl VerifyReceiptDatasource for VerifyReceiptDatasourceImpl {
    async fn verify_receipt(
        &self,
        request: &VerifyReceiptRequestModel,
    ) -> Result<VerifyReceiptResponseModel, ReceiptVerificationError> {
        // Receipts are always checked against the sandbox first, even in
        // production builds. A 21007 status is answered with exactly one
        // retry; transport failures are never retried.
        let response = self.callout(&self.verify_url, request).await?;
        if response.status == Some(STATUS_SANDBOX_RECEIPT_ON_PRODUCTION) {
            info!(
                retry_url = %self.retry_url,
                "verifyReceipt returned status 21007, retrying once"
            );
            return self.callout(&self.retry_url, request).await;
        }
        Ok(response)
    }
}

impl VerifyReceiptDatasourceImpl {
    pub(crate) fn new(
        verify_url: &str,
        retry_url: &str,
        request_timeout: Duration,
    ) -> Result<Self, ReceiptVerificationError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| {
                ReceiptVerificationError::Config(format!("failed to build HTTP client; {e:?}"))
            })?;
        Ok(Self {
            client,
            verify_url: verify_url.to_owned(),
            retry_url: retry_url.to_owned(),
        })
    }

    async fn callout(
        &self,
        url: &str,
        request: &VerifyReceiptRequestModel,
    ) -> Result<VerifyReceiptResponseModel, ReceiptVerificationError> {
        debug!(url, "sending verifyReceipt callout");
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| ReceiptVerificationError::CalloutFailed {
                url: url.to_owned(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(ReceiptVerificationError::CalloutStatus {
                url: url.to_owned(),
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ReceiptVerificationError::CalloutFailed {
                url: url.to_owned(),
                source: e,
            })?;
        let parsed: VerifyReceiptResponseModel =
            serde_json::from_str(&body).map_err(|e| ReceiptVerificationError::InvalidResponse {
                url: url.to_owned(),
                details: e.to_string(),
            })?;
        debug!(url, status = ?parsed.status, "verifyReceipt callout completed");
        Ok(parsed)
    }
}
