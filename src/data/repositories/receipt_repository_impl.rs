use std::{future::Future, time::Duration};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    config::ReceiptVerifierConfig,
    constants::STATUS_OK,
    data::{
        datasources::{
            redemption_ledger_datasource::RedemptionLedgerDatasource,
            verify_receipt_datasource::{VerifyReceiptDatasource, VerifyReceiptDatasourceImpl},
        },
        models::{
            redemption_ledger::ledger_entry_model::LedgerEntryModel,
            verify_receipt::{
                common::{millis_to_datetime, parse_receipt_date, Environment},
                verify_receipt_request_model::VerifyReceiptRequestModel,
                verify_receipt_response_model::{InAppPurchaseModel, VerifyReceiptResponseModel},
            },
        },
    },
    domain::{
        entities::{
            ledger_entry::LedgerEntry, purchase_record::PurchaseRecord,
            transaction_ordering::TransactionOrdering, verified_receipt::VerifiedReceipt,
        },
        repositories::receipt_repository::ReceiptRepository,
    },
    errors::ReceiptVerificationError,
};

pub struct ReceiptRepositoryImpl<A: VerifyReceiptDatasource, L: RedemptionLedgerDatasource> {
    verify_receipt_datasource: A,
    redemption_ledger_datasource: L,
    shared_secret: String,
    bundle_id: String,
    transaction_ordering: TransactionOrdering,
    ledger_timeout: Duration,
}

#[async_trait]
impl<A: VerifyReceiptDatasource, L: RedemptionLedgerDatasource> ReceiptRepository
    for ReceiptRepositoryImpl<A, L>
{
    async fn verify_receipt(
        &self,
        receipt_data: &str,
    ) -> Result<VerifiedReceipt, ReceiptVerificationError> {
        let request = VerifyReceiptRequestModel::new(receipt_data, &self.shared_secret);
        let response = self.verify_receipt_datasource.verify_receipt(&request).await?;
        VerifiedReceipt::from_verify_receipt_response(
            response,
            &self.bundle_id,
            self.transaction_ordering,
        )
    }

    async fn redeem_transaction(
        &self,
        user_id: &str,
        transaction_id: &str,
    ) -> Result<bool, ReceiptVerificationError> {
        self.with_ledger_timeout(
            self.redemption_ledger_datasource
                .compare_and_set(user_id, transaction_id),
        )
        .await
    }

    async fn get_redemption(
        &self,
        user_id: &str,
    ) -> Result<Option<LedgerEntry>, ReceiptVerificationError> {
        Ok(self
            .with_ledger_timeout(self.redemption_ledger_datasource.get(user_id))
            .await?
            .map(LedgerEntry::from))
    }
}

impl<L: RedemptionLedgerDatasource> ReceiptRepositoryImpl<VerifyReceiptDatasourceImpl, L> {
    pub(crate) fn new(
        config: &ReceiptVerifierConfig,
        redemption_ledger_datasource: L,
    ) -> Result<Self, ReceiptVerificationError> {
        Ok(Self::with_datasources(
            VerifyReceiptDatasourceImpl::new(
                &config.verify_url,
                config.effective_retry_url(),
                config.request_timeout(),
            )?,
            redemption_ledger_datasource,
            config,
        ))
    }
}

impl<A: VerifyReceiptDatasource, L: RedemptionLedgerDatasource> ReceiptRepositoryImpl<A, L> {
    pub(crate) fn with_datasources(
        verify_receipt_datasource: A,
        redemption_ledger_datasource: L,
        config: &ReceiptVerifierConfig,
    ) -> Self {
        Self {
            verify_receipt_datasource,
            redemption_ledger_datasource,
            shared_secret: config.shared_secret.clone(),
            bundle_id: config.bundle_id.clone(),
            transaction_ordering: config.transaction_ordering,
            ledger_timeout: config.ledger_timeout(),
        }
    }

    async fn with_ledger_timeout<T>(
        &self,
        operation: impl Future<Output = Result<T, ReceiptVerificationError>>,
    ) -> Result<T, ReceiptVerificationError> {
        tokio::time::timeout(self.ledger_timeout, operation)
            .await
            .map_err(|_| ReceiptVerificationError::LedgerTimeout(self.ledger_timeout))?
    }
}

impl VerifiedReceipt {
    fn from_verify_receipt_response(
        m: VerifyReceiptResponseModel,
        expected_bundle_id: &str,
        transaction_ordering: TransactionOrdering,
    ) -> Result<Self, ReceiptVerificationError> {
        match m.status {
            Some(STATUS_OK) => {}
            Some(status) => return Err(ReceiptVerificationError::ReceiptRejected(status)),
            None => return Err(ReceiptVerificationError::MissingStatus),
        }

        let receipt = m.receipt.unwrap_or_default();
        if receipt.bundle_id.as_deref() != Some(expected_bundle_id) {
            return Err(ReceiptVerificationError::BundleIdMismatch {
                expected: expected_bundle_id.to_owned(),
                actual: receipt.bundle_id,
            });
        }

        let records: Vec<PurchaseRecord> = receipt
            .in_app
            .into_iter()
            .filter_map(PurchaseRecord::from_in_app_purchase)
            .collect();
        let latest_transaction = transaction_ordering
            .select_latest(&records)
            .cloned()
            .ok_or(ReceiptVerificationError::NoPurchaseRecords)?;
        debug!(
            transaction_id = %latest_transaction.transaction_id,
            records = records.len(),
            ordering = %transaction_ordering,
            "selected latest transaction"
        );

        Ok(Self {
            bundle_id: expected_bundle_id.to_owned(),
            is_sandbox: m.environment == Some(Environment::Sandbox),
            latest_transaction,
            purchase_record_count: records.len(),
        })
    }
}

impl PurchaseRecord {
    /// Records without a transaction id cannot be de-duplicated and are
    /// skipped.
    fn from_in_app_purchase(m: InAppPurchaseModel) -> Option<Self> {
        let transaction_id = m.transaction_id.filter(|id| !id.is_empty())?;
        let expiration_time = match m.expires_date.as_deref().and_then(parse_receipt_date) {
            Some(parsed) => Some(parsed),
            None => {
                if m.expires_date.is_some() {
                    warn!(
                        transaction_id = %transaction_id,
                        expires_date = ?m.expires_date,
                        "unparsable expires_date, falling back to expires_date_ms"
                    );
                }
                m.expires_date_ms.and_then(millis_to_datetime)
            }
        };
        Some(Self {
            transaction_id,
            original_transaction_id: m.original_transaction_id,
            product_id: m.product_id,
            quantity: m.quantity,
            purchase_date: m.purchase_date_ms.and_then(millis_to_datetime),
            expires_date: m.expires_date,
            expiration_time,
        })
    }
}

impl From<LedgerEntryModel> for LedgerEntry {
    fn from(m: LedgerEntryModel) -> Self {
        Self {
            user_id: m.uid,
            last_transaction_id: m.transaction_id,
        }
    }
}
