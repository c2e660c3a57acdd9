use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::{
    config::ReceiptVerifierConfig,
    data::{
        datasources::{
            redemption_ledger_datasource::RedemptionLedgerDatasource,
            verify_receipt_datasource::VerifyReceiptDatasourceImpl,
        },
        repositories::receipt_repository_impl::ReceiptRepositoryImpl,
    },
    domain::{
        entities::{
            ledger_entry::LedgerEntry, purchase_record::PurchaseRecord,
            verification_verdict::VerificationVerdict,
        },
        repositories::receipt_repository::ReceiptRepository,
    },
    errors::ReceiptVerificationError,
};

pub struct ReceiptVerifierUtil<R: ReceiptRepository> {
    receipt_repository: R,
}

impl<R: ReceiptRepository> ReceiptVerifierUtil<R> {
    /// Verifies a receipt and redeems its most recent transaction for
    /// `user_id`.
    ///
    /// Every failure is folded into a 400 verdict; this never returns an
    /// error.
    pub async fn verify_receipt(&self, user_id: &str, receipt_data: &str) -> VerificationVerdict {
        match self.verify_and_redeem(user_id, receipt_data).await {
            Ok(record) => {
                info!(
                    user_id,
                    transaction_id = %record.transaction_id,
                    "receipt verified and redeemed"
                );
                VerificationVerdict::success()
            }
            Err(e) => {
                Self::log_failure(user_id, &e);
                VerificationVerdict::from(&e)
            }
        }
    }

    /// Same as `verify_receipt`, but gives up with a 400 verdict once
    /// `timeout` has elapsed.
    ///
    /// Ledger writes are atomic, so abandoning the call at any point never
    /// leaves a partial ledger entry.
    pub async fn verify_receipt_with_timeout(
        &self,
        user_id: &str,
        receipt_data: &str,
        timeout: Duration,
    ) -> VerificationVerdict {
        match tokio::time::timeout(timeout, self.verify_receipt(user_id, receipt_data)).await {
            Ok(verdict) => verdict,
            Err(_) => {
                let e = ReceiptVerificationError::DeadlineExceeded(timeout);
                Self::log_failure(user_id, &e);
                VerificationVerdict::from(&e)
            }
        }
    }

    /// `verify_receipt`, serialized as `{"code": int, "message": string}`.
    pub async fn verify_receipt_json(&self, user_id: &str, receipt_data: &str) -> String {
        self.verify_receipt(user_id, receipt_data).await.to_json()
    }

    pub async fn get_redemption(
        &self,
        user_id: &str,
    ) -> Result<Option<LedgerEntry>, ReceiptVerificationError> {
        self.receipt_repository.get_redemption(user_id).await
    }

    async fn verify_and_redeem(
        &self,
        user_id: &str,
        receipt_data: &str,
    ) -> Result<PurchaseRecord, ReceiptVerificationError> {
        let receipt = self.receipt_repository.verify_receipt(receipt_data).await?;
        let record = receipt.latest_transaction;

        if !self
            .receipt_repository
            .redeem_transaction(user_id, &record.transaction_id)
            .await?
        {
            return Err(ReceiptVerificationError::AlreadyRedeemed {
                user_id: user_id.to_owned(),
                transaction_id: record.transaction_id,
            });
        }

        // The expiry check runs after the ledger write: a novel but expired
        // transaction still consumes its redemption.
        if !record.is_active_at(Utc::now()) {
            return Err(ReceiptVerificationError::ReceiptExpired {
                transaction_id: record.transaction_id,
                expires_date: record.expires_date,
            });
        }
        Ok(record)
    }

    fn log_failure(user_id: &str, e: &ReceiptVerificationError) {
        if e.is_fatal() {
            warn!(user_id, kind = ?e.kind(), "receipt verification aborted: {}", e);
        } else {
            info!(user_id, kind = ?e.kind(), "receipt verification failed: {}", e);
        }
    }
}

impl<L: RedemptionLedgerDatasource>
    ReceiptVerifierUtil<ReceiptRepositoryImpl<VerifyReceiptDatasourceImpl, L>>
{
    pub fn new(
        config: &ReceiptVerifierConfig,
        redemption_ledger_datasource: L,
    ) -> Result<Self, ReceiptVerificationError> {
        config.validate()?;
        Ok(Self {
            receipt_repository: ReceiptRepositoryImpl::new(config, redemption_ledger_datasource)?,
        })
    }
}
