pub(crate) mod data {
    pub(crate) mod datasources {
        pub(crate) mod file_redemption_ledger_datasource;
        pub(crate) mod redemption_ledger_datasource;
        pub(crate) mod verify_receipt_datasource;
    }
    pub(crate) mod models {
        pub(crate) mod redemption_ledger {
            pub(crate) mod ledger_entry_model;
        }
        pub(crate) mod verify_receipt {
            pub(crate) mod common;
            pub(crate) mod verify_receipt_request_model;
            pub(crate) mod verify_receipt_response_model;
        }
    }
    pub(crate) mod repositories {
        pub(crate) mod receipt_repository_impl;
    }
}

pub mod domain {
    pub mod entities {
        pub mod ledger_entry;
        pub mod purchase_record;
        pub mod transaction_ordering;
        pub mod verification_verdict;
        pub mod verified_receipt;
    }
    pub mod repositories {
        pub mod receipt_repository;
    }
}

pub mod config;
pub mod constants;
pub mod errors;
pub mod util;

pub use data::{
    datasources::{
        file_redemption_ledger_datasource::FileRedemptionLedgerDatasource,
        redemption_ledger_datasource::{InMemoryRedemptionLedgerDatasource, RedemptionLedgerDatasource},
        verify_receipt_datasource::{VerifyReceiptDatasource, VerifyReceiptDatasourceImpl},
    },
    models::{
        redemption_ledger::ledger_entry_model::LedgerEntryModel,
        verify_receipt::{
            verify_receipt_request_model::VerifyReceiptRequestModel,
            verify_receipt_response_model::VerifyReceiptResponseModel,
        },
    },
    repositories::receipt_repository_impl::ReceiptRepositoryImpl,
};
