//! The module contains the errors the ledger can throw.
//!
//! Every mutating operation returns a typed error instead of coercing bad
//! input: an unbalanced entry is never auto-balanced with a plug line, a
//! duplicate account code is never silently renamed, and a lost concurrent
//! update surfaces as [`ConcurrencyConflict`] rather than a double-post.
//!
//! [`ConcurrencyConflict`]: LedgerError::ConcurrencyConflict

use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::MoneyCents;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unbalanced entry: debits {total_debit} != credits {total_credit}")]
    UnbalancedEntry {
        total_debit: MoneyCents,
        total_credit: MoneyCents,
    },
    #[error("account code \"{code}\" already used by an active account")]
    DuplicateCode { code: String },
    #[error("account {account_id} has posted activity (balance {balance})")]
    HasDependentActivity {
        account_id: Uuid,
        balance: MoneyCents,
    },
    #[error("no bank account link for source \"{source}\"")]
    UnlinkedBankSource { source: String },
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("\"{0}\" not found")]
    NotFound(String),
    #[error("concurrent update lost: {0}")]
    ConcurrencyConflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (
                Self::UnbalancedEntry {
                    total_debit: da,
                    total_credit: ca,
                },
                Self::UnbalancedEntry {
                    total_debit: db,
                    total_credit: cb,
                },
            ) => da == db && ca == cb,
            (Self::DuplicateCode { code: a }, Self::DuplicateCode { code: b }) => a == b,
            (
                Self::HasDependentActivity {
                    account_id: ia,
                    balance: ba,
                },
                Self::HasDependentActivity {
                    account_id: ib,
                    balance: bb,
                },
            ) => ia == ib && ba == bb,
            (Self::UnlinkedBankSource { source: a }, Self::UnlinkedBankSource { source: b }) => {
                a == b
            }
            (Self::InvalidState(a), Self::InvalidState(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::ConcurrencyConflict(a), Self::ConcurrencyConflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
