//! Double-entry general ledger engine for the farm bookkeeping platform.
//!
//! The crate turns raw bank-feed rows, point-of-sale activity, and manual
//! entries into balanced journal entries and derives financial statements
//! from them. Four concerns make up the core:
//!
//! - the chart of accounts (classification drives every sign convention)
//! - the journal entry store (zero-sum posting, void-not-delete reversal)
//! - the balance/report engine (always recomputed from posted lines)
//! - the acceptance workflow (pending → accepted/excluded raw transactions)
//!
//! Everything monetary is integer cents ([`MoneyCents`]); every mutation runs
//! inside one database transaction via [`Ledger`]'s operations.

pub use account_revisions::AccountRevision;
pub use accounts::{Account, AccountType, NormalBalance};
pub use bank_account_links::BankAccountLink;
pub use bank_transactions::{
    BankTransaction, BankTransactionStatus, MANUAL_SOURCE, ManualKind,
};
pub use businesses::Business;
pub use commands::{
    AcceptCmd, BackfillEntry, BackfillLine, BankFeedRow, ChartImportRow, CreateAccountCmd,
    ImportSummary, LineInput, ManualTransactionCmd, PostEntryCmd, Reclassification, SkippedRow,
    UpdateAccountCmd,
};
pub use error::LedgerError;
pub use journal_entries::{EntryStatus, JournalEntry, SourceType};
pub use journal_entry_lines::JournalEntryLine;
pub use money::MoneyCents;
pub use ops::{EntryListFilter, Ledger, LedgerBuilder, TransactionListFilter};
pub use reports::{AccountBalanceLine, BalanceSheet, IncomeStatement, ReportWarning};

mod account_revisions;
mod accounts;
mod bank_account_links;
mod bank_transactions;
mod businesses;
mod commands;
mod error;
mod journal_entries;
mod journal_entry_lines;
mod money;
mod ops;
mod reports;
mod util;

type ResultLedger<T> = Result<T, LedgerError>;
