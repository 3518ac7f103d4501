//! Command structs for ledger operations.
//!
//! These types group parameters for write operations (account management,
//! posting, acceptance, imports), keeping call sites readable and avoiding
//! long argument lists.
//!
//! The import row types double as the typed ingestion boundary: whatever
//! shape an external importer delivers gets mapped into these once, and the
//! rest of the engine only ever sees canonical lines.

use chrono::NaiveDate;

use uuid::Uuid;

use crate::{
    MoneyCents,
    accounts::AccountType,
    bank_transactions::ManualKind,
    journal_entries::SourceType,
};

/// Create a chart-of-accounts account.
#[derive(Clone, Debug)]
pub struct CreateAccountCmd {
    pub business_id: String,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub subtype: Option<String>,
}

impl CreateAccountCmd {
    #[must_use]
    pub fn new(
        business_id: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        Self {
            business_id: business_id.into(),
            code: code.into(),
            name: name.into(),
            account_type,
            subtype: None,
        }
    }

    #[must_use]
    pub fn subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }
}

/// Update an account's name/classification/activation.
#[derive(Clone, Debug)]
pub struct UpdateAccountCmd {
    pub business_id: String,
    pub account_id: Uuid,
    pub name: Option<String>,
    pub account_type: Option<AccountType>,
    pub subtype: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateAccountCmd {
    #[must_use]
    pub fn new(business_id: impl Into<String>, account_id: Uuid) -> Self {
        Self {
            business_id: business_id.into(),
            account_id,
            name: None,
            account_type: None,
            subtype: None,
            is_active: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = Some(account_type);
        self
    }

    #[must_use]
    pub fn subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    #[must_use]
    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }
}

/// One row of a bulk reclassification mapping, keyed by account code.
#[derive(Clone, Debug)]
pub struct Reclassification {
    pub account_code: String,
    pub new_type: AccountType,
    pub new_subtype: Option<String>,
}

impl Reclassification {
    #[must_use]
    pub fn new(account_code: impl Into<String>, new_type: AccountType) -> Self {
        Self {
            account_code: account_code.into(),
            new_type,
            new_subtype: None,
        }
    }

    #[must_use]
    pub fn new_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.new_subtype = Some(subtype.into());
        self
    }
}

/// One line of a journal entry to post: the account it hits plus exactly one
/// of debit/credit.
#[derive(Clone, Debug)]
pub struct LineInput {
    pub account_id: Uuid,
    pub debit: MoneyCents,
    pub credit: MoneyCents,
    pub class_id: Option<String>,
    pub vendor_id: Option<String>,
}

impl LineInput {
    #[must_use]
    pub fn debit(account_id: Uuid, amount: MoneyCents) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: MoneyCents::ZERO,
            class_id: None,
            vendor_id: None,
        }
    }

    #[must_use]
    pub fn credit(account_id: Uuid, amount: MoneyCents) -> Self {
        Self {
            account_id,
            debit: MoneyCents::ZERO,
            credit: amount,
            class_id: None,
            vendor_id: None,
        }
    }

    #[must_use]
    pub fn class_id(mut self, class_id: impl Into<String>) -> Self {
        self.class_id = Some(class_id.into());
        self
    }

    #[must_use]
    pub fn vendor_id(mut self, vendor_id: impl Into<String>) -> Self {
        self.vendor_id = Some(vendor_id.into());
        self
    }
}

/// Create-and-post a balanced journal entry.
#[derive(Clone, Debug)]
pub struct PostEntryCmd {
    pub business_id: String,
    pub entry_date: NaiveDate,
    pub description: String,
    pub source_type: SourceType,
    pub lines: Vec<LineInput>,
    pub idempotency_key: Option<String>,
}

impl PostEntryCmd {
    #[must_use]
    pub fn new(
        business_id: impl Into<String>,
        entry_date: NaiveDate,
        description: impl Into<String>,
        source_type: SourceType,
        lines: Vec<LineInput>,
    ) -> Self {
        Self {
            business_id: business_id.into(),
            entry_date,
            description: description.into(),
            source_type,
            lines,
            idempotency_key: None,
        }
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Accept a pending bank transaction into a destination account.
#[derive(Clone, Debug)]
pub struct AcceptCmd {
    pub business_id: String,
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub class_id: Option<String>,
    pub vendor_id: Option<String>,
    pub description: Option<String>,
}

impl AcceptCmd {
    #[must_use]
    pub fn new(business_id: impl Into<String>, transaction_id: Uuid, account_id: Uuid) -> Self {
        Self {
            business_id: business_id.into(),
            transaction_id,
            account_id,
            class_id: None,
            vendor_id: None,
            description: None,
        }
    }

    #[must_use]
    pub fn class_id(mut self, class_id: impl Into<String>) -> Self {
        self.class_id = Some(class_id.into());
        self
    }

    #[must_use]
    pub fn vendor_id(mut self, vendor_id: impl Into<String>) -> Self {
        self.vendor_id = Some(vendor_id.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Inject a synthetic pending transaction not backed by any bank source.
#[derive(Clone, Debug)]
pub struct ManualTransactionCmd {
    pub business_id: String,
    pub date: NaiveDate,
    pub description: String,
    /// Magnitude; the sign is derived from `kind`.
    pub amount: MoneyCents,
    pub kind: ManualKind,
}

impl ManualTransactionCmd {
    #[must_use]
    pub fn new(
        business_id: impl Into<String>,
        date: NaiveDate,
        description: impl Into<String>,
        amount: MoneyCents,
        kind: ManualKind,
    ) -> Self {
        Self {
            business_id: business_id.into(),
            date,
            description: description.into(),
            amount,
            kind,
        }
    }
}

/// One chart-bootstrap row from an external importer.
#[derive(Clone, Debug)]
pub struct ChartImportRow {
    pub code: String,
    pub name: String,
    /// Free-text classification from the source system; mapped through a
    /// fixed hint table, unmapped hints bucket to expense/operating_expense.
    pub type_hint: String,
    pub opening_balance: MoneyCents,
}

/// One line of a historical backfill entry, keyed by account code.
#[derive(Clone, Debug)]
pub struct BackfillLine {
    pub account_code: String,
    pub debit: MoneyCents,
    pub credit: MoneyCents,
}

/// One logical historical entry to backfill; validated for balance before
/// posting.
#[derive(Clone, Debug)]
pub struct BackfillEntry {
    pub date: NaiveDate,
    pub description: String,
    pub lines: Vec<BackfillLine>,
}

/// One raw row delivered by a bank sync.
#[derive(Clone, Debug)]
pub struct BankFeedRow {
    /// Feed-side row id; re-delivered ids are skipped.
    pub external_id: String,
    /// Opaque external bank-account reference.
    pub source_ref: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount: MoneyCents,
}

/// Outcome of a per-row degrading import: what landed, what was skipped and
/// why, plus non-fatal warnings.
#[derive(Clone, Debug, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: Vec<SkippedRow>,
    pub warnings: Vec<String>,
}

/// A row the import dropped, with the error that disqualified it.
#[derive(Clone, Debug)]
pub struct SkippedRow {
    pub label: String,
    pub error: String,
}
