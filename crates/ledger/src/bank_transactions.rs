//! Raw bank-feed transactions.
//!
//! A [`BankTransaction`] is what a bank sync (or the manual-entry path)
//! drops into the review queue: a dated, signed amount from some source,
//! waiting for a bookkeeper to accept it into the general ledger or exclude
//! it. Rows are never destroyed; they only move between `pending`,
//! `accepted`, and `excluded`.
//!
//! `lock_version` backs the optimistic concurrency guard: every status flip
//! is a conditional update on (id, lock_version), so two concurrent accepts
//! cannot both win.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, MoneyCents, util::parse_optional_uuid, util::parse_uuid};

/// Reserved source reference for transactions not backed by any bank feed.
pub const MANUAL_SOURCE: &str = "manual";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankTransactionStatus {
    Pending,
    Accepted,
    Excluded,
}

impl BankTransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Excluded => "excluded",
        }
    }
}

impl TryFrom<&str> for BankTransactionStatus {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "excluded" => Ok(Self::Excluded),
            other => Err(LedgerError::Validation(format!(
                "invalid bank transaction status: {other}"
            ))),
        }
    }
}

/// Direction of a manually keyed transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualKind {
    /// Funds into the bank account; stored with a positive amount.
    Deposit,
    /// Funds out of the bank account; stored with a negative amount.
    Payment,
}

#[derive(Clone, Debug)]
pub struct BankTransaction {
    pub id: Uuid,
    pub business_id: String,
    pub date: NaiveDate,
    pub description: String,
    /// Signed: positive = funds entered the bank account, negative = funds
    /// left it.
    pub amount: MoneyCents,
    /// Opaque external bank-account reference, or [`MANUAL_SOURCE`].
    pub source: String,
    /// Feed-side row id, used to skip re-delivered rows.
    pub external_id: Option<String>,
    pub status: BankTransactionStatus,
    pub accepted_account_id: Option<Uuid>,
    pub accepted_gl_account_id: Option<Uuid>,
    pub class_id: Option<String>,
    pub vendor_id: Option<String>,
    pub exclusion_reason: Option<String>,
    pub journal_entry_id: Option<Uuid>,
    pub lock_version: i64,
    pub created_at: DateTime<Utc>,
}

impl BankTransaction {
    pub fn new(
        business_id: String,
        date: NaiveDate,
        description: String,
        amount: MoneyCents,
        source: String,
        external_id: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            business_id,
            date,
            description,
            amount,
            source,
            external_id,
            status: BankTransactionStatus::Pending,
            accepted_account_id: None,
            accepted_gl_account_id: None,
            class_id: None,
            vendor_id: None,
            exclusion_reason: None,
            journal_entry_id: None,
            lock_version: 0,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bank_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub business_id: String,
    pub date: Date,
    pub description: String,
    pub amount: i64,
    pub source: String,
    pub external_id: Option<String>,
    pub status: String,
    pub accepted_account_id: Option<String>,
    pub accepted_gl_account_id: Option<String>,
    pub class_id: Option<String>,
    pub vendor_id: Option<String>,
    pub exclusion_reason: Option<String>,
    pub journal_entry_id: Option<String>,
    pub lock_version: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::businesses::Entity",
        from = "Column::BusinessId",
        to = "super::businesses::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Businesses,
    #[sea_orm(
        belongs_to = "super::journal_entries::Entity",
        from = "Column::JournalEntryId",
        to = "super::journal_entries::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    JournalEntries,
}

impl Related<super::businesses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Businesses.def()
    }
}

impl Related<super::journal_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BankTransaction> for ActiveModel {
    fn from(value: &BankTransaction) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            business_id: ActiveValue::Set(value.business_id.clone()),
            date: ActiveValue::Set(value.date),
            description: ActiveValue::Set(value.description.clone()),
            amount: ActiveValue::Set(value.amount.cents()),
            source: ActiveValue::Set(value.source.clone()),
            external_id: ActiveValue::Set(value.external_id.clone()),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            accepted_account_id: ActiveValue::Set(
                value.accepted_account_id.map(|id| id.to_string()),
            ),
            accepted_gl_account_id: ActiveValue::Set(
                value.accepted_gl_account_id.map(|id| id.to_string()),
            ),
            class_id: ActiveValue::Set(value.class_id.clone()),
            vendor_id: ActiveValue::Set(value.vendor_id.clone()),
            exclusion_reason: ActiveValue::Set(value.exclusion_reason.clone()),
            journal_entry_id: ActiveValue::Set(value.journal_entry_id.map(|id| id.to_string())),
            lock_version: ActiveValue::Set(value.lock_version),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for BankTransaction {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "bank transaction")?,
            business_id: model.business_id,
            date: model.date,
            description: model.description,
            amount: MoneyCents::new(model.amount),
            source: model.source,
            external_id: model.external_id,
            status: BankTransactionStatus::try_from(model.status.as_str())?,
            accepted_account_id: parse_optional_uuid(
                model.accepted_account_id.as_deref(),
                "account",
            )?,
            accepted_gl_account_id: parse_optional_uuid(
                model.accepted_gl_account_id.as_deref(),
                "account",
            )?,
            class_id: model.class_id,
            vendor_id: model.vendor_id,
            exclusion_reason: model.exclusion_reason,
            journal_entry_id: parse_optional_uuid(
                model.journal_entry_id.as_deref(),
                "journal entry",
            )?,
            lock_version: model.lock_version,
            created_at: model.created_at,
        })
    }
}
