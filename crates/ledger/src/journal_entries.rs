//! Journal entry headers.
//!
//! A [`JournalEntry`] is a balanced set of debit/credit postings representing
//! one business event. The header carries the lifecycle status and the shared
//! metadata; the individual postings live in
//! [`journal_entry_lines`](crate::journal_entry_lines).
//!
//! Lifecycle: draft → posted → void (terminal), and posted → void directly.
//! Nothing else. Voiding keeps every row for audit; lines of a void entry are
//! simply excluded from aggregation by the status filter.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    LedgerError, MoneyCents, journal_entry_lines::JournalEntryLine, util::parse_uuid,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Draft,
    Posted,
    Void,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Posted => "posted",
            Self::Void => "void",
        }
    }
}

impl TryFrom<&str> for EntryStatus {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "draft" => Ok(Self::Draft),
            "posted" => Ok(Self::Posted),
            "void" => Ok(Self::Void),
            other => Err(LedgerError::Validation(format!(
                "invalid entry status: {other}"
            ))),
        }
    }
}

/// Where a journal entry originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Manual,
    BankImport,
    Pos,
    System,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::BankImport => "bank_import",
            Self::Pos => "pos",
            Self::System => "system",
        }
    }
}

impl TryFrom<&str> for SourceType {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "manual" => Ok(Self::Manual),
            "bank_import" => Ok(Self::BankImport),
            "pos" => Ok(Self::Pos),
            "system" => Ok(Self::System),
            other => Err(LedgerError::Validation(format!(
                "invalid source type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct JournalEntry {
    pub id: Uuid,
    pub business_id: String,
    /// Monotonic display number, assigned per business at posting time.
    pub entry_number: i64,
    pub entry_date: NaiveDate,
    pub status: EntryStatus,
    pub source_type: SourceType,
    pub description: String,
    /// For a posted entry this equals both Σline.debit and Σline.credit.
    pub total_debit: MoneyCents,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub voided_at: Option<DateTime<Utc>>,
    pub lines: Vec<JournalEntryLine>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "journal_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub business_id: String,
    pub entry_number: i64,
    pub entry_date: Date,
    pub status: String,
    pub source_type: String,
    pub description: String,
    pub total_debit: i64,
    pub idempotency_key: Option<String>,
    pub created_at: DateTimeUtc,
    pub voided_at: Option<DateTimeUtc>,
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
    #[sea_orm(has_many = "super::journal_entry_lines::Entity")]
    Lines,
}

impl Related<super::businesses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Businesses.def()
    }
}

impl Related<super::journal_entry_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&JournalEntry> for ActiveModel {
    fn from(value: &JournalEntry) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            business_id: ActiveValue::Set(value.business_id.clone()),
            entry_number: ActiveValue::Set(value.entry_number),
            entry_date: ActiveValue::Set(value.entry_date),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            source_type: ActiveValue::Set(value.source_type.as_str().to_string()),
            description: ActiveValue::Set(value.description.clone()),
            total_debit: ActiveValue::Set(value.total_debit.cents()),
            idempotency_key: ActiveValue::Set(value.idempotency_key.clone()),
            created_at: ActiveValue::Set(value.created_at),
            voided_at: ActiveValue::Set(value.voided_at),
        }
    }
}

impl TryFrom<Model> for JournalEntry {
    type Error = LedgerError;

    /// Maps a header row into the domain type. Lines are loaded separately by
    /// the callers that need them.
    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "journal entry")?,
            business_id: model.business_id,
            entry_number: model.entry_number,
            entry_date: model.entry_date,
            status: EntryStatus::try_from(model.status.as_str())?,
            source_type: SourceType::try_from(model.source_type.as_str())?,
            description: model.description,
            total_debit: MoneyCents::new(model.total_debit),
            idempotency_key: model.idempotency_key,
            created_at: model.created_at,
            voided_at: model.voided_at,
            lines: Vec::new(),
        })
    }
}
