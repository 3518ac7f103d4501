//! Journal entry lines.
//!
//! A [`JournalEntryLine`] is a single posting against one account as part of
//! a [`JournalEntry`](crate::JournalEntry). Amounts are stored as
//! non-negative integer cents on *either* the debit or the credit side:
//! exactly one side carries the economic amount of a well-formed line.
//!
//! Lines are immutable once their parent entry is posted; the only way to
//! remove their effect is voiding the parent.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, MoneyCents, ResultLedger, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryLine {
    pub id: Uuid,
    pub journal_entry_id: Uuid,
    pub account_id: Uuid,
    pub debit: MoneyCents,
    pub credit: MoneyCents,
    /// Reporting dimension: enterprise/class tag (e.g. "dairy", "produce").
    pub class_id: Option<String>,
    /// Reporting dimension: counterparty tag.
    pub vendor_id: Option<String>,
}

impl JournalEntryLine {
    pub fn debit(journal_entry_id: Uuid, account_id: Uuid, amount: MoneyCents) -> Self {
        Self {
            id: Uuid::new_v4(),
            journal_entry_id,
            account_id,
            debit: amount,
            credit: MoneyCents::ZERO,
            class_id: None,
            vendor_id: None,
        }
    }

    pub fn credit(journal_entry_id: Uuid, account_id: Uuid, amount: MoneyCents) -> Self {
        Self {
            id: Uuid::new_v4(),
            journal_entry_id,
            account_id,
            debit: MoneyCents::ZERO,
            credit: amount,
            class_id: None,
            vendor_id: None,
        }
    }

    #[must_use]
    pub fn with_dimensions(mut self, class_id: Option<String>, vendor_id: Option<String>) -> Self {
        self.class_id = class_id;
        self.vendor_id = vendor_id;
        self
    }

    /// Well-formedness: both sides non-negative, exactly one side non-zero.
    pub fn validate(&self) -> ResultLedger<()> {
        if self.debit.is_negative() || self.credit.is_negative() {
            return Err(LedgerError::Validation(format!(
                "line on account {} has a negative side",
                self.account_id
            )));
        }
        match (self.debit.is_zero(), self.credit.is_zero()) {
            (true, true) => Err(LedgerError::Validation(format!(
                "line on account {} carries no amount",
                self.account_id
            ))),
            (false, false) => Err(LedgerError::Validation(format!(
                "line on account {} carries both a debit and a credit",
                self.account_id
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "journal_entry_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub journal_entry_id: String,
    pub account_id: String,
    pub debit: i64,
    pub credit: i64,
    pub class_id: Option<String>,
    pub vendor_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::journal_entries::Entity",
        from = "Column::JournalEntryId",
        to = "super::journal_entries::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    JournalEntries,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::journal_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalEntries.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&JournalEntryLine> for ActiveModel {
    fn from(value: &JournalEntryLine) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            journal_entry_id: ActiveValue::Set(value.journal_entry_id.to_string()),
            account_id: ActiveValue::Set(value.account_id.to_string()),
            debit: ActiveValue::Set(value.debit.cents()),
            credit: ActiveValue::Set(value.credit.cents()),
            class_id: ActiveValue::Set(value.class_id.clone()),
            vendor_id: ActiveValue::Set(value.vendor_id.clone()),
        }
    }
}

impl TryFrom<Model> for JournalEntryLine {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "journal entry line")?,
            journal_entry_id: parse_uuid(&model.journal_entry_id, "journal entry")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            debit: MoneyCents::new(model.debit),
            credit: MoneyCents::new(model.credit),
            class_id: model.class_id,
            vendor_id: model.vendor_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_side_carries_the_amount() {
        let entry_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();

        let debit = JournalEntryLine::debit(entry_id, account_id, MoneyCents::new(4250));
        assert!(debit.validate().is_ok());

        let mut both = debit.clone();
        both.credit = MoneyCents::new(100);
        assert!(both.validate().is_err());

        let neither = JournalEntryLine::debit(entry_id, account_id, MoneyCents::ZERO);
        assert!(neither.validate().is_err());

        let mut negative = JournalEntryLine::credit(entry_id, account_id, MoneyCents::new(-1));
        assert!(negative.validate().is_err());
        negative.credit = MoneyCents::new(1);
        assert!(negative.validate().is_ok());
    }
}
