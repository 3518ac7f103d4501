//! Chart-of-accounts primitives.
//!
//! An [`Account`] is one row of the general ledger's chart: a coded,
//! classified bucket that journal entry lines post against. The five-way
//! classification drives every sign convention downstream, so it is a real
//! enum here rather than a free string; only `subtype` stays free-text.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, MoneyCents, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }

    pub const ALL: [AccountType; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];
}

impl TryFrom<&str> for AccountType {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "revenue" => Ok(Self::Revenue),
            "expense" => Ok(Self::Expense),
            other => Err(LedgerError::Validation(format!(
                "invalid account type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalBalance {
    Debit,
    Credit,
}

impl NormalBalance {
    /// The fixed derivation table. `normal_balance` is a pure function of the
    /// account type and is never accepted as caller input.
    pub fn for_type(account_type: AccountType) -> Self {
        match account_type {
            AccountType::Asset | AccountType::Expense => Self::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => Self::Credit,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl TryFrom<&str> for NormalBalance {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            other => Err(LedgerError::Validation(format!(
                "invalid normal balance: {other}"
            ))),
        }
    }
}

/// A general-ledger account.
#[derive(Clone, Debug)]
pub struct Account {
    /// Stable identifier, generated once and persisted; the display `code`
    /// can change without breaking posted lines.
    pub id: Uuid,
    pub business_id: String,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub subtype: Option<String>,
    pub normal_balance: NormalBalance,
    pub is_active: bool,
    /// Denormalized display hint. Reports never read this; they recompute
    /// from posted lines.
    pub current_balance: MoneyCents,
}

impl Account {
    pub fn new(
        business_id: String,
        code: String,
        name: String,
        account_type: AccountType,
        subtype: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            business_id,
            code,
            name,
            account_type,
            subtype,
            normal_balance: NormalBalance::for_type(account_type),
            is_active: true,
            current_balance: MoneyCents::ZERO,
        }
    }

    /// Reclassifies the account. Changing the type always re-derives the
    /// normal balance; there is no way to set one without the other.
    pub fn set_type(&mut self, account_type: AccountType, subtype: Option<String>) {
        self.account_type = account_type;
        self.normal_balance = NormalBalance::for_type(account_type);
        self.subtype = subtype;
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub business_id: String,
    pub code: String,
    pub name: String,
    pub account_type: String,
    pub subtype: Option<String>,
    pub normal_balance: String,
    pub is_active: bool,
    pub current_balance: i64,
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
    JournalEntryLines,
    #[sea_orm(has_many = "super::account_revisions::Entity")]
    Revisions,
}

impl Related<super::businesses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Businesses.def()
    }
}

impl Related<super::journal_entry_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalEntryLines.def()
    }
}

impl Related<super::account_revisions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Revisions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            business_id: ActiveValue::Set(value.business_id.clone()),
            code: ActiveValue::Set(value.code.clone()),
            name: ActiveValue::Set(value.name.clone()),
            account_type: ActiveValue::Set(value.account_type.as_str().to_string()),
            subtype: ActiveValue::Set(value.subtype.clone()),
            normal_balance: ActiveValue::Set(value.normal_balance.as_str().to_string()),
            is_active: ActiveValue::Set(value.is_active),
            current_balance: ActiveValue::Set(value.current_balance.cents()),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            business_id: model.business_id,
            code: model.code,
            name: model.name,
            account_type: AccountType::try_from(model.account_type.as_str())?,
            subtype: model.subtype,
            normal_balance: NormalBalance::try_from(model.normal_balance.as_str())?,
            is_active: model.is_active,
            current_balance: MoneyCents::new(model.current_balance),
        })
    }
}
