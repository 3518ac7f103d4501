//! Bank-source to GL-account link table.
//!
//! Maps one external bank-account reference (per business) to exactly one
//! ledger account: the automatic counter-leg for every transaction delivered
//! from that source. A lookup relation, not an ownership relation: unlinking
//! never touches the account.

use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{LedgerError, util::parse_uuid};

#[derive(Clone, Debug)]
pub struct BankAccountLink {
    pub business_id: String,
    pub source_ref: String,
    pub account_id: Uuid,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bank_account_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub business_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub source_ref: String,
    pub account_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BankAccountLink> for ActiveModel {
    fn from(value: &BankAccountLink) -> Self {
        Self {
            business_id: ActiveValue::Set(value.business_id.clone()),
            source_ref: ActiveValue::Set(value.source_ref.clone()),
            account_id: ActiveValue::Set(value.account_id.to_string()),
        }
    }
}

impl TryFrom<Model> for BankAccountLink {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            business_id: model.business_id,
            source_ref: model.source_ref,
            account_id: parse_uuid(&model.account_id, "account")?,
        })
    }
}
