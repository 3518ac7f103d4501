//! Reclassification audit trail.
//!
//! Every bulk retyping writes one row per changed account recording what the
//! classification was, what it became, and why. Chart corrections routinely
//! touch hundreds of accounts; without this table the only record is a SQL
//! script in someone's home directory.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{LedgerError, accounts::AccountType, util::parse_uuid};

#[derive(Clone, Debug)]
pub struct AccountRevision {
    pub id: Uuid,
    pub account_id: Uuid,
    pub old_type: AccountType,
    pub old_subtype: Option<String>,
    pub new_type: AccountType,
    pub new_subtype: Option<String>,
    pub reason: String,
    pub changed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "account_revisions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub old_type: String,
    pub old_subtype: Option<String>,
    pub new_type: String,
    pub new_subtype: Option<String>,
    pub reason: String,
    pub changed_at: DateTimeUtc,
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

impl From<&AccountRevision> for ActiveModel {
    fn from(value: &AccountRevision) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            account_id: ActiveValue::Set(value.account_id.to_string()),
            old_type: ActiveValue::Set(value.old_type.as_str().to_string()),
            old_subtype: ActiveValue::Set(value.old_subtype.clone()),
            new_type: ActiveValue::Set(value.new_type.as_str().to_string()),
            new_subtype: ActiveValue::Set(value.new_subtype.clone()),
            reason: ActiveValue::Set(value.reason.clone()),
            changed_at: ActiveValue::Set(value.changed_at),
        }
    }
}

impl TryFrom<Model> for AccountRevision {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account revision")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            old_type: AccountType::try_from(model.old_type.as_str())?,
            old_subtype: model.old_subtype,
            new_type: AccountType::try_from(model.new_type.as_str())?,
            new_subtype: model.new_subtype,
            reason: model.reason,
            changed_at: model.changed_at,
        })
    }
}
