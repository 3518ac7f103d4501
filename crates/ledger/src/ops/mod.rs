use sea_orm::{ConnectionTrait, DatabaseConnection, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger, util::normalize_required_text};

mod acceptance;
mod businesses;
mod chart;
mod entries;
mod reports;

pub use acceptance::TransactionListFilter;
pub use entries::EntryListFilter;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The ledger engine.
///
/// Owns the database handle and exposes every operation as a method. All
/// mutating methods run inside a single database transaction, so a header,
/// its lines, and any bank-transaction status flip commit together or not at
/// all.
#[derive(Debug)]
pub struct Ledger {
    database: DatabaseConnection,
}

impl Ledger {
    /// Return a builder for `Ledger`. Help to build the struct.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    pub(crate) async fn require_business<C: ConnectionTrait>(
        &self,
        db: &C,
        business_id: &str,
    ) -> ResultLedger<crate::businesses::Model> {
        crate::businesses::Entity::find_by_id(business_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("business {business_id}")))
    }

    pub(crate) async fn require_account<C: ConnectionTrait>(
        &self,
        db: &C,
        business_id: &str,
        account_id: Uuid,
    ) -> ResultLedger<crate::accounts::Model> {
        crate::accounts::Entity::find_by_id(account_id.to_string())
            .filter(crate::accounts::Column::BusinessId.eq(business_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("account {account_id}")))
    }

    /// Looks an account up by display code among the business's active
    /// accounts (codes are only unique within that set).
    pub(crate) async fn find_active_account_by_code<C: ConnectionTrait>(
        &self,
        db: &C,
        business_id: &str,
        code: &str,
    ) -> ResultLedger<Option<crate::accounts::Model>> {
        crate::accounts::Entity::find()
            .filter(crate::accounts::Column::BusinessId.eq(business_id.to_string()))
            .filter(crate::accounts::Column::Code.eq(code.to_string()))
            .filter(crate::accounts::Column::IsActive.eq(true))
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// Next value of the per-business display sequence for entry numbers.
    pub(crate) async fn next_entry_number<C: ConnectionTrait>(
        &self,
        db: &C,
        business_id: &str,
    ) -> ResultLedger<i64> {
        let last = crate::journal_entries::Entity::find()
            .filter(crate::journal_entries::Column::BusinessId.eq(business_id.to_string()))
            .order_by_desc(crate::journal_entries::Column::EntryNumber)
            .one(db)
            .await?;
        Ok(last.map_or(1, |model| model.entry_number + 1))
    }
}

pub(crate) fn normalize_code(value: &str) -> ResultLedger<String> {
    normalize_required_text(value, "account code")
}

/// The builder for `Ledger`
#[derive(Default)]
pub struct LedgerBuilder {
    database: DatabaseConnection,
}

impl LedgerBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Construct `Ledger`
    pub async fn build(self) -> ResultLedger<Ledger> {
        Ok(Ledger {
            database: self.database,
        })
    }
}
