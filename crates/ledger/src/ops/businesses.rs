use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, TransactionTrait};

use crate::{Business, ResultLedger, businesses, util::normalize_required_text};

use super::{Ledger, with_tx};

impl Ledger {
    /// Registers a business and returns its id.
    pub async fn create_business(
        &self,
        name: &str,
        created_at: DateTime<Utc>,
    ) -> ResultLedger<String> {
        let name = normalize_required_text(name, "business name")?;
        with_tx!(self, |db_tx| {
            let business = Business::new(name, created_at);
            businesses::ActiveModel::from(&business).insert(&db_tx).await?;
            Ok(business.id)
        })
    }

    pub async fn find_business(&self, business_id: &str) -> ResultLedger<Business> {
        let model = self.require_business(&self.database, business_id).await?;
        Ok(Business::from(model))
    }
}
