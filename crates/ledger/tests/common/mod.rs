use chrono::{NaiveDate, Utc};
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use ledger::{AccountType, CreateAccountCmd, Ledger, MoneyCents};
use migration::MigratorTrait;

pub async fn ledger_with_db() -> (Ledger, DatabaseConnection, String) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let ledger = Ledger::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    let business_id = ledger
        .create_business("Maple Hollow Farm", Utc::now())
        .await
        .unwrap();
    (ledger, db, business_id)
}

pub async fn account(
    ledger: &Ledger,
    business_id: &str,
    code: &str,
    name: &str,
    account_type: AccountType,
) -> Uuid {
    ledger
        .create_account(CreateAccountCmd::new(business_id, code, name, account_type))
        .await
        .unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn cents(value: i64) -> MoneyCents {
    MoneyCents::new(value)
}
