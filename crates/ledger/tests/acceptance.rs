use chrono::Utc;

use ledger::{
    AcceptCmd, AccountType, BankFeedRow, BankTransactionStatus, EntryListFilter, EntryStatus,
    LedgerError, ManualKind, ManualTransactionCmd, MoneyCents, SourceType, TransactionListFilter,
};

mod common;
use common::{account, cents, date, ledger_with_db};

fn feed_row(external_id: &str, source_ref: &str, day: u32, amount: i64) -> BankFeedRow {
    BankFeedRow {
        external_id: external_id.to_string(),
        source_ref: source_ref.to_string(),
        date: date(2025, 2, day),
        description: format!("feed row {external_id}"),
        amount: cents(amount),
    }
}

#[tokio::test]
async fn feed_ingestion_lands_pending_and_skips_redelivered_rows() {
    let (ledger, _db, business_id) = ledger_with_db().await;

    let rows = vec![
        feed_row("ext-1", "plaid:checking-001", 1, -4_250),
        feed_row("ext-2", "plaid:checking-001", 2, 90_000),
        feed_row("ext-1", "plaid:checking-001", 1, -4_250),
    ];
    let summary = ledger
        .ingest_bank_feed(&business_id, &rows, Utc::now())
        .await
        .unwrap();
    assert_eq!(summary.imported, 2);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].error, "already ingested");

    let pending = ledger
        .list_transactions(
            &business_id,
            &TransactionListFilter {
                statuses: Some(vec![BankTransactionStatus::Pending]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(pending.len(), 2);
}

#[tokio::test]
async fn accepting_a_payment_posts_a_balanced_two_line_entry() {
    let (ledger, _db, business_id) = ledger_with_db().await;
    let bank_gl = account(&ledger, &business_id, "1010", "Farm Checking", AccountType::Asset).await;
    let fuel = account(&ledger, &business_id, "6010", "Fuel & Oil", AccountType::Expense).await;
    ledger
        .link_bank_account(&business_id, "plaid:checking-001", bank_gl)
        .await
        .unwrap();

    // A transaction of -42.50 from a linked source, accepted into an expense.
    ledger
        .ingest_bank_feed(
            &business_id,
            &[feed_row("ext-1", "plaid:checking-001", 1, -4_250)],
            Utc::now(),
        )
        .await
        .unwrap();
    let transaction = ledger
        .list_transactions(&business_id, &TransactionListFilter::default())
        .await
        .unwrap()
        .remove(0);

    let entry_id = ledger
        .accept_transaction(
            AcceptCmd::new(&business_id, transaction.id, fuel).vendor_id("co-op fuel"),
            Utc::now(),
        )
        .await
        .unwrap();

    let entry = ledger.find_entry(&business_id, entry_id).await.unwrap();
    assert_eq!(entry.total_debit, cents(4_250));
    assert_eq!(entry.source_type, SourceType::BankImport);
    assert_eq!(entry.entry_date, date(2025, 2, 1));
    let debit_line = entry.lines.iter().find(|l| !l.debit.is_zero()).unwrap();
    let credit_line = entry.lines.iter().find(|l| !l.credit.is_zero()).unwrap();
    // Funds left the bank: credit the bank GL, debit the expense.
    assert_eq!(credit_line.account_id, bank_gl);
    assert_eq!(debit_line.account_id, fuel);
    assert_eq!(debit_line.vendor_id.as_deref(), Some("co-op fuel"));

    let accepted = ledger
        .find_transaction(&business_id, transaction.id)
        .await
        .unwrap();
    assert_eq!(accepted.status, BankTransactionStatus::Accepted);
    assert_eq!(accepted.accepted_account_id, Some(fuel));
    assert_eq!(accepted.accepted_gl_account_id, Some(bank_gl));
    assert_eq!(accepted.journal_entry_id, Some(entry_id));

    let fuel_balance = ledger
        .account_balance(&business_id, fuel, date(2025, 1, 1), date(2025, 12, 31))
        .await
        .unwrap();
    assert_eq!(fuel_balance, cents(4_250));
}

#[tokio::test]
async fn accepting_a_deposit_debits_the_bank_and_credits_the_destination() {
    let (ledger, _db, business_id) = ledger_with_db().await;
    let bank_gl = account(&ledger, &business_id, "1010", "Farm Checking", AccountType::Asset).await;
    let sales = account(&ledger, &business_id, "4010", "Produce Sales", AccountType::Revenue).await;
    ledger
        .link_bank_account(&business_id, "plaid:checking-001", bank_gl)
        .await
        .unwrap();

    ledger
        .ingest_bank_feed(
            &business_id,
            &[feed_row("ext-1", "plaid:checking-001", 3, 90_000)],
            Utc::now(),
        )
        .await
        .unwrap();
    let transaction = ledger
        .list_transactions(&business_id, &TransactionListFilter::default())
        .await
        .unwrap()
        .remove(0);

    let entry_id = ledger
        .accept_transaction(
            AcceptCmd::new(&business_id, transaction.id, sales),
            Utc::now(),
        )
        .await
        .unwrap();

    let entry = ledger.find_entry(&business_id, entry_id).await.unwrap();
    let debit_line = entry.lines.iter().find(|l| !l.debit.is_zero()).unwrap();
    let credit_line = entry.lines.iter().find(|l| !l.credit.is_zero()).unwrap();
    assert_eq!(debit_line.account_id, bank_gl);
    assert_eq!(credit_line.account_id, sales);

    let sales_balance = ledger
        .account_balance(&business_id, sales, date(2025, 1, 1), date(2025, 12, 31))
        .await
        .unwrap();
    assert_eq!(sales_balance, cents(90_000));
}

#[tokio::test]
async fn accepting_requires_a_bank_link_and_an_active_destination() {
    let (ledger, _db, business_id) = ledger_with_db().await;
    let fuel = account(&ledger, &business_id, "6010", "Fuel & Oil", AccountType::Expense).await;

    ledger
        .ingest_bank_feed(
            &business_id,
            &[feed_row("ext-1", "plaid:unlinked-999", 1, -4_250)],
            Utc::now(),
        )
        .await
        .unwrap();
    let transaction = ledger
        .list_transactions(&business_id, &TransactionListFilter::default())
        .await
        .unwrap()
        .remove(0);

    let err = ledger
        .accept_transaction(
            AcceptCmd::new(&business_id, transaction.id, fuel),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::UnlinkedBankSource {
            source: "plaid:unlinked-999".to_string()
        }
    );

    // No implicit default account, and no entry row left behind.
    let entries = ledger
        .list_entries(&business_id, &EntryListFilter::default())
        .await
        .unwrap();
    assert!(entries.is_empty());
    let still_pending = ledger
        .find_transaction(&business_id, transaction.id)
        .await
        .unwrap();
    assert_eq!(still_pending.status, BankTransactionStatus::Pending);

    // An inactive destination is rejected even with a link in place.
    let bank_gl = account(&ledger, &business_id, "1010", "Farm Checking", AccountType::Asset).await;
    ledger
        .link_bank_account(&business_id, "plaid:unlinked-999", bank_gl)
        .await
        .unwrap();
    ledger
        .deactivate_account(&business_id, fuel, false)
        .await
        .unwrap();
    let err = ledger
        .accept_transaction(
            AcceptCmd::new(&business_id, transaction.id, fuel),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[tokio::test]
async fn accepting_twice_fails_with_invalid_state_and_posts_once() {
    let (ledger, _db, business_id) = ledger_with_db().await;
    let bank_gl = account(&ledger, &business_id, "1010", "Farm Checking", AccountType::Asset).await;
    let fuel = account(&ledger, &business_id, "6010", "Fuel & Oil", AccountType::Expense).await;
    ledger
        .link_bank_account(&business_id, "plaid:checking-001", bank_gl)
        .await
        .unwrap();
    ledger
        .ingest_bank_feed(
            &business_id,
            &[feed_row("ext-1", "plaid:checking-001", 1, -4_250)],
            Utc::now(),
        )
        .await
        .unwrap();
    let transaction = ledger
        .list_transactions(&business_id, &TransactionListFilter::default())
        .await
        .unwrap()
        .remove(0);

    ledger
        .accept_transaction(
            AcceptCmd::new(&business_id, transaction.id, fuel),
            Utc::now(),
        )
        .await
        .unwrap();
    let err = ledger
        .accept_transaction(
            AcceptCmd::new(&business_id, transaction.id, fuel),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidState(_)));

    let entries = ledger
        .list_entries(&business_id, &EntryListFilter::default())
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn unaccept_round_trip_leaves_no_residual_balance() {
    let (ledger, _db, business_id) = ledger_with_db().await;
    let bank_gl = account(&ledger, &business_id, "1010", "Farm Checking", AccountType::Asset).await;
    let fuel = account(&ledger, &business_id, "6010", "Fuel & Oil", AccountType::Expense).await;
    ledger
        .link_bank_account(&business_id, "plaid:checking-001", bank_gl)
        .await
        .unwrap();
    ledger
        .ingest_bank_feed(
            &business_id,
            &[feed_row("ext-1", "plaid:checking-001", 1, -4_250)],
            Utc::now(),
        )
        .await
        .unwrap();
    let transaction = ledger
        .list_transactions(&business_id, &TransactionListFilter::default())
        .await
        .unwrap()
        .remove(0);

    let entry_id = ledger
        .accept_transaction(
            AcceptCmd::new(&business_id, transaction.id, fuel).class_id("dairy"),
            Utc::now(),
        )
        .await
        .unwrap();
    ledger
        .unaccept_transaction(&business_id, transaction.id, Utc::now())
        .await
        .unwrap();

    // The original entry survives as an inert audit trail.
    let entry = ledger.find_entry(&business_id, entry_id).await.unwrap();
    assert_eq!(entry.status, EntryStatus::Void);
    assert_eq!(entry.lines.len(), 2);

    let restored = ledger
        .find_transaction(&business_id, transaction.id)
        .await
        .unwrap();
    assert_eq!(restored.status, BankTransactionStatus::Pending);
    assert_eq!(restored.accepted_account_id, None);
    assert_eq!(restored.accepted_gl_account_id, None);
    assert_eq!(restored.journal_entry_id, None);
    assert_eq!(restored.class_id, None);

    for account_id in [bank_gl, fuel] {
        let balance = ledger
            .account_balance(&business_id, account_id, date(2025, 1, 1), date(2025, 12, 31))
            .await
            .unwrap();
        assert_eq!(balance, MoneyCents::ZERO);
    }

    // Unaccepting an already-pending transaction is a typed error, not a
    // crash.
    let err = ledger
        .unaccept_transaction(&business_id, transaction.id, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidState(_)));

    // And the row can be accepted again, into a different account this time.
    let repairs =
        account(&ledger, &business_id, "6020", "Repairs & Maintenance", AccountType::Expense).await;
    ledger
        .accept_transaction(
            AcceptCmd::new(&business_id, transaction.id, repairs),
            Utc::now(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn exclusion_records_a_reason_and_restore_clears_it() {
    let (ledger, _db, business_id) = ledger_with_db().await;
    ledger
        .ingest_bank_feed(
            &business_id,
            &[feed_row("ext-1", "plaid:checking-001", 1, -4_250)],
            Utc::now(),
        )
        .await
        .unwrap();
    let transaction = ledger
        .list_transactions(&business_id, &TransactionListFilter::default())
        .await
        .unwrap()
        .remove(0);

    ledger
        .exclude_transaction(&business_id, transaction.id, "personal purchase")
        .await
        .unwrap();
    let excluded = ledger
        .find_transaction(&business_id, transaction.id)
        .await
        .unwrap();
    assert_eq!(excluded.status, BankTransactionStatus::Excluded);
    assert_eq!(excluded.exclusion_reason.as_deref(), Some("personal purchase"));
    assert_eq!(excluded.journal_entry_id, None);

    // Exclude is only legal from pending.
    let err = ledger
        .exclude_transaction(&business_id, transaction.id, "again")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidState(_)));

    ledger
        .restore_transaction(&business_id, transaction.id)
        .await
        .unwrap();
    let restored = ledger
        .find_transaction(&business_id, transaction.id)
        .await
        .unwrap();
    assert_eq!(restored.status, BankTransactionStatus::Pending);
    assert_eq!(restored.exclusion_reason, None);

    let err = ledger
        .restore_transaction(&business_id, transaction.id)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidState(_)));
}

#[tokio::test]
async fn manual_transactions_enter_the_same_workflow() {
    let (ledger, _db, business_id) = ledger_with_db().await;
    let cash = account(&ledger, &business_id, "1005", "Cash Box", AccountType::Asset).await;
    let sales = account(&ledger, &business_id, "4010", "Produce Sales", AccountType::Revenue).await;

    let transaction_id = ledger
        .create_manual_transaction(
            ManualTransactionCmd::new(
                &business_id,
                date(2025, 3, 8),
                "Farm stand cash",
                cents(15_500),
                ManualKind::Deposit,
            ),
            Utc::now(),
        )
        .await
        .unwrap();

    let transaction = ledger
        .find_transaction(&business_id, transaction_id)
        .await
        .unwrap();
    assert_eq!(transaction.status, BankTransactionStatus::Pending);
    assert_eq!(transaction.amount, cents(15_500));
    assert_eq!(transaction.source, "manual");

    // No implicit default: the "manual" source needs its own link.
    let err = ledger
        .accept_transaction(
            AcceptCmd::new(&business_id, transaction_id, sales),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::UnlinkedBankSource { .. }));

    ledger
        .link_bank_account(&business_id, "manual", cash)
        .await
        .unwrap();
    let entry_id = ledger
        .accept_transaction(
            AcceptCmd::new(&business_id, transaction_id, sales),
            Utc::now(),
        )
        .await
        .unwrap();
    let entry = ledger.find_entry(&business_id, entry_id).await.unwrap();
    assert_eq!(entry.source_type, SourceType::Manual);
    let debit_line = entry.lines.iter().find(|l| !l.debit.is_zero()).unwrap();
    assert_eq!(debit_line.account_id, cash);

    // Payments get the negative sign derived from the kind.
    let payment_id = ledger
        .create_manual_transaction(
            ManualTransactionCmd::new(
                &business_id,
                date(2025, 3, 9),
                "Paid the farrier",
                cents(8_000),
                ManualKind::Payment,
            ),
            Utc::now(),
        )
        .await
        .unwrap();
    let payment = ledger
        .find_transaction(&business_id, payment_id)
        .await
        .unwrap();
    assert_eq!(payment.amount, cents(-8_000));

    let err = ledger
        .create_manual_transaction(
            ManualTransactionCmd::new(
                &business_id,
                date(2025, 3, 9),
                "Zero",
                MoneyCents::ZERO,
                ManualKind::Deposit,
            ),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[tokio::test]
async fn relinking_a_source_updates_the_counter_leg_account() {
    let (ledger, _db, business_id) = ledger_with_db().await;
    let checking = account(&ledger, &business_id, "1010", "Farm Checking", AccountType::Asset).await;
    let savings = account(&ledger, &business_id, "1020", "Farm Savings", AccountType::Asset).await;

    ledger
        .link_bank_account(&business_id, "plaid:checking-001", checking)
        .await
        .unwrap();
    ledger
        .link_bank_account(&business_id, "plaid:checking-001", savings)
        .await
        .unwrap();
    let link = ledger
        .bank_account_link(&business_id, "plaid:checking-001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(link.account_id, savings);

    ledger
        .unlink_bank_account(&business_id, "plaid:checking-001")
        .await
        .unwrap();
    assert!(
        ledger
            .bank_account_link(&business_id, "plaid:checking-001")
            .await
            .unwrap()
            .is_none()
    );
    let err = ledger
        .unlink_bank_account(&business_id, "plaid:checking-001")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}
