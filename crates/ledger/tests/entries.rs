use chrono::Utc;
use uuid::Uuid;

use ledger::{
    AccountType, BackfillEntry, BackfillLine, EntryListFilter, EntryStatus, LedgerError,
    LineInput, MoneyCents, PostEntryCmd, SourceType,
};

mod common;
use common::{account, cents, date, ledger_with_db};

#[tokio::test]
async fn posting_writes_header_and_lines_atomically() {
    let (ledger, _db, business_id) = ledger_with_db().await;
    let bank = account(&ledger, &business_id, "1010", "Farm Checking", AccountType::Asset).await;
    let sales = account(&ledger, &business_id, "4010", "Produce Sales", AccountType::Revenue).await;

    let entry_id = ledger
        .create_posted(
            PostEntryCmd::new(
                &business_id,
                date(2025, 3, 1),
                "Saturday market",
                SourceType::Pos,
                vec![
                    LineInput::debit(bank, cents(31_550)),
                    LineInput::credit(sales, cents(31_550)).class_id("produce"),
                ],
            ),
            Utc::now(),
        )
        .await
        .unwrap();

    let entry = ledger.find_entry(&business_id, entry_id).await.unwrap();
    assert_eq!(entry.status, EntryStatus::Posted);
    assert_eq!(entry.source_type, SourceType::Pos);
    assert_eq!(entry.entry_number, 1);
    assert_eq!(entry.total_debit, cents(31_550));
    assert_eq!(entry.lines.len(), 2);
    let credit_line = entry
        .lines
        .iter()
        .find(|line| line.account_id == sales)
        .unwrap();
    assert_eq!(credit_line.credit, cents(31_550));
    assert_eq!(credit_line.class_id.as_deref(), Some("produce"));

    let second = ledger
        .create_posted(
            PostEntryCmd::new(
                &business_id,
                date(2025, 3, 2),
                "Sunday market",
                SourceType::Pos,
                vec![
                    LineInput::debit(bank, cents(100)),
                    LineInput::credit(sales, cents(100)),
                ],
            ),
            Utc::now(),
        )
        .await
        .unwrap();
    let second = ledger.find_entry(&business_id, second).await.unwrap();
    assert_eq!(second.entry_number, 2);
}

#[tokio::test]
async fn unbalanced_entries_are_rejected_with_both_sums() {
    let (ledger, _db, business_id) = ledger_with_db().await;
    let bank = account(&ledger, &business_id, "1010", "Farm Checking", AccountType::Asset).await;
    let sales = account(&ledger, &business_id, "4010", "Produce Sales", AccountType::Revenue).await;

    // Off by a single cent is still unbalanced; nothing plugs the gap.
    let err = ledger
        .create_posted(
            PostEntryCmd::new(
                &business_id,
                date(2025, 3, 1),
                "Fat-fingered",
                SourceType::Manual,
                vec![
                    LineInput::debit(bank, cents(10_000)),
                    LineInput::credit(sales, cents(9_999)),
                ],
            ),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::UnbalancedEntry {
            total_debit: cents(10_000),
            total_credit: cents(9_999),
        }
    );

    let entries = ledger
        .list_entries(&business_id, &EntryListFilter::default())
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn malformed_line_sets_are_rejected() {
    let (ledger, _db, business_id) = ledger_with_db().await;
    let bank = account(&ledger, &business_id, "1010", "Farm Checking", AccountType::Asset).await;

    let err = ledger
        .create_posted(
            PostEntryCmd::new(
                &business_id,
                date(2025, 3, 1),
                "Empty",
                SourceType::Manual,
                vec![],
            ),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    let err = ledger
        .create_posted(
            PostEntryCmd::new(
                &business_id,
                date(2025, 3, 1),
                "Ghost account",
                SourceType::Manual,
                vec![
                    LineInput::debit(bank, cents(100)),
                    LineInput::credit(Uuid::new_v4(), cents(100)),
                ],
            ),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));

    // A line carrying both sides is malformed even when the totals balance.
    let mut both_sides = LineInput::debit(bank, cents(100));
    both_sides.credit = cents(100);
    let err = ledger
        .create_posted(
            PostEntryCmd::new(
                &business_id,
                date(2025, 3, 1),
                "Two-sided line",
                SourceType::Manual,
                vec![both_sides],
            ),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[tokio::test]
async fn randomized_balanced_sets_post_and_skewed_sets_fail() {
    let (ledger, _db, business_id) = ledger_with_db().await;
    let mut accounts = Vec::new();
    for (i, account_type) in [
        AccountType::Asset,
        AccountType::Liability,
        AccountType::Equity,
        AccountType::Revenue,
        AccountType::Expense,
    ]
    .into_iter()
    .enumerate()
    {
        accounts.push(
            account(
                &ledger,
                &business_id,
                &format!("10{i}0"),
                &format!("Account {i}"),
                account_type,
            )
            .await,
        );
    }

    // Deterministic LCG; no rand dependency needed for a smoke sweep.
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as i64
    };

    for round in 0..20usize {
        let mut lines = Vec::new();
        let mut total = MoneyCents::ZERO;
        for account_id in accounts.iter().take(2 + (round % 4)) {
            let amount = cents(next() % 900_000 + 100);
            total += amount;
            lines.push(LineInput::debit(*account_id, amount));
        }
        lines.push(LineInput::credit(accounts[0], total));

        let balanced = PostEntryCmd::new(
            &business_id,
            date(2025, 1, 1 + round as u32),
            format!("Random round {round}"),
            SourceType::System,
            lines.clone(),
        );
        ledger.create_posted(balanced, Utc::now()).await.unwrap();

        // Skew one line by a cent and the same set must be rejected.
        lines.last_mut().unwrap().credit += cents(1);
        let skewed = PostEntryCmd::new(
            &business_id,
            date(2025, 1, 1 + round as u32),
            format!("Skewed round {round}"),
            SourceType::System,
            lines,
        );
        let err = ledger.create_posted(skewed, Utc::now()).await.unwrap_err();
        assert!(matches!(err, LedgerError::UnbalancedEntry { .. }));
    }
}

#[tokio::test]
async fn idempotency_key_prevents_double_posting() {
    let (ledger, _db, business_id) = ledger_with_db().await;
    let bank = account(&ledger, &business_id, "1010", "Farm Checking", AccountType::Asset).await;
    let sales = account(&ledger, &business_id, "4010", "Produce Sales", AccountType::Revenue).await;

    let cmd = PostEntryCmd::new(
        &business_id,
        date(2025, 5, 5),
        "Feed store refund",
        SourceType::BankImport,
        vec![
            LineInput::debit(bank, cents(4_250)),
            LineInput::credit(sales, cents(4_250)),
        ],
    )
    .idempotency_key("bank-transaction-test-1");

    let first = ledger.create_posted(cmd.clone(), Utc::now()).await.unwrap();
    let second = ledger.create_posted(cmd, Utc::now()).await.unwrap();
    assert_eq!(first, second);

    let entries = ledger
        .list_entries(&business_id, &EntryListFilter::default())
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn voiding_excludes_lines_without_deleting_them() {
    let (ledger, _db, business_id) = ledger_with_db().await;
    let bank = account(&ledger, &business_id, "1010", "Farm Checking", AccountType::Asset).await;
    let fuel = account(&ledger, &business_id, "6010", "Fuel & Oil", AccountType::Expense).await;

    let entry_id = ledger
        .create_posted(
            PostEntryCmd::new(
                &business_id,
                date(2025, 6, 1),
                "Diesel",
                SourceType::Manual,
                vec![
                    LineInput::debit(fuel, cents(12_000)),
                    LineInput::credit(bank, cents(12_000)),
                ],
            ),
            Utc::now(),
        )
        .await
        .unwrap();

    ledger
        .void_entry(&business_id, entry_id, Utc::now())
        .await
        .unwrap();

    let entry = ledger.find_entry(&business_id, entry_id).await.unwrap();
    assert_eq!(entry.status, EntryStatus::Void);
    assert!(entry.voided_at.is_some());
    // Lines stay for audit.
    assert_eq!(entry.lines.len(), 2);
    // But nothing aggregates them.
    let balance = ledger
        .account_balance(&business_id, fuel, date(2025, 1, 1), date(2025, 12, 31))
        .await
        .unwrap();
    assert_eq!(balance, MoneyCents::ZERO);

    let err = ledger
        .void_entry(&business_id, entry_id, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidState(_)));

    let err = ledger
        .void_entry(&business_id, Uuid::new_v4(), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[tokio::test]
async fn backfill_degrades_per_logical_entry() {
    let (ledger, _db, business_id) = ledger_with_db().await;
    account(&ledger, &business_id, "1010", "Farm Checking", AccountType::Asset).await;
    account(&ledger, &business_id, "4010", "Produce Sales", AccountType::Revenue).await;

    let entries = vec![
        BackfillEntry {
            date: date(2024, 11, 3),
            description: "Historic market day".to_string(),
            lines: vec![
                BackfillLine {
                    account_code: "1010".to_string(),
                    debit: cents(20_000),
                    credit: MoneyCents::ZERO,
                },
                BackfillLine {
                    account_code: "4010".to_string(),
                    debit: MoneyCents::ZERO,
                    credit: cents(20_000),
                },
            ],
        },
        // Unbalanced: skipped, not fatal.
        BackfillEntry {
            date: date(2024, 11, 4),
            description: "Bad export row".to_string(),
            lines: vec![
                BackfillLine {
                    account_code: "1010".to_string(),
                    debit: cents(5_000),
                    credit: MoneyCents::ZERO,
                },
                BackfillLine {
                    account_code: "4010".to_string(),
                    debit: MoneyCents::ZERO,
                    credit: cents(4_000),
                },
            ],
        },
        // Unknown code: skipped, not fatal.
        BackfillEntry {
            date: date(2024, 11, 5),
            description: "Orphan account".to_string(),
            lines: vec![
                BackfillLine {
                    account_code: "8888".to_string(),
                    debit: cents(100),
                    credit: MoneyCents::ZERO,
                },
                BackfillLine {
                    account_code: "1010".to_string(),
                    debit: MoneyCents::ZERO,
                    credit: cents(100),
                },
            ],
        },
    ];

    let summary = ledger
        .import_entries(&business_id, &entries, Utc::now())
        .await
        .unwrap();
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.skipped.len(), 2);

    let posted = ledger
        .list_entries(&business_id, &EntryListFilter::default())
        .await
        .unwrap();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].description, "Historic market day");
    assert_eq!(posted[0].source_type, SourceType::System);
}

#[tokio::test]
async fn entry_listing_filters_by_range_and_source() {
    let (ledger, _db, business_id) = ledger_with_db().await;
    let bank = account(&ledger, &business_id, "1010", "Farm Checking", AccountType::Asset).await;
    let sales = account(&ledger, &business_id, "4010", "Produce Sales", AccountType::Revenue).await;

    for (day, source) in [(1, SourceType::Pos), (15, SourceType::Manual), (28, SourceType::Pos)] {
        ledger
            .create_posted(
                PostEntryCmd::new(
                    &business_id,
                    date(2025, 2, day),
                    format!("Feb {day}"),
                    source,
                    vec![
                        LineInput::debit(bank, cents(1_000)),
                        LineInput::credit(sales, cents(1_000)),
                    ],
                ),
                Utc::now(),
            )
            .await
            .unwrap();
    }

    let filter = EntryListFilter {
        from: Some(date(2025, 2, 10)),
        to: Some(date(2025, 2, 28)),
        source_types: Some(vec![SourceType::Pos]),
        include_void: false,
    };
    let entries = ledger.list_entries(&business_id, &filter).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].entry_date, date(2025, 2, 28));

    let err = ledger
        .list_entries(
            &business_id,
            &EntryListFilter {
                from: Some(date(2025, 3, 1)),
                to: Some(date(2025, 2, 1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}
