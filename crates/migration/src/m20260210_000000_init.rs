//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for the bookkeeping core:
//!
//! - `businesses`: tenancy anchor, one row per set of books
//! - `accounts`: the chart of accounts with type/subtype classification
//! - `journal_entries`: balanced entry headers with lifecycle status
//! - `journal_entry_lines`: individual debit/credit postings per entry
//! - `bank_transactions`: raw bank-feed rows in the review queue
//! - `bank_account_links`: external source reference → GL account mapping
//! - `account_revisions`: audit rows written by bulk reclassification

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Businesses {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    BusinessId,
    Code,
    Name,
    AccountType,
    Subtype,
    NormalBalance,
    IsActive,
    CurrentBalance,
}

#[derive(Iden)]
enum JournalEntries {
    Table,
    Id,
    BusinessId,
    EntryNumber,
    EntryDate,
    Status,
    SourceType,
    Description,
    TotalDebit,
    IdempotencyKey,
    CreatedAt,
    VoidedAt,
}

#[derive(Iden)]
enum JournalEntryLines {
    Table,
    Id,
    JournalEntryId,
    AccountId,
    Debit,
    Credit,
    ClassId,
    VendorId,
}

#[derive(Iden)]
enum BankTransactions {
    Table,
    Id,
    BusinessId,
    Date,
    Description,
    Amount,
    Source,
    ExternalId,
    Status,
    AcceptedAccountId,
    AcceptedGlAccountId,
    ClassId,
    VendorId,
    ExclusionReason,
    JournalEntryId,
    LockVersion,
    CreatedAt,
}

#[derive(Iden)]
enum BankAccountLinks {
    Table,
    BusinessId,
    SourceRef,
    AccountId,
}

#[derive(Iden)]
enum AccountRevisions {
    Table,
    Id,
    AccountId,
    OldType,
    OldSubtype,
    NewType,
    NewSubtype,
    Reason,
    ChangedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Businesses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Businesses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Businesses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Businesses::Name).string().not_null())
                    .col(
                        ColumnDef::new(Businesses::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::BusinessId).string().not_null())
                    .col(ColumnDef::new(Accounts::Code).string().not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::AccountType).string().not_null())
                    .col(ColumnDef::new(Accounts::Subtype).string())
                    .col(ColumnDef::new(Accounts::NormalBalance).string().not_null())
                    .col(ColumnDef::new(Accounts::IsActive).boolean().not_null())
                    .col(
                        ColumnDef::new(Accounts::CurrentBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-business_id")
                            .from(Accounts::Table, Accounts::BusinessId)
                            .to(Businesses::Table, Businesses::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Code uniqueness among *active* accounts is an application rule;
        // this index is for lookup only.
        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-business_id-code")
                    .table(Accounts::Table)
                    .col(Accounts::BusinessId)
                    .col(Accounts::Code)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Journal Entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(JournalEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JournalEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(JournalEntries::BusinessId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalEntries::EntryNumber)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(JournalEntries::EntryDate).date().not_null())
                    .col(ColumnDef::new(JournalEntries::Status).string().not_null())
                    .col(
                        ColumnDef::new(JournalEntries::SourceType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalEntries::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalEntries::TotalDebit)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(JournalEntries::IdempotencyKey).string())
                    .col(
                        ColumnDef::new(JournalEntries::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(JournalEntries::VoidedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journal_entries-business_id")
                            .from(JournalEntries::Table, JournalEntries::BusinessId)
                            .to(Businesses::Table, Businesses::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entries-business_id-entry_date")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::BusinessId)
                    .col(JournalEntries::EntryDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entries-entry_number-unique")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::BusinessId)
                    .col(JournalEntries::EntryNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entries-idempotency_key")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::BusinessId)
                    .col(JournalEntries::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Journal Entry Lines
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(JournalEntryLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JournalEntryLines::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(JournalEntryLines::JournalEntryId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalEntryLines::AccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalEntryLines::Debit)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalEntryLines::Credit)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(JournalEntryLines::ClassId).string())
                    .col(ColumnDef::new(JournalEntryLines::VendorId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journal_entry_lines-journal_entry_id")
                            .from(
                                JournalEntryLines::Table,
                                JournalEntryLines::JournalEntryId,
                            )
                            .to(JournalEntries::Table, JournalEntries::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journal_entry_lines-account_id")
                            .from(JournalEntryLines::Table, JournalEntryLines::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entry_lines-journal_entry_id")
                    .table(JournalEntryLines::Table)
                    .col(JournalEntryLines::JournalEntryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entry_lines-account_id")
                    .table(JournalEntryLines::Table)
                    .col(JournalEntryLines::AccountId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Bank Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BankTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BankTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BankTransactions::BusinessId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BankTransactions::Date).date().not_null())
                    .col(
                        ColumnDef::new(BankTransactions::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BankTransactions::Source).string().not_null())
                    .col(ColumnDef::new(BankTransactions::ExternalId).string())
                    .col(ColumnDef::new(BankTransactions::Status).string().not_null())
                    .col(ColumnDef::new(BankTransactions::AcceptedAccountId).string())
                    .col(ColumnDef::new(BankTransactions::AcceptedGlAccountId).string())
                    .col(ColumnDef::new(BankTransactions::ClassId).string())
                    .col(ColumnDef::new(BankTransactions::VendorId).string())
                    .col(ColumnDef::new(BankTransactions::ExclusionReason).string())
                    .col(ColumnDef::new(BankTransactions::JournalEntryId).string())
                    .col(
                        ColumnDef::new(BankTransactions::LockVersion)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BankTransactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_transactions-business_id")
                            .from(BankTransactions::Table, BankTransactions::BusinessId)
                            .to(Businesses::Table, Businesses::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_transactions-journal_entry_id")
                            .from(BankTransactions::Table, BankTransactions::JournalEntryId)
                            .to(JournalEntries::Table, JournalEntries::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bank_transactions-business_id-date")
                    .table(BankTransactions::Table)
                    .col(BankTransactions::BusinessId)
                    .col(BankTransactions::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bank_transactions-external_id")
                    .table(BankTransactions::Table)
                    .col(BankTransactions::BusinessId)
                    .col(BankTransactions::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Bank Account Links
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BankAccountLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BankAccountLinks::BusinessId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankAccountLinks::SourceRef)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankAccountLinks::AccountId)
                            .string()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(BankAccountLinks::BusinessId)
                            .col(BankAccountLinks::SourceRef),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_account_links-business_id")
                            .from(BankAccountLinks::Table, BankAccountLinks::BusinessId)
                            .to(Businesses::Table, Businesses::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_account_links-account_id")
                            .from(BankAccountLinks::Table, BankAccountLinks::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Account Revisions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(AccountRevisions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountRevisions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AccountRevisions::AccountId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccountRevisions::OldType).string().not_null())
                    .col(ColumnDef::new(AccountRevisions::OldSubtype).string())
                    .col(ColumnDef::new(AccountRevisions::NewType).string().not_null())
                    .col(ColumnDef::new(AccountRevisions::NewSubtype).string())
                    .col(ColumnDef::new(AccountRevisions::Reason).string().not_null())
                    .col(
                        ColumnDef::new(AccountRevisions::ChangedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-account_revisions-account_id")
                            .from(AccountRevisions::Table, AccountRevisions::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-account_revisions-account_id")
                    .table(AccountRevisions::Table)
                    .col(AccountRevisions::AccountId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccountRevisions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankAccountLinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalEntryLines::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Businesses::Table).to_owned())
            .await?;
        Ok(())
    }
}
