use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Account, LedgerError, ResultLedger,
    bank_account_links::{self, BankAccountLink},
    bank_transactions::{self, BankTransaction, BankTransactionStatus, MANUAL_SOURCE, ManualKind},
    commands::{AcceptCmd, BankFeedRow, ImportSummary, LineInput, ManualTransactionCmd, PostEntryCmd, SkippedRow},
    journal_entries::SourceType,
    util::{normalize_optional_text, normalize_required_text},
};

use super::{Ledger, with_tx};

/// Filters for listing raw bank transactions.
///
/// `from` and `to` are inclusive transaction dates.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// If present, acts as an allow-list of statuses to return.
    pub statuses: Option<Vec<BankTransactionStatus>>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultLedger<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(LedgerError::Validation(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    if filter.statuses.as_ref().is_some_and(|s| s.is_empty()) {
        return Err(LedgerError::Validation(
            "statuses must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn guard_rows_affected(rows_affected: u64, transaction_id: Uuid) -> ResultLedger<()> {
    if rows_affected == 0 {
        return Err(LedgerError::ConcurrencyConflict(format!(
            "bank transaction {transaction_id} was modified concurrently"
        )));
    }
    Ok(())
}

impl Ledger {
    /// Maps an external bank-account reference to the GL account that takes
    /// the automatic counter-leg for that source. Re-linking updates in
    /// place.
    pub async fn link_bank_account(
        &self,
        business_id: &str,
        source_ref: &str,
        account_id: Uuid,
    ) -> ResultLedger<()> {
        let source_ref = normalize_required_text(source_ref, "source reference")?;
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, business_id, account_id).await?;
            let account = Account::try_from(model)?;
            if !account.is_active {
                return Err(LedgerError::Validation(format!(
                    "account {account_id} is inactive"
                )));
            }

            let existing = bank_account_links::Entity::find_by_id((
                business_id.to_string(),
                source_ref.clone(),
            ))
            .one(&db_tx)
            .await?;

            let link = BankAccountLink {
                business_id: business_id.to_string(),
                source_ref,
                account_id,
            };
            if existing.is_some() {
                bank_account_links::ActiveModel::from(&link).update(&db_tx).await?;
            } else {
                bank_account_links::ActiveModel::from(&link).insert(&db_tx).await?;
            }
            Ok(())
        })
    }

    pub async fn unlink_bank_account(
        &self,
        business_id: &str,
        source_ref: &str,
    ) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let existing = bank_account_links::Entity::find_by_id((
                business_id.to_string(),
                source_ref.to_string(),
            ))
            .one(&db_tx)
            .await?
            .ok_or_else(|| {
                LedgerError::NotFound(format!("bank account link {source_ref}"))
            })?;
            existing.delete(&db_tx).await?;
            Ok(())
        })
    }

    pub async fn bank_account_link(
        &self,
        business_id: &str,
        source_ref: &str,
    ) -> ResultLedger<Option<BankAccountLink>> {
        let model = bank_account_links::Entity::find_by_id((
            business_id.to_string(),
            source_ref.to_string(),
        ))
        .one(&self.database)
        .await?;
        model.map(BankAccountLink::try_from).transpose()
    }

    async fn require_bank_link(
        &self,
        db_tx: &DatabaseTransaction,
        business_id: &str,
        source_ref: &str,
    ) -> ResultLedger<BankAccountLink> {
        bank_account_links::Entity::find_by_id((
            business_id.to_string(),
            source_ref.to_string(),
        ))
        .one(db_tx)
        .await?
        .ok_or_else(|| LedgerError::UnlinkedBankSource {
            source: source_ref.to_string(),
        })?
        .try_into()
    }

    /// Lands raw rows delivered by a bank sync as pending transactions.
    ///
    /// Per-row degradation: a bad row is skipped and logged, the rest land.
    /// Re-delivered external ids are skipped silently into the summary.
    pub async fn ingest_bank_feed(
        &self,
        business_id: &str,
        rows: &[BankFeedRow],
        now: DateTime<Utc>,
    ) -> ResultLedger<ImportSummary> {
        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id).await?;
            let mut summary = ImportSummary::default();

            for row in rows {
                let prepared = normalize_required_text(&row.external_id, "external id")
                    .and_then(|external_id| {
                        normalize_required_text(&row.source_ref, "source reference")
                            .map(|source_ref| (external_id, source_ref))
                    });
                let (external_id, source_ref) = match prepared {
                    Ok(parts) => parts,
                    Err(err) => {
                        tracing::warn!("skipping bank feed row {}: {err}", row.external_id);
                        summary.skipped.push(SkippedRow {
                            label: row.external_id.clone(),
                            error: err.to_string(),
                        });
                        continue;
                    }
                };

                let duplicate = bank_transactions::Entity::find()
                    .filter(bank_transactions::Column::BusinessId.eq(business_id.to_string()))
                    .filter(bank_transactions::Column::ExternalId.eq(external_id.clone()))
                    .one(&db_tx)
                    .await?;
                if duplicate.is_some() {
                    summary.skipped.push(SkippedRow {
                        label: external_id,
                        error: "already ingested".to_string(),
                    });
                    continue;
                }

                let transaction = BankTransaction::new(
                    business_id.to_string(),
                    row.date,
                    row.description.trim().to_string(),
                    row.amount,
                    source_ref,
                    Some(external_id),
                    now,
                );
                bank_transactions::ActiveModel::from(&transaction)
                    .insert(&db_tx)
                    .await?;
                summary.imported += 1;
            }

            Ok(summary)
        })
    }

    /// Injects a synthetic pending transaction not backed by any bank feed.
    ///
    /// It enters the same review workflow as bank-sourced rows; accepting it
    /// requires an explicit [`MANUAL_SOURCE`] link (typically to a cash
    /// account); there is no implicit default.
    pub async fn create_manual_transaction(
        &self,
        cmd: ManualTransactionCmd,
        now: DateTime<Utc>,
    ) -> ResultLedger<Uuid> {
        if !cmd.amount.is_positive() {
            return Err(LedgerError::Validation(
                "manual transaction amount must be > 0".to_string(),
            ));
        }
        let description = normalize_required_text(&cmd.description, "description")?;
        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, &cmd.business_id).await?;
            let signed = match cmd.kind {
                ManualKind::Deposit => cmd.amount,
                ManualKind::Payment => -cmd.amount,
            };
            let transaction = BankTransaction::new(
                cmd.business_id.clone(),
                cmd.date,
                description,
                signed,
                MANUAL_SOURCE.to_string(),
                None,
                now,
            );
            bank_transactions::ActiveModel::from(&transaction)
                .insert(&db_tx)
                .await?;
            Ok(transaction.id)
        })
    }

    /// Accepts a pending transaction into a destination account, posting its
    /// balanced two-line journal entry.
    ///
    /// Funds that left the bank account credit the linked bank GL account and
    /// debit the destination; funds that entered do the opposite. The
    /// destination leg carries the class/vendor reporting dimensions. The
    /// posting is idempotent on the transaction id, so a retry can never
    /// double-post.
    pub async fn accept_transaction(
        &self,
        cmd: AcceptCmd,
        now: DateTime<Utc>,
    ) -> ResultLedger<Uuid> {
        with_tx!(self, |db_tx| {
            let transaction = self
                .require_transaction(&db_tx, &cmd.business_id, cmd.transaction_id)
                .await?;
            if transaction.status != BankTransactionStatus::Pending {
                return Err(LedgerError::InvalidState(format!(
                    "bank transaction {} is {}, not pending",
                    transaction.id,
                    transaction.status.as_str()
                )));
            }
            if transaction.amount.is_zero() {
                return Err(LedgerError::Validation(format!(
                    "bank transaction {} has no amount",
                    transaction.id
                )));
            }

            let destination_model = self
                .require_account(&db_tx, &cmd.business_id, cmd.account_id)
                .await?;
            let destination = Account::try_from(destination_model)?;
            if !destination.is_active {
                return Err(LedgerError::Validation(format!(
                    "account {} is inactive",
                    destination.id
                )));
            }

            let link = self
                .require_bank_link(&db_tx, &cmd.business_id, &transaction.source)
                .await?;

            let magnitude = transaction.amount.abs();
            let class_id = normalize_optional_text(cmd.class_id.as_deref());
            let vendor_id = normalize_optional_text(cmd.vendor_id.as_deref());
            let (bank_leg, mut destination_leg) = if transaction.amount.is_negative() {
                (
                    LineInput::credit(link.account_id, magnitude),
                    LineInput::debit(destination.id, magnitude),
                )
            } else {
                (
                    LineInput::debit(link.account_id, magnitude),
                    LineInput::credit(destination.id, magnitude),
                )
            };
            destination_leg.class_id = class_id.clone();
            destination_leg.vendor_id = vendor_id.clone();

            let description = normalize_optional_text(cmd.description.as_deref())
                .unwrap_or_else(|| transaction.description.clone());
            let source_type = if transaction.source == MANUAL_SOURCE {
                SourceType::Manual
            } else {
                SourceType::BankImport
            };
            let entry_cmd = PostEntryCmd::new(
                cmd.business_id.clone(),
                transaction.date,
                description,
                source_type,
                vec![bank_leg, destination_leg],
            )
            .idempotency_key(format!("bank-transaction-{}", transaction.id));
            let entry_id = self.create_posted_in_tx(&db_tx, entry_cmd, now).await?;

            let result = bank_transactions::Entity::update_many()
                .col_expr(
                    bank_transactions::Column::Status,
                    Expr::value(BankTransactionStatus::Accepted.as_str()),
                )
                .col_expr(
                    bank_transactions::Column::AcceptedAccountId,
                    Expr::value(Some(destination.id.to_string())),
                )
                .col_expr(
                    bank_transactions::Column::AcceptedGlAccountId,
                    Expr::value(Some(link.account_id.to_string())),
                )
                .col_expr(bank_transactions::Column::ClassId, Expr::value(class_id))
                .col_expr(bank_transactions::Column::VendorId, Expr::value(vendor_id))
                .col_expr(
                    bank_transactions::Column::JournalEntryId,
                    Expr::value(Some(entry_id.to_string())),
                )
                .col_expr(
                    bank_transactions::Column::LockVersion,
                    Expr::value(transaction.lock_version + 1),
                )
                .filter(bank_transactions::Column::Id.eq(transaction.id.to_string()))
                .filter(bank_transactions::Column::LockVersion.eq(transaction.lock_version))
                .exec(&db_tx)
                .await?;
            guard_rows_affected(result.rows_affected, transaction.id)?;

            Ok(entry_id)
        })
    }

    /// Returns an accepted transaction to pending by voiding its entire
    /// linked entry. Lines are never edited, so the original posting stays
    /// as an inert audit trail.
    pub async fn unaccept_transaction(
        &self,
        business_id: &str,
        transaction_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let transaction = self
                .require_transaction(&db_tx, business_id, transaction_id)
                .await?;
            if transaction.status != BankTransactionStatus::Accepted {
                return Err(LedgerError::InvalidState(format!(
                    "bank transaction {} is {}, not accepted",
                    transaction.id,
                    transaction.status.as_str()
                )));
            }
            let entry_id = transaction.journal_entry_id.ok_or_else(|| {
                LedgerError::InvalidState(format!(
                    "bank transaction {} has no linked journal entry",
                    transaction.id
                ))
            })?;

            self.void_entry_in_tx(&db_tx, business_id, entry_id, now).await?;

            let result = bank_transactions::Entity::update_many()
                .col_expr(
                    bank_transactions::Column::Status,
                    Expr::value(BankTransactionStatus::Pending.as_str()),
                )
                .col_expr(
                    bank_transactions::Column::AcceptedAccountId,
                    Expr::value(Option::<String>::None),
                )
                .col_expr(
                    bank_transactions::Column::AcceptedGlAccountId,
                    Expr::value(Option::<String>::None),
                )
                .col_expr(
                    bank_transactions::Column::ClassId,
                    Expr::value(Option::<String>::None),
                )
                .col_expr(
                    bank_transactions::Column::VendorId,
                    Expr::value(Option::<String>::None),
                )
                .col_expr(
                    bank_transactions::Column::JournalEntryId,
                    Expr::value(Option::<String>::None),
                )
                .col_expr(
                    bank_transactions::Column::LockVersion,
                    Expr::value(transaction.lock_version + 1),
                )
                .filter(bank_transactions::Column::Id.eq(transaction.id.to_string()))
                .filter(bank_transactions::Column::LockVersion.eq(transaction.lock_version))
                .exec(&db_tx)
                .await?;
            guard_rows_affected(result.rows_affected, transaction.id)?;

            Ok(())
        })
    }

    /// Excludes a pending transaction from the books, recording why. No
    /// journal entry is created.
    pub async fn exclude_transaction(
        &self,
        business_id: &str,
        transaction_id: Uuid,
        reason: &str,
    ) -> ResultLedger<()> {
        let reason = normalize_required_text(reason, "exclusion reason")?;
        with_tx!(self, |db_tx| {
            let transaction = self
                .require_transaction(&db_tx, business_id, transaction_id)
                .await?;
            if transaction.status != BankTransactionStatus::Pending {
                return Err(LedgerError::InvalidState(format!(
                    "bank transaction {} is {}, not pending",
                    transaction.id,
                    transaction.status.as_str()
                )));
            }

            let result = bank_transactions::Entity::update_many()
                .col_expr(
                    bank_transactions::Column::Status,
                    Expr::value(BankTransactionStatus::Excluded.as_str()),
                )
                .col_expr(
                    bank_transactions::Column::ExclusionReason,
                    Expr::value(Some(reason)),
                )
                .col_expr(
                    bank_transactions::Column::LockVersion,
                    Expr::value(transaction.lock_version + 1),
                )
                .filter(bank_transactions::Column::Id.eq(transaction.id.to_string()))
                .filter(bank_transactions::Column::LockVersion.eq(transaction.lock_version))
                .exec(&db_tx)
                .await?;
            guard_rows_affected(result.rows_affected, transaction.id)?;

            Ok(())
        })
    }

    /// Returns an excluded transaction to pending, clearing the recorded
    /// reason.
    pub async fn restore_transaction(
        &self,
        business_id: &str,
        transaction_id: Uuid,
    ) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let transaction = self
                .require_transaction(&db_tx, business_id, transaction_id)
                .await?;
            if transaction.status != BankTransactionStatus::Excluded {
                return Err(LedgerError::InvalidState(format!(
                    "bank transaction {} is {}, not excluded",
                    transaction.id,
                    transaction.status.as_str()
                )));
            }

            let result = bank_transactions::Entity::update_many()
                .col_expr(
                    bank_transactions::Column::Status,
                    Expr::value(BankTransactionStatus::Pending.as_str()),
                )
                .col_expr(
                    bank_transactions::Column::ExclusionReason,
                    Expr::value(Option::<String>::None),
                )
                .col_expr(
                    bank_transactions::Column::LockVersion,
                    Expr::value(transaction.lock_version + 1),
                )
                .filter(bank_transactions::Column::Id.eq(transaction.id.to_string()))
                .filter(bank_transactions::Column::LockVersion.eq(transaction.lock_version))
                .exec(&db_tx)
                .await?;
            guard_rows_affected(result.rows_affected, transaction.id)?;

            Ok(())
        })
    }

    pub async fn find_transaction(
        &self,
        business_id: &str,
        transaction_id: Uuid,
    ) -> ResultLedger<BankTransaction> {
        let model = bank_transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(bank_transactions::Column::BusinessId.eq(business_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| {
                LedgerError::NotFound(format!("bank transaction {transaction_id}"))
            })?;
        BankTransaction::try_from(model)
    }

    async fn require_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        business_id: &str,
        transaction_id: Uuid,
    ) -> ResultLedger<BankTransaction> {
        let model = bank_transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(bank_transactions::Column::BusinessId.eq(business_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| {
                LedgerError::NotFound(format!("bank transaction {transaction_id}"))
            })?;
        BankTransaction::try_from(model)
    }

    /// Lists raw transactions, oldest first.
    pub async fn list_transactions(
        &self,
        business_id: &str,
        filter: &TransactionListFilter,
    ) -> ResultLedger<Vec<BankTransaction>> {
        validate_list_filter(filter)?;
        self.require_business(&self.database, business_id).await?;

        let mut query = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::BusinessId.eq(business_id.to_string()));
        if let Some(from) = filter.from {
            query = query.filter(bank_transactions::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(bank_transactions::Column::Date.lte(to));
        }
        if let Some(statuses) = &filter.statuses {
            let statuses: Vec<String> =
                statuses.iter().map(|s| s.as_str().to_string()).collect();
            query = query.filter(bank_transactions::Column::Status.is_in(statuses));
        }

        let models = query
            .order_by_asc(bank_transactions::Column::Date)
            .order_by_asc(bank_transactions::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(BankTransaction::try_from).collect()
    }
}
