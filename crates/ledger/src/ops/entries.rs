use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    Account, LedgerError, MoneyCents, ResultLedger,
    accounts,
    commands::{BackfillEntry, BackfillLine, ImportSummary, LineInput, PostEntryCmd, SkippedRow},
    journal_entries::{self, EntryStatus, JournalEntry, SourceType},
    journal_entry_lines::{self, JournalEntryLine},
    util::parse_uuid,
};

use super::{Ledger, reports::net_balance, with_tx};

/// Filters for listing journal entries.
///
/// `from` and `to` are both inclusive (statement ranges are day-grained and
/// closed on both ends).
#[derive(Clone, Debug, Default)]
pub struct EntryListFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// If present, acts as an allow-list of source types to return.
    pub source_types: Option<Vec<SourceType>>,
    /// If true, includes void entries (default: false).
    pub include_void: bool,
}

fn validate_list_filter(filter: &EntryListFilter) -> ResultLedger<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(LedgerError::Validation(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    if filter.source_types.as_ref().is_some_and(|s| s.is_empty()) {
        return Err(LedgerError::Validation(
            "source_types must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Maps one backfill row to the canonical single-sided line shape.
///
/// Legacy exports carry both a debit and a credit field per row; the two are
/// netted here, once, so everything downstream only ever sees well-formed
/// lines.
fn normalize_backfill_line(
    line: &BackfillLine,
    account_id: Uuid,
) -> ResultLedger<LineInput> {
    if line.debit.is_negative() || line.credit.is_negative() {
        return Err(LedgerError::Validation(format!(
            "row for account {} has a negative side",
            line.account_code
        )));
    }
    let net = line.debit - line.credit;
    if net.is_zero() {
        return Err(LedgerError::Validation(format!(
            "row for account {} carries no amount",
            line.account_code
        )));
    }
    Ok(if net.is_positive() {
        LineInput::debit(account_id, net)
    } else {
        LineInput::credit(account_id, net.abs())
    })
}

impl Ledger {
    /// Creates and posts a balanced journal entry in one transaction.
    ///
    /// Rejects an empty line set, lines on unknown accounts, malformed lines,
    /// and any line set whose debits and credits differ by even one cent
    /// (with [`LedgerError::UnbalancedEntry`] carrying both sums). Nothing is
    /// ever auto-balanced with a plug line.
    ///
    /// When the command carries an idempotency key and an entry with that key
    /// already exists for the business, the existing entry's id is returned
    /// and nothing is written.
    pub async fn create_posted(
        &self,
        cmd: PostEntryCmd,
        created_at: DateTime<Utc>,
    ) -> ResultLedger<Uuid> {
        with_tx!(self, |db_tx| {
            self.create_posted_in_tx(&db_tx, cmd, created_at).await
        })
    }

    pub(crate) async fn create_posted_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: PostEntryCmd,
        created_at: DateTime<Utc>,
    ) -> ResultLedger<Uuid> {
        self.require_business(db_tx, &cmd.business_id).await?;

        if cmd.lines.is_empty() {
            return Err(LedgerError::Validation(
                "journal entry has no lines".to_string(),
            ));
        }

        if let Some(key) = cmd.idempotency_key.as_deref() {
            let existing = journal_entries::Entity::find()
                .filter(journal_entries::Column::BusinessId.eq(cmd.business_id.clone()))
                .filter(journal_entries::Column::IdempotencyKey.eq(key.to_string()))
                .one(db_tx)
                .await?;
            if let Some(existing) = existing {
                return parse_uuid(&existing.id, "journal entry");
            }
        }

        let entry_id = Uuid::new_v4();
        let mut loaded: HashMap<Uuid, Account> = HashMap::new();
        let mut total_debit = MoneyCents::ZERO;
        let mut total_credit = MoneyCents::ZERO;
        let mut lines = Vec::with_capacity(cmd.lines.len());

        for input in &cmd.lines {
            if !loaded.contains_key(&input.account_id) {
                let model = self
                    .require_account(db_tx, &cmd.business_id, input.account_id)
                    .await?;
                loaded.insert(input.account_id, Account::try_from(model)?);
            }
            let line = JournalEntryLine {
                id: Uuid::new_v4(),
                journal_entry_id: entry_id,
                account_id: input.account_id,
                debit: input.debit,
                credit: input.credit,
                class_id: input.class_id.clone(),
                vendor_id: input.vendor_id.clone(),
            };
            line.validate()?;
            total_debit += line.debit;
            total_credit += line.credit;
            lines.push(line);
        }

        if total_debit != total_credit {
            return Err(LedgerError::UnbalancedEntry {
                total_debit,
                total_credit,
            });
        }

        let entry = JournalEntry {
            id: entry_id,
            business_id: cmd.business_id.clone(),
            entry_number: self.next_entry_number(db_tx, &cmd.business_id).await?,
            entry_date: cmd.entry_date,
            status: EntryStatus::Posted,
            source_type: cmd.source_type,
            description: cmd.description.trim().to_string(),
            total_debit,
            idempotency_key: cmd.idempotency_key.clone(),
            created_at,
            voided_at: None,
            lines,
        };

        journal_entries::ActiveModel::from(&entry).insert(db_tx).await?;
        for line in &entry.lines {
            journal_entry_lines::ActiveModel::from(line).insert(db_tx).await?;
        }

        self.apply_cache_deltas(db_tx, &loaded, &entry.lines, 1).await?;

        Ok(entry_id)
    }

    /// Voids a posted entry (soft delete).
    ///
    /// Lines are retained for audit; the status filter excludes them from
    /// every aggregation. Fails with [`LedgerError::NotFound`] for an unknown
    /// entry and [`LedgerError::InvalidState`] for one that is already void
    /// (or never left draft).
    pub async fn void_entry(
        &self,
        business_id: &str,
        entry_id: Uuid,
        voided_at: DateTime<Utc>,
    ) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            self.void_entry_in_tx(&db_tx, business_id, entry_id, voided_at)
                .await
        })
    }

    pub(crate) async fn void_entry_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        business_id: &str,
        entry_id: Uuid,
        voided_at: DateTime<Utc>,
    ) -> ResultLedger<()> {
        let model = journal_entries::Entity::find_by_id(entry_id.to_string())
            .filter(journal_entries::Column::BusinessId.eq(business_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("journal entry {entry_id}")))?;
        let entry = JournalEntry::try_from(model)?;

        match entry.status {
            EntryStatus::Posted => {}
            EntryStatus::Void => {
                return Err(LedgerError::InvalidState(format!(
                    "journal entry {entry_id} is already void"
                )));
            }
            EntryStatus::Draft => {
                return Err(LedgerError::InvalidState(format!(
                    "journal entry {entry_id} was never posted"
                )));
            }
        }

        let line_models = journal_entry_lines::Entity::find()
            .filter(journal_entry_lines::Column::JournalEntryId.eq(entry_id.to_string()))
            .all(db_tx)
            .await?;
        let lines: Vec<JournalEntryLine> = line_models
            .into_iter()
            .map(JournalEntryLine::try_from)
            .collect::<ResultLedger<_>>()?;

        let mut loaded: HashMap<Uuid, Account> = HashMap::new();
        for line in &lines {
            if !loaded.contains_key(&line.account_id) {
                let model = self
                    .require_account(db_tx, business_id, line.account_id)
                    .await?;
                loaded.insert(line.account_id, Account::try_from(model)?);
            }
        }

        // Releasing the idempotency key lets a later re-acceptance of the
        // same source transaction post a fresh entry.
        let update = journal_entries::ActiveModel {
            id: ActiveValue::Set(entry_id.to_string()),
            status: ActiveValue::Set(EntryStatus::Void.as_str().to_string()),
            voided_at: ActiveValue::Set(Some(voided_at)),
            idempotency_key: ActiveValue::Set(None),
            ..Default::default()
        };
        update.update(db_tx).await?;

        self.apply_cache_deltas(db_tx, &loaded, &lines, -1).await?;

        Ok(())
    }

    /// Applies each line's effect (`direction` +1) or its reversal (−1) to
    /// the denormalized `current_balance` display column.
    async fn apply_cache_deltas(
        &self,
        db_tx: &DatabaseTransaction,
        loaded: &HashMap<Uuid, Account>,
        lines: &[JournalEntryLine],
        direction: i64,
    ) -> ResultLedger<()> {
        let mut deltas: HashMap<Uuid, MoneyCents> = HashMap::new();
        for line in lines {
            let account = loaded.get(&line.account_id).ok_or_else(|| {
                LedgerError::NotFound(format!("account {}", line.account_id))
            })?;
            let effect = net_balance(account.account_type, line.debit, line.credit);
            let signed = MoneyCents::new(effect.cents() * direction);
            *deltas.entry(line.account_id).or_default() += signed;
        }
        for (account_id, delta) in deltas {
            if delta.is_zero() {
                continue;
            }
            let account = loaded.get(&account_id).ok_or_else(|| {
                LedgerError::NotFound(format!("account {account_id}"))
            })?;
            let update = accounts::ActiveModel {
                id: ActiveValue::Set(account_id.to_string()),
                current_balance: ActiveValue::Set((account.current_balance + delta).cents()),
                ..Default::default()
            };
            update.update(db_tx).await?;
        }
        Ok(())
    }

    /// Backfills historical entries supplied by an external importer.
    ///
    /// Each logical entry is normalized and balance-validated before posting;
    /// a bad entry is skipped and logged, the rest land. Corrections
    /// routinely touch hundreds of rows, so one bad row must not block the
    /// batch.
    pub async fn import_entries(
        &self,
        business_id: &str,
        entries: &[BackfillEntry],
        created_at: DateTime<Utc>,
    ) -> ResultLedger<ImportSummary> {
        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id).await?;
            let mut summary = ImportSummary::default();

            'entries: for backfill in entries {
                let label = format!("{} {}", backfill.date, backfill.description);

                if backfill.lines.is_empty() {
                    tracing::warn!("skipping backfill entry {label}: no lines");
                    summary.skipped.push(SkippedRow {
                        label,
                        error: "entry has no lines".to_string(),
                    });
                    continue;
                }

                let mut lines = Vec::with_capacity(backfill.lines.len());
                for row in &backfill.lines {
                    let account_model = self
                        .find_active_account_by_code(&db_tx, business_id, &row.account_code)
                        .await?;
                    let normalized = match account_model {
                        Some(model) => parse_uuid(&model.id, "account")
                            .and_then(|account_id| normalize_backfill_line(row, account_id)),
                        None => Err(LedgerError::NotFound(format!(
                            "account code {}",
                            row.account_code
                        ))),
                    };
                    match normalized {
                        Ok(line) => lines.push(line),
                        Err(err) => {
                            tracing::warn!("skipping backfill entry {label}: {err}");
                            summary.skipped.push(SkippedRow {
                                label,
                                error: err.to_string(),
                            });
                            continue 'entries;
                        }
                    }
                }

                let cmd = PostEntryCmd::new(
                    business_id,
                    backfill.date,
                    backfill.description.clone(),
                    SourceType::System,
                    lines,
                );
                match self.create_posted_in_tx(&db_tx, cmd, created_at).await {
                    Ok(_) => summary.imported += 1,
                    Err(
                        err @ (LedgerError::Validation(_)
                        | LedgerError::UnbalancedEntry { .. }
                        | LedgerError::NotFound(_)),
                    ) => {
                        tracing::warn!("skipping backfill entry {label}: {err}");
                        summary.skipped.push(SkippedRow {
                            label,
                            error: err.to_string(),
                        });
                    }
                    Err(err) => return Err(err),
                }
            }

            Ok(summary)
        })
    }

    /// Loads one entry with its lines.
    pub async fn find_entry(
        &self,
        business_id: &str,
        entry_id: Uuid,
    ) -> ResultLedger<JournalEntry> {
        let model = journal_entries::Entity::find_by_id(entry_id.to_string())
            .filter(journal_entries::Column::BusinessId.eq(business_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("journal entry {entry_id}")))?;
        let mut entry = JournalEntry::try_from(model)?;
        let line_models = journal_entry_lines::Entity::find()
            .filter(journal_entry_lines::Column::JournalEntryId.eq(entry_id.to_string()))
            .all(&self.database)
            .await?;
        entry.lines = line_models
            .into_iter()
            .map(JournalEntryLine::try_from)
            .collect::<ResultLedger<_>>()?;
        Ok(entry)
    }

    /// Lists entry headers (no lines), oldest first. Void entries are hidden
    /// by default.
    pub async fn list_entries(
        &self,
        business_id: &str,
        filter: &EntryListFilter,
    ) -> ResultLedger<Vec<JournalEntry>> {
        validate_list_filter(filter)?;
        self.require_business(&self.database, business_id).await?;

        let mut query = journal_entries::Entity::find()
            .filter(journal_entries::Column::BusinessId.eq(business_id.to_string()));
        if let Some(from) = filter.from {
            query = query.filter(journal_entries::Column::EntryDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(journal_entries::Column::EntryDate.lte(to));
        }
        if !filter.include_void {
            query = query.filter(
                journal_entries::Column::Status.ne(EntryStatus::Void.as_str()),
            );
        }
        if let Some(sources) = &filter.source_types {
            let sources: Vec<String> =
                sources.iter().map(|s| s.as_str().to_string()).collect();
            query = query.filter(journal_entries::Column::SourceType.is_in(sources));
        }

        let models = query
            .order_by_asc(journal_entries::Column::EntryDate)
            .order_by_asc(journal_entries::Column::EntryNumber)
            .all(&self.database)
            .await?;
        models.into_iter().map(JournalEntry::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backfill_lines_net_dual_fields() {
        let account_id = Uuid::new_v4();
        let row = BackfillLine {
            account_code: "5100".to_string(),
            debit: MoneyCents::new(10_000),
            credit: MoneyCents::new(3_000),
        };
        let line = normalize_backfill_line(&row, account_id).unwrap();
        assert_eq!(line.debit, MoneyCents::new(7_000));
        assert_eq!(line.credit, MoneyCents::ZERO);

        let flipped = BackfillLine {
            account_code: "5100".to_string(),
            debit: MoneyCents::ZERO,
            credit: MoneyCents::new(4_500),
        };
        let line = normalize_backfill_line(&flipped, account_id).unwrap();
        assert_eq!(line.credit, MoneyCents::new(4_500));

        let empty = BackfillLine {
            account_code: "5100".to_string(),
            debit: MoneyCents::ZERO,
            credit: MoneyCents::ZERO,
        };
        assert!(normalize_backfill_line(&empty, account_id).is_err());
    }
}
