use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    Account, LedgerError, MoneyCents, ResultLedger,
    account_revisions::{self, AccountRevision},
    accounts::{self, AccountType},
    commands::{
        ChartImportRow, CreateAccountCmd, ImportSummary, LineInput, PostEntryCmd, Reclassification,
        SkippedRow, UpdateAccountCmd,
    },
    journal_entries::SourceType,
    util::normalize_required_text,
};

use super::{Ledger, normalize_code, reports::net_balance, with_tx};

/// Code and name of the equity account that absorbs imported opening
/// balances. Created on demand during chart bootstrap.
const OPENING_BALANCE_CODE: &str = "3900";
const OPENING_BALANCE_NAME: &str = "Opening Balances";

/// Fixed type-hint table for chart imports. Hints are matched
/// case-insensitively; anything unmapped buckets to
/// expense/operating_expense with a warning.
fn map_type_hint(hint: &str) -> Option<(AccountType, &'static str)> {
    let normalized = hint.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    let mapped = match normalized.as_str() {
        "bank" => (AccountType::Asset, "bank"),
        "accounts_receivable" => (AccountType::Asset, "accounts_receivable"),
        "other_current_asset" => (AccountType::Asset, "other_current_asset"),
        "fixed_asset" => (AccountType::Asset, "fixed_asset"),
        "other_asset" => (AccountType::Asset, "other_asset"),
        "accounts_payable" => (AccountType::Liability, "accounts_payable"),
        "credit_card" => (AccountType::Liability, "credit_card"),
        "other_current_liability" => (AccountType::Liability, "other_current_liability"),
        "long_term_liability" | "loan" => (AccountType::Liability, "long_term_liability"),
        "equity" => (AccountType::Equity, "equity"),
        "income" | "revenue" => (AccountType::Revenue, "farm_income"),
        "other_income" => (AccountType::Revenue, "other_income"),
        "cost_of_goods_sold" | "cogs" => (AccountType::Expense, "cost_of_goods_sold"),
        "expense" => (AccountType::Expense, "operating_expense"),
        "other_expense" => (AccountType::Expense, "other_expense"),
        _ => return None,
    };
    Some(mapped)
}

impl Ledger {
    /// Creates a chart-of-accounts account.
    ///
    /// The normal balance is derived from the type; it is not an input. Fails
    /// with [`LedgerError::DuplicateCode`] when an active account of the
    /// business already uses the code.
    pub async fn create_account(&self, cmd: CreateAccountCmd) -> ResultLedger<Uuid> {
        let code = normalize_code(&cmd.code)?;
        let name = normalize_required_text(&cmd.name, "account name")?;
        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, &cmd.business_id).await?;
            self.insert_account(&db_tx, &cmd.business_id, code, name, cmd.account_type, cmd.subtype)
                .await
        })
    }

    async fn insert_account(
        &self,
        db_tx: &DatabaseTransaction,
        business_id: &str,
        code: String,
        name: String,
        account_type: AccountType,
        subtype: Option<String>,
    ) -> ResultLedger<Uuid> {
        if self
            .find_active_account_by_code(db_tx, business_id, &code)
            .await?
            .is_some()
        {
            return Err(LedgerError::DuplicateCode { code });
        }
        let account = Account::new(business_id.to_string(), code, name, account_type, subtype);
        accounts::ActiveModel::from(&account).insert(db_tx).await?;
        Ok(account.id)
    }

    /// Updates name/classification/activation of an account.
    ///
    /// Changing the type always re-derives the normal balance. Deactivation
    /// goes through the same dependent-activity gate as
    /// [`deactivate_account`](Self::deactivate_account); reactivation
    /// re-checks code uniqueness among active accounts.
    pub async fn update_account(&self, cmd: UpdateAccountCmd) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_account(&db_tx, &cmd.business_id, cmd.account_id)
                .await?;
            let mut account = Account::try_from(model)?;

            if let Some(name) = cmd.name.as_deref() {
                account.name = normalize_required_text(name, "account name")?;
            }
            match (cmd.account_type, cmd.subtype) {
                (Some(account_type), subtype) => account.set_type(account_type, subtype),
                (None, Some(subtype)) => account.subtype = Some(subtype),
                (None, None) => {}
            }
            match cmd.is_active {
                Some(false) if account.is_active => {
                    self.check_no_dependent_activity(&db_tx, &account).await?;
                    account.is_active = false;
                }
                Some(true) if !account.is_active => {
                    if let Some(holder) = self
                        .find_active_account_by_code(&db_tx, &cmd.business_id, &account.code)
                        .await?
                        && holder.id != account.id.to_string()
                    {
                        return Err(LedgerError::DuplicateCode {
                            code: account.code.clone(),
                        });
                    }
                    account.is_active = true;
                }
                _ => {}
            }

            accounts::ActiveModel::from(&account).update(&db_tx).await?;
            Ok(())
        })
    }

    /// Soft-deactivates an account.
    ///
    /// Fails with [`LedgerError::HasDependentActivity`] when the account's
    /// all-time recomputed balance is non-zero, unless `force`. The row always
    /// stays; an account with posted lines is never hard-deleted.
    pub async fn deactivate_account(
        &self,
        business_id: &str,
        account_id: Uuid,
        force: bool,
    ) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, business_id, account_id).await?;
            let mut account = Account::try_from(model)?;
            if !account.is_active {
                return Err(LedgerError::InvalidState(format!(
                    "account {account_id} is already inactive"
                )));
            }
            if !force {
                self.check_no_dependent_activity(&db_tx, &account).await?;
            }
            account.is_active = false;
            accounts::ActiveModel::from(&account).update(&db_tx).await?;
            Ok(())
        })
    }

    async fn check_no_dependent_activity(
        &self,
        db_tx: &DatabaseTransaction,
        account: &Account,
    ) -> ResultLedger<()> {
        let sums = self
            .sum_posted_lines(db_tx, &account.business_id, Some(account.id), None, None)
            .await?;
        if let Some((debits, credits)) = sums.get(&account.id) {
            let balance = net_balance(account.account_type, *debits, *credits);
            if !balance.is_zero() {
                return Err(LedgerError::HasDependentActivity {
                    account_id: account.id,
                    balance,
                });
            }
        }
        Ok(())
    }

    /// Bulk retyping for chart corrections.
    ///
    /// One database transaction across all affected rows: all succeed or none
    /// do. Each changed account gets an audit revision carrying the reason.
    /// Returns the number of accounts changed.
    pub async fn reclassify_accounts(
        &self,
        business_id: &str,
        mapping: &[Reclassification],
        reason: &str,
        changed_at: DateTime<Utc>,
    ) -> ResultLedger<usize> {
        let reason = normalize_required_text(reason, "reclassification reason")?;
        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id).await?;
            let mut changed = 0;
            for row in mapping {
                let model = self
                    .find_active_account_by_code(&db_tx, business_id, &row.account_code)
                    .await?
                    .ok_or_else(|| {
                        LedgerError::NotFound(format!("account code {}", row.account_code))
                    })?;
                let mut account = Account::try_from(model)?;
                if account.account_type == row.new_type && account.subtype == row.new_subtype {
                    continue;
                }
                let revision = AccountRevision {
                    id: Uuid::new_v4(),
                    account_id: account.id,
                    old_type: account.account_type,
                    old_subtype: account.subtype.clone(),
                    new_type: row.new_type,
                    new_subtype: row.new_subtype.clone(),
                    reason: reason.clone(),
                    changed_at,
                };
                account.set_type(row.new_type, row.new_subtype.clone());
                accounts::ActiveModel::from(&account).update(&db_tx).await?;
                account_revisions::ActiveModel::from(&revision)
                    .insert(&db_tx)
                    .await?;
                changed += 1;
            }
            Ok(changed)
        })
    }

    /// Imports an externally supplied chart.
    ///
    /// Rows degrade per-row: a bad row is skipped and logged, the rest land.
    /// Unmapped type hints bucket to expense/operating_expense with a
    /// warning. Non-zero opening balances post one balanced system entry
    /// against the [`OPENING_BALANCE_CODE`] equity account, created on
    /// demand.
    pub async fn bootstrap_chart(
        &self,
        business_id: &str,
        rows: &[ChartImportRow],
        as_of: NaiveDate,
        now: DateTime<Utc>,
    ) -> ResultLedger<ImportSummary> {
        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id).await?;
            let mut summary = ImportSummary::default();
            let mut opening: Vec<(Uuid, accounts::NormalBalance, MoneyCents)> = Vec::new();

            for row in rows {
                let prepared = normalize_code(&row.code).and_then(|code| {
                    normalize_required_text(&row.name, "account name").map(|name| (code, name))
                });
                let (code, name) = match prepared {
                    Ok(parts) => parts,
                    Err(err) => {
                        tracing::warn!("skipping chart row {}: {err}", row.code);
                        summary.skipped.push(SkippedRow {
                            label: row.code.clone(),
                            error: err.to_string(),
                        });
                        continue;
                    }
                };

                let (account_type, subtype) = match map_type_hint(&row.type_hint) {
                    Some(mapped) => mapped,
                    None => {
                        let warning = format!(
                            "unmapped account type \"{}\" for code {code}; using expense/operating_expense",
                            row.type_hint
                        );
                        tracing::warn!("{warning}");
                        summary.warnings.push(warning);
                        (AccountType::Expense, "operating_expense")
                    }
                };

                match self
                    .insert_account(
                        &db_tx,
                        business_id,
                        code,
                        name,
                        account_type,
                        Some(subtype.to_string()),
                    )
                    .await
                {
                    Ok(account_id) => {
                        summary.imported += 1;
                        if !row.opening_balance.is_zero() {
                            let normal = accounts::NormalBalance::for_type(account_type);
                            opening.push((account_id, normal, row.opening_balance));
                        }
                    }
                    Err(err @ LedgerError::DuplicateCode { .. }) => {
                        tracing::warn!("skipping chart row {}: {err}", row.code);
                        summary.skipped.push(SkippedRow {
                            label: row.code.clone(),
                            error: err.to_string(),
                        });
                    }
                    Err(err) => return Err(err),
                }
            }

            if !opening.is_empty() {
                let lines = self
                    .opening_balance_lines(&db_tx, business_id, opening)
                    .await?;
                let cmd = PostEntryCmd::new(
                    business_id,
                    as_of,
                    "Opening balances import",
                    SourceType::System,
                    lines,
                );
                self.create_posted_in_tx(&db_tx, cmd, now).await?;
            }

            Ok(summary)
        })
    }

    /// Turns imported opening balances into one balanced line set, with the
    /// net plugged against the opening-balance equity account.
    async fn opening_balance_lines(
        &self,
        db_tx: &DatabaseTransaction,
        business_id: &str,
        opening: Vec<(Uuid, accounts::NormalBalance, MoneyCents)>,
    ) -> ResultLedger<Vec<LineInput>> {
        use accounts::NormalBalance;

        let mut lines = Vec::with_capacity(opening.len() + 1);
        // Debit-positive running total, used to size the equity plug.
        let mut net = MoneyCents::ZERO;
        for (account_id, normal, balance) in opening {
            let magnitude = balance.abs();
            let debit_side = match (normal, balance.is_negative()) {
                (NormalBalance::Debit, false) | (NormalBalance::Credit, true) => true,
                (NormalBalance::Debit, true) | (NormalBalance::Credit, false) => false,
            };
            if debit_side {
                net += magnitude;
                lines.push(LineInput::debit(account_id, magnitude));
            } else {
                net -= magnitude;
                lines.push(LineInput::credit(account_id, magnitude));
            }
        }

        if !net.is_zero() {
            let equity_id = match self
                .find_active_account_by_code(db_tx, business_id, OPENING_BALANCE_CODE)
                .await?
            {
                Some(model) => Account::try_from(model)?.id,
                None => {
                    self.insert_account(
                        db_tx,
                        business_id,
                        OPENING_BALANCE_CODE.to_string(),
                        OPENING_BALANCE_NAME.to_string(),
                        AccountType::Equity,
                        Some("opening_balance".to_string()),
                    )
                    .await?
                }
            };
            if net.is_positive() {
                lines.push(LineInput::credit(equity_id, net));
            } else {
                lines.push(LineInput::debit(equity_id, net.abs()));
            }
        }

        Ok(lines)
    }

    /// Recomputes the cached `current_balance` column for every account of
    /// the business from posted lines.
    ///
    /// The column is a display hint only; reports never read it. This exists
    /// to repair drift after out-of-band data surgery.
    pub async fn refresh_balances(&self, business_id: &str) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            self.require_business(&db_tx, business_id).await?;
            let account_models = accounts::Entity::find()
                .filter(accounts::Column::BusinessId.eq(business_id.to_string()))
                .all(&db_tx)
                .await?;
            let sums = self
                .sum_posted_lines(&db_tx, business_id, None, None, None)
                .await?;
            for model in account_models {
                let account = Account::try_from(model)?;
                let (debits, credits) = sums
                    .get(&account.id)
                    .copied()
                    .unwrap_or((MoneyCents::ZERO, MoneyCents::ZERO));
                let balance = net_balance(account.account_type, debits, credits);
                let update = accounts::ActiveModel {
                    id: ActiveValue::Set(account.id.to_string()),
                    current_balance: ActiveValue::Set(balance.cents()),
                    ..Default::default()
                };
                update.update(&db_tx).await?;
            }
            Ok(())
        })
    }

    /// Reclassification audit rows for one account, oldest first.
    pub async fn list_account_revisions(
        &self,
        business_id: &str,
        account_id: Uuid,
    ) -> ResultLedger<Vec<AccountRevision>> {
        self.require_account(&self.database, business_id, account_id)
            .await?;
        let models = account_revisions::Entity::find()
            .filter(account_revisions::Column::AccountId.eq(account_id.to_string()))
            .order_by_asc(account_revisions::Column::ChangedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(AccountRevision::try_from).collect()
    }

    pub async fn find_account(&self, business_id: &str, account_id: Uuid) -> ResultLedger<Account> {
        let model = self
            .require_account(&self.database, business_id, account_id)
            .await?;
        Account::try_from(model)
    }

    /// Lists the business's accounts ordered by code. Inactive accounts are
    /// included only on request.
    pub async fn list_accounts(
        &self,
        business_id: &str,
        include_inactive: bool,
    ) -> ResultLedger<Vec<Account>> {
        self.require_business(&self.database, business_id).await?;
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::BusinessId.eq(business_id.to_string()));
        if !include_inactive {
            query = query.filter(accounts::Column::IsActive.eq(true));
        }
        let models = query
            .order_by_asc(accounts::Column::Code)
            .all(&self.database)
            .await?;
        models.into_iter().map(Account::try_from).collect()
    }
}
