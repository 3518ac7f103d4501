use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, JoinType, QueryFilter, QuerySelect, prelude::*};
use uuid::Uuid;

use crate::{
    Account, LedgerError, MoneyCents, ResultLedger,
    accounts::{self, AccountType},
    journal_entries::{self, EntryStatus},
    journal_entry_lines,
    reports::{AccountBalanceLine, BalanceSheet, IncomeStatement, ReportWarning},
    util::{conventional_type_for_code, parse_uuid},
};

use super::Ledger;

/// Synthetic display code for the computed current-earnings equity line on
/// the balance sheet.
const CURRENT_EARNINGS_CODE: &str = "3999";

/// Net balance under the account-type sign convention.
///
/// The table is asymmetric and classification-driven:
/// - revenue: Σcredit − Σdebit
/// - expense: Σdebit − Σcredit
/// - asset: Σdebit − Σcredit
/// - liability, equity: Σcredit − Σdebit
pub(crate) fn net_balance(
    account_type: AccountType,
    debits: MoneyCents,
    credits: MoneyCents,
) -> MoneyCents {
    match account_type {
        AccountType::Asset | AccountType::Expense => debits - credits,
        AccountType::Liability | AccountType::Equity | AccountType::Revenue => credits - debits,
    }
}

fn validate_range(from: NaiveDate, to: NaiveDate) -> ResultLedger<()> {
    if from > to {
        return Err(LedgerError::Validation(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    Ok(())
}

/// Flags appended for any reported account whose code prefix contradicts its
/// classification, or whose balance points against its normal direction.
/// Classification still drives all math; these exist for human review.
fn data_quality_warnings(account: &Account, balance: MoneyCents, warnings: &mut Vec<ReportWarning>) {
    if let Some(conventional) = conventional_type_for_code(&account.code)
        && conventional != account.account_type
    {
        warnings.push(ReportWarning::CodeTypeMismatch {
            account_id: account.id,
            code: account.code.clone(),
            classified: account.account_type,
            conventional,
        });
    }
    if balance.is_negative() {
        warnings.push(ReportWarning::AbnormalBalance {
            account_id: account.id,
            code: account.code.clone(),
            balance,
        });
    }
}

impl Ledger {
    /// Sums posted debits/credits per account over an inclusive date range.
    ///
    /// Only lines of entries with status=posted count; void entries stay in
    /// the tables but never in a sum. The cached balance column is not
    /// consulted anywhere on this path.
    pub(crate) async fn sum_posted_lines<C: ConnectionTrait>(
        &self,
        db: &C,
        business_id: &str,
        account_id: Option<Uuid>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ResultLedger<HashMap<Uuid, (MoneyCents, MoneyCents)>> {
        let mut query = journal_entry_lines::Entity::find()
            .join(
                JoinType::InnerJoin,
                journal_entry_lines::Relation::JournalEntries.def(),
            )
            .filter(journal_entries::Column::BusinessId.eq(business_id.to_string()))
            .filter(journal_entries::Column::Status.eq(EntryStatus::Posted.as_str()));
        if let Some(account_id) = account_id {
            query = query.filter(
                journal_entry_lines::Column::AccountId.eq(account_id.to_string()),
            );
        }
        if let Some(from) = from {
            query = query.filter(journal_entries::Column::EntryDate.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(journal_entries::Column::EntryDate.lte(to));
        }

        let line_models = query.all(db).await?;
        let mut sums: HashMap<Uuid, (MoneyCents, MoneyCents)> = HashMap::new();
        for model in line_models {
            let account_id = parse_uuid(&model.account_id, "account")?;
            let slot = sums
                .entry(account_id)
                .or_insert((MoneyCents::ZERO, MoneyCents::ZERO));
            slot.0 += MoneyCents::new(model.debit);
            slot.1 += MoneyCents::new(model.credit);
        }
        Ok(sums)
    }

    async fn accounts_by_id(
        &self,
        business_id: &str,
    ) -> ResultLedger<HashMap<Uuid, Account>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::BusinessId.eq(business_id.to_string()))
            .all(&self.database)
            .await?;
        let mut map = HashMap::with_capacity(models.len());
        for model in models {
            let account = Account::try_from(model)?;
            map.insert(account.id, account);
        }
        Ok(map)
    }

    /// Net balance of one account over an inclusive date range, recomputed
    /// from posted lines under the type sign convention.
    pub async fn account_balance(
        &self,
        business_id: &str,
        account_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ResultLedger<MoneyCents> {
        validate_range(from, to)?;
        let model = self
            .require_account(&self.database, business_id, account_id)
            .await?;
        let account = Account::try_from(model)?;
        let sums = self
            .sum_posted_lines(&self.database, business_id, Some(account_id), Some(from), Some(to))
            .await?;
        let (debits, credits) = sums
            .get(&account_id)
            .copied()
            .unwrap_or((MoneyCents::ZERO, MoneyCents::ZERO));
        Ok(net_balance(account.account_type, debits, credits))
    }

    /// Income statement over an inclusive date range: revenue and expense
    /// accounts with activity in range, and a net of exactly revenue minus
    /// expenses.
    pub async fn income_statement(
        &self,
        business_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ResultLedger<IncomeStatement> {
        validate_range(from, to)?;
        self.require_business(&self.database, business_id).await?;

        let accounts_by_id = self.accounts_by_id(business_id).await?;
        let sums = self
            .sum_posted_lines(&self.database, business_id, None, Some(from), Some(to))
            .await?;

        let mut revenue = Vec::new();
        let mut expenses = Vec::new();
        let mut warnings = Vec::new();

        for (account_id, (debits, credits)) in &sums {
            let account = accounts_by_id.get(account_id).ok_or_else(|| {
                LedgerError::NotFound(format!("account {account_id}"))
            })?;
            let balance = net_balance(account.account_type, *debits, *credits);
            data_quality_warnings(account, balance, &mut warnings);
            let line = AccountBalanceLine {
                account_id: account.id,
                code: account.code.clone(),
                name: account.name.clone(),
                account_type: account.account_type,
                subtype: account.subtype.clone(),
                balance,
            };
            match account.account_type {
                AccountType::Revenue => revenue.push(line),
                AccountType::Expense => expenses.push(line),
                _ => {}
            }
        }

        revenue.sort_by(|a, b| a.code.cmp(&b.code));
        expenses.sort_by(|a, b| a.code.cmp(&b.code));

        let total_revenue: MoneyCents = revenue.iter().map(|line| line.balance).sum();
        let total_expenses: MoneyCents = expenses.iter().map(|line| line.balance).sum();

        Ok(IncomeStatement {
            from,
            to,
            revenue,
            expenses,
            total_revenue,
            total_expenses,
            net_income: total_revenue - total_expenses,
            warnings,
        })
    }

    /// Balance sheet as of a date, from cumulative-since-inception sums (the
    /// range-bounded income statement is the intentional asymmetry, not a
    /// bug).
    ///
    /// Unclosed revenue and expense activity rolls up into a computed
    /// current-earnings equity line, so the structural identity Σasset ==
    /// Σliability + Σequity holds for a clean ledger. A violation is
    /// surfaced as a warning; it usually means mis-classification or
    /// out-of-band row surgery, and a bookkeeper needs the statement either
    /// way.
    pub async fn balance_sheet(
        &self,
        business_id: &str,
        as_of: NaiveDate,
    ) -> ResultLedger<BalanceSheet> {
        self.require_business(&self.database, business_id).await?;

        let accounts_by_id = self.accounts_by_id(business_id).await?;
        let sums = self
            .sum_posted_lines(&self.database, business_id, None, None, Some(as_of))
            .await?;

        let mut assets = Vec::new();
        let mut liabilities = Vec::new();
        let mut equity = Vec::new();
        let mut warnings = Vec::new();
        let mut earnings = MoneyCents::ZERO;

        for (account_id, (debits, credits)) in &sums {
            let account = accounts_by_id.get(account_id).ok_or_else(|| {
                LedgerError::NotFound(format!("account {account_id}"))
            })?;
            let balance = net_balance(account.account_type, *debits, *credits);
            data_quality_warnings(account, balance, &mut warnings);
            let line = AccountBalanceLine {
                account_id: account.id,
                code: account.code.clone(),
                name: account.name.clone(),
                account_type: account.account_type,
                subtype: account.subtype.clone(),
                balance,
            };
            match account.account_type {
                AccountType::Asset => assets.push(line),
                AccountType::Liability => liabilities.push(line),
                AccountType::Equity => equity.push(line),
                AccountType::Revenue => earnings += balance,
                AccountType::Expense => earnings -= balance,
            }
        }

        assets.sort_by(|a, b| a.code.cmp(&b.code));
        liabilities.sort_by(|a, b| a.code.cmp(&b.code));
        equity.sort_by(|a, b| a.code.cmp(&b.code));

        if !earnings.is_zero() {
            equity.push(AccountBalanceLine {
                account_id: Uuid::nil(),
                code: CURRENT_EARNINGS_CODE.to_string(),
                name: "Current Earnings".to_string(),
                account_type: AccountType::Equity,
                subtype: Some("calculated".to_string()),
                balance: earnings,
            });
        }

        let total_assets: MoneyCents = assets.iter().map(|line| line.balance).sum();
        let total_liabilities: MoneyCents = liabilities.iter().map(|line| line.balance).sum();
        let total_equity: MoneyCents = equity.iter().map(|line| line.balance).sum();

        let difference = total_assets - (total_liabilities + total_equity);
        if !difference.is_zero() {
            warnings.push(ReportWarning::IdentityMismatch {
                total_assets,
                total_liabilities_and_equity: total_liabilities + total_equity,
                difference,
            });
        }

        Ok(BalanceSheet {
            as_of,
            assets,
            liabilities,
            equity,
            total_assets,
            total_liabilities,
            total_equity,
            warnings,
        })
    }

    /// Chart-wide reconciliation flags for human review: code/type
    /// disagreements and all-time balances pointing against the normal
    /// direction. Never fails on data quality; that is the point.
    pub async fn reconciliation_report(
        &self,
        business_id: &str,
    ) -> ResultLedger<Vec<ReportWarning>> {
        self.require_business(&self.database, business_id).await?;

        let accounts_by_id = self.accounts_by_id(business_id).await?;
        let sums = self
            .sum_posted_lines(&self.database, business_id, None, None, None)
            .await?;

        let mut accounts: Vec<&Account> = accounts_by_id.values().collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));

        let mut warnings = Vec::new();
        for account in accounts {
            let (debits, credits) = sums
                .get(&account.id)
                .copied()
                .unwrap_or((MoneyCents::ZERO, MoneyCents::ZERO));
            let balance = net_balance(account.account_type, debits, credits);
            data_quality_warnings(account, balance, &mut warnings);
        }
        Ok(warnings)
    }
}
