//! Financial statement shapes.
//!
//! These are the read-side DTOs the presentation layer consumes. They are
//! plain serializable values: the report engine fills them from posted lines
//! at request time and nothing in here writes back.
//!
//! Data-quality anomalies ride along as [`ReportWarning`]s instead of
//! failing the report: a bookkeeper investigating a reconciliation gap needs
//! the statement *and* the flags, not an error page.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MoneyCents, accounts::AccountType};

/// One account's contribution to a statement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountBalanceLine {
    pub account_id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub subtype: Option<String>,
    pub balance: MoneyCents,
}

/// Revenue minus expenses over a date range, grouped by account and filtered
/// to accounts with activity in range.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub revenue: Vec<AccountBalanceLine>,
    pub expenses: Vec<AccountBalanceLine>,
    pub total_revenue: MoneyCents,
    pub total_expenses: MoneyCents,
    /// Exactly `total_revenue - total_expenses`; may be negative.
    pub net_income: MoneyCents,
    pub warnings: Vec<ReportWarning>,
}

/// Assets versus liabilities plus equity as of a date, from
/// cumulative-since-inception sums (not range-bounded; intentional asymmetry
/// with the income statement).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub assets: Vec<AccountBalanceLine>,
    pub liabilities: Vec<AccountBalanceLine>,
    pub equity: Vec<AccountBalanceLine>,
    pub total_assets: MoneyCents,
    pub total_liabilities: MoneyCents,
    pub total_equity: MoneyCents,
    pub warnings: Vec<ReportWarning>,
}

/// Non-fatal reconciliation flags attached to reports.
///
/// Violations typically trace to account mis-classification, not ledger-math
/// errors, so they are surfaced for human review rather than rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportWarning {
    /// Σasset != Σliability + Σequity as of the report date.
    IdentityMismatch {
        total_assets: MoneyCents,
        total_liabilities_and_equity: MoneyCents,
        difference: MoneyCents,
    },
    /// The account's classified type contradicts its code prefix (e.g. a
    /// "4xxx"-coded account typed as asset). Classification drives the math;
    /// this flag exists so someone looks at it.
    CodeTypeMismatch {
        account_id: Uuid,
        code: String,
        classified: AccountType,
        conventional: AccountType,
    },
    /// The account's computed balance points against its normal balance
    /// direction.
    AbnormalBalance {
        account_id: Uuid,
        code: String,
        balance: MoneyCents,
    },
}
