//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the ledger enforces consistent invariants.

use uuid::Uuid;

use crate::{LedgerError, ResultLedger, accounts::AccountType};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultLedger<Uuid> {
    Uuid::parse_str(value).map_err(|_| LedgerError::Validation(format!("invalid {label} id")))
}

pub(crate) fn parse_optional_uuid(value: Option<&str>, label: &str) -> ResultLedger<Option<Uuid>> {
    value.map(|raw| parse_uuid(raw, label)).transpose()
}

pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultLedger<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Validation(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// External code-prefix convention (1xxx asset .. 5xxx+ expense).
///
/// Classification, not code, drives all ledger math; this mapping exists only
/// so reconciliation can flag accounts whose code and type disagree.
pub(crate) fn conventional_type_for_code(code: &str) -> Option<AccountType> {
    match code.trim().chars().next()? {
        '1' => Some(AccountType::Asset),
        '2' => Some(AccountType::Liability),
        '3' => Some(AccountType::Equity),
        '4' => Some(AccountType::Revenue),
        '5'..='9' => Some(AccountType::Expense),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_prefix_convention() {
        assert_eq!(conventional_type_for_code("1010"), Some(AccountType::Asset));
        assert_eq!(
            conventional_type_for_code("2400"),
            Some(AccountType::Liability)
        );
        assert_eq!(
            conventional_type_for_code("3900"),
            Some(AccountType::Equity)
        );
        assert_eq!(
            conventional_type_for_code("4010"),
            Some(AccountType::Revenue)
        );
        assert_eq!(
            conventional_type_for_code("6200"),
            Some(AccountType::Expense)
        );
        assert_eq!(conventional_type_for_code("X-12"), None);
        assert_eq!(conventional_type_for_code(""), None);
    }
}
