//! Obligation status engine
//!
//! A single pure classification shared by every read and write path. The
//! status of an obligation depends only on its amounts, its due date, and the
//! date it is evaluated against, so a stored status goes stale as soon as the
//! calendar moves past the due date and must be re-derived on read.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Lifecycle state of a payable or receivable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObligationStatus {
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    #[serde(rename = "Paid")]
    Paid,
    #[serde(rename = "Overdue")]
    Overdue,
}

impl ObligationStatus {
    pub const ALL: [ObligationStatus; 4] = [
        ObligationStatus::Pending,
        ObligationStatus::PartiallyPaid,
        ObligationStatus::Paid,
        ObligationStatus::Overdue,
    ];

    /// Value stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObligationStatus::Pending => "pending",
            ObligationStatus::PartiallyPaid => "partially_paid",
            ObligationStatus::Paid => "paid",
            ObligationStatus::Overdue => "overdue",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ObligationStatus::Pending => "Pending",
            ObligationStatus::PartiallyPaid => "Partially Paid",
            ObligationStatus::Paid => "Paid",
            ObligationStatus::Overdue => "Overdue",
        }
    }

    /// Accepts the stored value or the display label, case-insensitively.
    pub fn from_str(s: &str) -> Option<Self> {
        let wanted = s.trim();
        Self::ALL.into_iter().find(|status| {
            status.as_str().eq_ignore_ascii_case(wanted) || status.label().eq_ignore_ascii_case(wanted)
        })
    }
}

impl fmt::Display for ObligationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Listing filter over derived statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ObligationStatus),
}

impl StatusFilter {
    /// Parses a query-string value. Absent, empty, and `all` select everything.
    pub fn parse(raw: Option<&str>) -> Result<Self, DomainError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(StatusFilter::All),
            Some(value) if value.eq_ignore_ascii_case("all") => Ok(StatusFilter::All),
            Some(value) => ObligationStatus::from_str(value)
                .map(StatusFilter::Only)
                .ok_or_else(|| {
                    DomainError::InvalidObligationData(format!("unknown status filter {:?}", value))
                }),
        }
    }

    pub fn matches(&self, status: ObligationStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

/// Derives the status of an obligation as of `reference_date`.
///
/// Full payment wins over the calendar, and over-payment counts as paid.
/// An unpaid or partly paid obligation becomes overdue the day after its due
/// date; on the due date itself it is still current.
pub fn derive_status(
    total_amount: Decimal,
    amount_paid: Decimal,
    due_date: NaiveDate,
    reference_date: NaiveDate,
) -> Result<ObligationStatus, DomainError> {
    if total_amount.is_sign_negative() && !total_amount.is_zero() {
        return Err(DomainError::InvalidObligationData(format!(
            "total amount {} is negative",
            total_amount
        )));
    }
    if amount_paid.is_sign_negative() && !amount_paid.is_zero() {
        return Err(DomainError::InvalidObligationData(format!(
            "amount paid {} is negative",
            amount_paid
        )));
    }

    let past_due = due_date < reference_date;

    let status = if amount_paid >= total_amount {
        ObligationStatus::Paid
    } else if amount_paid.is_zero() {
        if past_due {
            ObligationStatus::Overdue
        } else {
            ObligationStatus::Pending
        }
    } else if amount_paid < total_amount {
        if past_due {
            ObligationStatus::Overdue
        } else {
            ObligationStatus::PartiallyPaid
        }
    } else {
        ObligationStatus::Pending
    };

    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn status(total: &str, paid: &str, due: &str, today: &str) -> ObligationStatus {
        derive_status(money(total), money(paid), date(due), date(today)).unwrap()
    }

    #[test]
    fn test_fully_paid_ignores_due_date() {
        assert_eq!(status("100.00", "100.00", "2020-01-01", "2025-01-01"), ObligationStatus::Paid);
        assert_eq!(status("100.00", "100.00", "2030-01-01", "2025-01-01"), ObligationStatus::Paid);
    }

    #[test]
    fn test_unpaid_past_due_is_overdue() {
        assert_eq!(status("50.00", "0", "2024-01-01", "2025-01-01"), ObligationStatus::Overdue);
    }

    #[test]
    fn test_unpaid_not_yet_due_is_pending() {
        assert_eq!(status("50.00", "0", "2030-01-01", "2025-01-01"), ObligationStatus::Pending);
    }

    #[test]
    fn test_partial_not_yet_due_is_partially_paid() {
        assert_eq!(
            status("100.00", "40.00", "2030-01-01", "2025-01-01"),
            ObligationStatus::PartiallyPaid
        );
    }

    #[test]
    fn test_partial_past_due_is_overdue() {
        assert_eq!(status("100.00", "40.00", "2020-01-01", "2025-01-01"), ObligationStatus::Overdue);
    }

    #[test]
    fn test_due_today_is_not_overdue() {
        assert_eq!(status("50.00", "0", "2025-01-01", "2025-01-01"), ObligationStatus::Pending);
        assert_eq!(
            status("50.00", "10", "2025-01-01", "2025-01-01"),
            ObligationStatus::PartiallyPaid
        );
        assert_eq!(status("50.00", "10", "2025-01-01", "2025-01-02"), ObligationStatus::Overdue);
    }

    #[test]
    fn test_exact_decimal_comparison() {
        // 0.1 + 0.2 is not 0.3 in binary floating point
        let paid = money("0.1") + money("0.2");
        assert_eq!(
            derive_status(money("0.30"), paid, date("2030-01-01"), date("2025-01-01")).unwrap(),
            ObligationStatus::Paid
        );
        assert_eq!(status("100.00", "99.99", "2030-01-01", "2025-01-01"), ObligationStatus::PartiallyPaid);
    }

    #[test]
    fn test_overpayment_is_paid() {
        assert_eq!(status("100.00", "120.00", "2020-01-01", "2025-01-01"), ObligationStatus::Paid);
    }

    #[test]
    fn test_zero_total_is_paid() {
        assert_eq!(status("0", "0", "2020-01-01", "2025-01-01"), ObligationStatus::Paid);
    }

    #[test]
    fn test_negative_amounts_are_rejected() {
        let err = derive_status(money("-1"), money("0"), date("2030-01-01"), date("2025-01-01"));
        assert!(matches!(err, Err(DomainError::InvalidObligationData(_))));
        let err = derive_status(money("10"), money("-0.01"), date("2030-01-01"), date("2025-01-01"));
        assert!(matches!(err, Err(DomainError::InvalidObligationData(_))));
    }

    #[test]
    fn test_negative_zero_is_accepted() {
        let negative_zero = -Decimal::ZERO;
        assert_eq!(
            derive_status(money("10"), negative_zero, date("2030-01-01"), date("2025-01-01")).unwrap(),
            ObligationStatus::Pending
        );
    }

    #[test]
    fn test_same_inputs_same_output() {
        let totals = ["0", "10", "100.00"];
        let paids = ["0", "5", "10", "150"];
        let dues = ["2024-12-31", "2025-01-01", "2025-01-02"];
        for total in totals {
            for paid in paids {
                for due in dues {
                    let first = status(total, paid, due, "2025-01-01");
                    let second = status(total, paid, due, "2025-01-01");
                    assert_eq!(first, second);
                    assert!(ObligationStatus::ALL.contains(&first));
                }
            }
        }
    }

    #[test]
    fn test_status_parsing_accepts_labels_and_stored_values() {
        assert_eq!(ObligationStatus::from_str("Partially Paid"), Some(ObligationStatus::PartiallyPaid));
        assert_eq!(ObligationStatus::from_str("partially_paid"), Some(ObligationStatus::PartiallyPaid));
        assert_eq!(ObligationStatus::from_str("OVERDUE"), Some(ObligationStatus::Overdue));
        assert_eq!(ObligationStatus::from_str("settled"), None);
    }

    #[test]
    fn test_status_serializes_with_labels() {
        let json = serde_json::to_string(&ObligationStatus::PartiallyPaid).unwrap();
        assert_eq!(json, "\"Partially Paid\"");
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!(StatusFilter::parse(None).unwrap(), StatusFilter::All);
        assert_eq!(StatusFilter::parse(Some("All")).unwrap(), StatusFilter::All);
        assert_eq!(
            StatusFilter::parse(Some("Paid")).unwrap(),
            StatusFilter::Only(ObligationStatus::Paid)
        );
        assert!(StatusFilter::parse(Some("whatever")).is_err());
        assert!(StatusFilter::Only(ObligationStatus::Paid).matches(ObligationStatus::Paid));
        assert!(!StatusFilter::Only(ObligationStatus::Paid).matches(ObligationStatus::Overdue));
    }
}
