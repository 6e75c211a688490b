// ============================================================================
// Parish Core - Obligation Entity
// File: crates/parish-core/src/domain/obligation.rs
// Description: Payables, receivables and their linked cash movements
// ============================================================================

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use parish_shared::constants::{MAX_AMOUNT_INTEGER_DIGITS, MAX_AMOUNT_SCALE};

use crate::domain::obligation_status::{derive_status, ObligationStatus};
use crate::error::DomainError;

/// Which side of the ledger an obligation sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObligationKind {
    Payable,
    Receivable,
}

impl ObligationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObligationKind::Payable => "payable",
            ObligationKind::Receivable => "receivable",
        }
    }

    /// Accepts the singular or the plural form used in routes.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "payable" | "payables" => Some(ObligationKind::Payable),
            "receivable" | "receivables" => Some(ObligationKind::Receivable),
            _ => None,
        }
    }

    /// Cash leaves for payables and arrives for receivables.
    pub fn movement_direction(&self) -> MovementDirection {
        match self {
            ObligationKind::Payable => MovementDirection::Outflow,
            ObligationKind::Receivable => MovementDirection::Inflow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    Inflow,
    Outflow,
}

impl MovementDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementDirection::Inflow => "inflow",
            MovementDirection::Outflow => "outflow",
        }
    }
}

/// Stored obligation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
    pub id: i64,
    pub kind: ObligationKind,
    pub note: String,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub due_date: NaiveDate,
    pub status: ObligationStatus,
}

impl Obligation {
    /// Re-derives the status against `today`, returning whether it changed.
    pub fn refresh_status(&mut self, today: NaiveDate) -> Result<bool, DomainError> {
        let derived = derive_status(self.total_amount, self.amount_paid, self.due_date, today)?;
        let changed = derived != self.status;
        self.status = derived;
        Ok(changed)
    }
}

/// Obligation fields as submitted by a form
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ObligationInput {
    pub id: Option<i64>,

    #[validate(length(min = 1, max = 500, message = "Note must be between 1 and 500 characters"))]
    pub note: String,

    pub total_amount: String,
    pub amount_paid: String,
    pub due_date: String,
}

impl ObligationInput {
    pub fn parse(&self) -> Result<ObligationDraft, DomainError> {
        self.validate()
            .map_err(|e| DomainError::InvalidObligationData(e.to_string()))?;

        Ok(ObligationDraft {
            id: self.id,
            note: self.note.trim().to_string(),
            total_amount: parse_amount("total_amount", &self.total_amount)?,
            amount_paid: parse_amount("amount_paid", &self.amount_paid)?,
            due_date: parse_date("due_date", &self.due_date)?,
        })
    }
}

/// Validated obligation fields, ready for status derivation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObligationDraft {
    pub id: Option<i64>,
    pub note: String,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub due_date: NaiveDate,
}

impl ObligationDraft {
    pub fn status_on(&self, today: NaiveDate) -> Result<ObligationStatus, DomainError> {
        derive_status(self.total_amount, self.amount_paid, self.due_date, today)
    }

    pub fn into_obligation(self, id: i64, kind: ObligationKind, status: ObligationStatus) -> Obligation {
        Obligation {
            id,
            kind,
            note: self.note,
            total_amount: self.total_amount,
            amount_paid: self.amount_paid,
            due_date: self.due_date,
            status,
        }
    }
}

/// Payment registered together with a new obligation
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CashMovementInput {
    #[validate(length(min = 1, max = 100, message = "Category must be between 1 and 100 characters"))]
    pub category: String,

    #[validate(length(min = 1, max = 100, message = "Payment method must be between 1 and 100 characters"))]
    pub payment_method: String,

    pub occurred_on: String,
}

impl CashMovementInput {
    /// The moved amount is the amount already paid on the obligation.
    pub fn parse(&self, kind: ObligationKind, amount: Decimal) -> Result<CashMovement, DomainError> {
        self.validate()
            .map_err(|e| DomainError::InvalidObligationData(e.to_string()))?;

        Ok(CashMovement {
            direction: kind.movement_direction(),
            category: self.category.trim().to_string(),
            payment_method: self.payment_method.trim().to_string(),
            amount,
            occurred_on: parse_date("occurred_on", &self.occurred_on)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashMovement {
    pub direction: MovementDirection,
    pub category: String,
    pub payment_method: String,
    pub amount: Decimal,
    pub occurred_on: NaiveDate,
}

fn parse_amount(field: &str, raw: &str) -> Result<Decimal, DomainError> {
    let trimmed = raw.trim();
    // Forms may use a decimal comma
    let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replace(',', ".")
    } else {
        trimmed.to_string()
    };

    let amount: Decimal = normalized
        .parse()
        .map_err(|_| DomainError::InvalidObligationData(format!("{} {:?} is not a decimal amount", field, raw)))?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(DomainError::InvalidObligationData(format!("{} must not be negative", field)));
    }
    // Anything finer than the stored scale would be rounded on write and
    // could classify differently once read back
    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(DomainError::InvalidObligationData(format!(
            "{} must have at most {} decimal places",
            field, MAX_AMOUNT_SCALE
        )));
    }
    if amount.trunc() >= Decimal::new(10_i64.pow(MAX_AMOUNT_INTEGER_DIGITS), 0) {
        return Err(DomainError::InvalidObligationData(format!(
            "{} must have at most {} integer digits",
            field, MAX_AMOUNT_INTEGER_DIGITS
        )));
    }
    Ok(amount)
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, DomainError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive()))
        .map_err(|_| DomainError::InvalidObligationData(format!("{} {:?} is not a date", field, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(total: &str, paid: &str, due: &str) -> ObligationInput {
        ObligationInput {
            id: None,
            note: "Electricity bill".into(),
            total_amount: total.into(),
            amount_paid: paid.into(),
            due_date: due.into(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_valid_input() {
        let draft = input("150.75", "0", "2025-03-10").parse().unwrap();
        assert_eq!(draft.total_amount, Decimal::new(15075, 2));
        assert_eq!(draft.amount_paid, Decimal::ZERO);
        assert_eq!(draft.due_date, date("2025-03-10"));
    }

    #[test]
    fn test_parse_accepts_decimal_comma_and_timestamps() {
        let draft = input("99,90", "10", "2025-03-10T03:00:00.000Z").parse().unwrap();
        assert_eq!(draft.total_amount, Decimal::new(9990, 2));
        assert_eq!(draft.due_date, date("2025-03-10"));
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for bad in [
            input("abc", "0", "2025-03-10"),
            input("10", "-5", "2025-03-10"),
            input("10", "0", "10/03/2025"),
            input("10", "0", ""),
        ] {
            assert!(matches!(bad.parse(), Err(DomainError::InvalidObligationData(_))));
        }
    }

    #[test]
    fn test_parse_rejects_amounts_finer_than_cents() {
        let err = input("100", "99.999", "2025-03-10").parse().unwrap_err();
        assert!(matches!(err, DomainError::InvalidObligationData(ref msg) if msg.contains("decimal places")));

        // Trailing zeros are not extra precision
        let draft = input("100.000", "99.990", "2025-03-10").parse().unwrap();
        assert_eq!(draft.amount_paid, Decimal::new(9999, 2));
    }

    #[test]
    fn test_parse_rejects_amounts_beyond_column_range() {
        assert!(input("999999999999.99", "0", "2025-03-10").parse().is_ok());

        let err = input("1000000000000", "0", "2025-03-10").parse().unwrap_err();
        assert!(matches!(err, DomainError::InvalidObligationData(ref msg) if msg.contains("integer digits")));
        assert!(input("10", "1000000000000000", "2025-03-10").parse().is_err());
    }

    #[test]
    fn test_parse_rejects_empty_note() {
        let mut bad = input("10", "0", "2025-03-10");
        bad.note = String::new();
        assert!(matches!(bad.parse(), Err(DomainError::InvalidObligationData(_))));
    }

    #[test]
    fn test_refresh_status_reports_changes() {
        let mut obligation = input("100", "40", "2025-01-10")
            .parse()
            .unwrap()
            .into_obligation(7, ObligationKind::Payable, ObligationStatus::PartiallyPaid);

        assert!(!obligation.refresh_status(date("2025-01-10")).unwrap());
        assert!(obligation.refresh_status(date("2025-01-11")).unwrap());
        assert_eq!(obligation.status, ObligationStatus::Overdue);
    }

    #[test]
    fn test_movement_direction_follows_kind() {
        let movement = CashMovementInput {
            category: "Utilities".into(),
            payment_method: "Bank transfer".into(),
            occurred_on: "2025-01-05".into(),
        }
        .parse(ObligationKind::Payable, Decimal::new(40, 0))
        .unwrap();

        assert_eq!(movement.direction, MovementDirection::Outflow);
        assert_eq!(ObligationKind::Receivable.movement_direction(), MovementDirection::Inflow);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(ObligationKind::from_str("payables"), Some(ObligationKind::Payable));
        assert_eq!(ObligationKind::from_str("Receivable"), Some(ObligationKind::Receivable));
        assert_eq!(ObligationKind::from_str("members"), None);
    }
}
