//! Monthly totals over recorded cash movements

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::DomainError;

/// A calendar month, as the half-open date range `[first, next_first)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalancePeriod {
    first: NaiveDate,
    next_first: NaiveDate,
}

impl BalancePeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, DomainError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| DomainError::InvalidPeriod(format!("{}-{:02} is not a calendar month", year, month)))?;
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| DomainError::InvalidPeriod(format!("{}-{:02} is out of range", year, month)))?;

        Ok(Self { first, next_first })
    }

    pub fn containing(date: NaiveDate) -> Result<Self, DomainError> {
        Self::new(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    /// First day of the following month, excluded from the period.
    pub fn end_exclusive(&self) -> NaiveDate {
        self.next_first
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementTotals {
    pub inflow: Decimal,
    pub outflow: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyBalance {
    pub year: i32,
    pub month: u32,
    pub inflow: Decimal,
    pub outflow: Decimal,
    /// Inflow minus outflow; negative when more left than arrived.
    pub difference: Decimal,
}

impl MonthlyBalance {
    pub fn new(period: BalancePeriod, totals: MovementTotals) -> Self {
        Self {
            year: period.year(),
            month: period.month(),
            inflow: totals.inflow,
            outflow: totals.outflow,
            difference: totals.inflow - totals.outflow,
        }
    }
}
