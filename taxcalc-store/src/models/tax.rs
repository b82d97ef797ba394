use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;

use super::from_millis;

/// Tax category as stored in `taxes.tax_code`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TaxCode {
    Food,
    Tobacco,
    Entertainment,
}

#[derive(Debug, Error)]
#[error("unknown tax code {0}")]
pub struct UnknownTaxCode(pub i64);

impl TaxCode {
    pub fn code(self) -> i64 {
        match self {
            Self::Food => 1,
            Self::Tobacco => 2,
            Self::Entertainment => 3,
        }
    }

    /// Human-readable category name
    pub fn name(self) -> &'static str {
        match self {
            Self::Food => "Food & Beverage",
            Self::Tobacco => "Tobacco",
            Self::Entertainment => "Entertainment",
        }
    }

    pub fn is_refundable(self) -> bool {
        matches!(self, Self::Food)
    }
}

impl TryFrom<i64> for TaxCode {
    type Error = UnknownTaxCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Food),
            2 => Ok(Self::Tobacco),
            3 => Ok(Self::Entertainment),
            other => Err(UnknownTaxCode(other)),
        }
    }
}

impl From<TaxCode> for i64 {
    fn from(code: TaxCode) -> Self {
        code.code()
    }
}

impl fmt::Display for TaxCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tax record from the `taxes` table
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Tax {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[sqlx(try_from = "i64")]
    pub tax_code: TaxCode,
    pub price: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Tax {
    pub fn created(&self) -> DateTime<Utc> {
        from_millis(self.created_at)
    }

    pub fn updated(&self) -> DateTime<Utc> {
        from_millis(self.updated_at)
    }
}

/// Input for inserting a tax item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTax {
    pub name: String,
    pub code: TaxCode,
    pub price: i64,
}

impl NewTax {
    pub fn new(name: impl Into<String>, code: TaxCode, price: i64) -> Self {
        Self {
            name: name.into(),
            code,
            price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_code_round_trips_through_storage_value() {
        for code in [TaxCode::Food, TaxCode::Tobacco, TaxCode::Entertainment] {
            assert_eq!(TaxCode::try_from(i64::from(code)).unwrap(), code);
        }
    }

    #[test]
    fn unknown_tax_code_is_rejected() {
        let err = TaxCode::try_from(9).unwrap_err();
        assert_eq!(err.to_string(), "unknown tax code 9");
    }

    #[test]
    fn only_food_is_refundable() {
        assert!(TaxCode::Food.is_refundable());
        assert!(!TaxCode::Tobacco.is_refundable());
        assert!(!TaxCode::Entertainment.is_refundable());
        assert_eq!(TaxCode::Food.to_string(), "Food & Beverage");
    }
}
