//! Unit conversion edge value object.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{DomainError, DomainResult, ValueObject};

use crate::code::UomCode;

/// A directed conversion edge `(from → to, factor)`, unique per ordered pair
/// within a tenant.
///
/// `to_qty = from_qty * factor`; applied in reverse, `from_qty = to_qty / factor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitConversion {
    from: UomCode,
    to: UomCode,
    factor: Decimal,
}

impl UnitConversion {
    pub fn new(from: UomCode, to: UomCode, factor: Decimal) -> DomainResult<Self> {
        if from == to {
            return Err(DomainError::validation(
                "conversion endpoints cannot be the same unit",
            ));
        }
        if factor <= Decimal::ZERO {
            return Err(DomainError::validation("conversion factor must be > 0"));
        }
        Ok(Self { from, to, factor })
    }

    pub fn from_uom(&self) -> &UomCode {
        &self.from
    }

    pub fn to_uom(&self) -> &UomCode {
        &self.to
    }

    pub fn factor(&self) -> Decimal {
        self.factor
    }

    /// Apply the edge in its stored direction.
    pub fn apply(&self, qty: Decimal) -> Decimal {
        qty * self.factor
    }

    /// Apply the edge against its stored direction (divide; factor is
    /// validated non-zero at construction).
    pub fn apply_inverse(&self, qty: Decimal) -> Decimal {
        qty / self.factor
    }
}

impl ValueObject for UnitConversion {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn uom(code: &str) -> UomCode {
        UomCode::new(code).unwrap()
    }

    #[test]
    fn apply_multiplies_by_factor() {
        let edge = UnitConversion::new(uom("BOX"), uom("EA"), dec!(12)).unwrap();
        assert_eq!(edge.apply(dec!(5)), dec!(60));
    }

    #[test]
    fn apply_inverse_divides() {
        let edge = UnitConversion::new(uom("KG"), uom("G"), dec!(1000)).unwrap();
        assert_eq!(edge.apply_inverse(dec!(250)), dec!(0.25));
    }

    #[test]
    fn non_positive_factor_is_rejected() {
        assert!(UnitConversion::new(uom("A"), uom("B"), dec!(0)).is_err());
        assert!(UnitConversion::new(uom("A"), uom("B"), dec!(-2)).is_err());
    }

    #[test]
    fn same_unit_edge_is_rejected() {
        assert!(UnitConversion::new(uom("EA"), uom("EA"), dec!(1)).is_err());
    }
}
