//! Unit-of-measure master data.

use serde::{Deserialize, Serialize};

use larder_core::{DomainError, DomainResult, ValueObject};

use crate::code::UomCode;

/// A unit of measure: code plus an optional base-unit back-reference.
///
/// Base references form a shallow tree (gram → kilogram), never a general
/// graph — conversion still goes through explicit [`crate::UnitConversion`]
/// edges, the base link is classification only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitOfMeasure {
    code: UomCode,
    name: String,
    base: Option<UomCode>,
}

impl UnitOfMeasure {
    pub fn new(code: UomCode, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("unit name cannot be empty"));
        }
        Ok(Self {
            code,
            name,
            base: None,
        })
    }

    /// Attach the base unit (e.g. G based on KG). Self-reference is invalid.
    pub fn with_base(mut self, base: UomCode) -> DomainResult<Self> {
        if base == self.code {
            return Err(DomainError::validation("unit cannot be its own base"));
        }
        self.base = Some(base);
        Ok(self)
    }

    pub fn code(&self) -> &UomCode {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> Option<&UomCode> {
        self.base.as_ref()
    }
}

impl ValueObject for UnitOfMeasure {}

#[cfg(test)]
mod tests {
    use super::*;

    fn uom(code: &str) -> UomCode {
        UomCode::new(code).unwrap()
    }

    #[test]
    fn base_reference_is_optional() {
        let unit = UnitOfMeasure::new(uom("KG"), "Kilogram").unwrap();
        assert!(unit.base().is_none());

        let gram = UnitOfMeasure::new(uom("G"), "Gram")
            .unwrap()
            .with_base(uom("KG"))
            .unwrap();
        assert_eq!(gram.base(), Some(&uom("KG")));
    }

    #[test]
    fn self_base_is_rejected() {
        let result = UnitOfMeasure::new(uom("KG"), "Kilogram")
            .unwrap()
            .with_base(uom("KG"));
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
