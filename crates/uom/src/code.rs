//! Unit-of-measure code value object.

use serde::{Deserialize, Serialize};

use larder_core::{DomainError, DomainResult, ValueObject};

/// A unit-of-measure code (e.g. "KG", "L", "EA").
///
/// Codes are normalized to trimmed uppercase so "kg" and "KG " are the same
/// unit everywhere in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UomCode(String);

impl UomCode {
    pub fn new(code: impl Into<String>) -> DomainResult<Self> {
        let code = code.into().trim().to_uppercase();
        if code.is_empty() {
            return Err(DomainError::validation("unit code cannot be empty"));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for UomCode {}

impl core::fmt::Display for UomCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_normalized() {
        let code = UomCode::new("  kg ").unwrap();
        assert_eq!(code.as_str(), "KG");
        assert_eq!(code, UomCode::new("KG").unwrap());
    }

    #[test]
    fn empty_code_is_rejected() {
        assert!(matches!(
            UomCode::new("   "),
            Err(DomainError::Validation(_))
        ));
    }
}
