//! Units of measure: codes, conversion edges, and the one-hop resolver.
//!
//! Conversion is deliberately **one-hop**: a direct edge, or the algebraic
//! inverse of the single opposite edge. No transitive chaining — callers that
//! need multi-unit chains pre-populate direct conversions.

pub mod code;
pub mod conversion;
pub mod resolver;
pub mod unit;

pub use code::UomCode;
pub use conversion::UnitConversion;
pub use resolver::{ConversionResolver, ConversionSource};
pub use unit::UnitOfMeasure;
