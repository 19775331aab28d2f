use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{AggregateId, DomainError, DomainResult, TenantId, UserId, domain_id};
use larder_inventory::{ItemId, LocationId};

domain_id!(
    /// Ledger entry identifier.
    EntryId
);

/// What kind of stock movement produced an entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    Receipt,
    Depletion,
    Waste,
    Transfer,
    Expiry,
    Adjustment,
    Reversal,
}

impl core::fmt::Display for EntrySource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            EntrySource::Receipt => "receipt",
            EntrySource::Depletion => "depletion",
            EntrySource::Waste => "waste",
            EntrySource::Transfer => "transfer",
            EntrySource::Expiry => "expiry",
            EntrySource::Adjustment => "adjustment",
            EntrySource::Reversal => "reversal",
        };
        f.write_str(s)
    }
}

/// One immutable signed-quantity record.
///
/// `quantity` carries the sign (positive = stock in, negative = stock out);
/// `unit_cost` values the movement. `source_ref` points at the domain record
/// that caused it (lot, depletion, job), `reverses` at the entry a
/// compensating entry undoes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub tenant_id: TenantId,
    pub item_id: ItemId,
    pub location_id: LocationId,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub source: EntrySource,
    pub source_ref: AggregateId,
    pub reverses: Option<EntryId>,
    pub occurred_at: DateTime<Utc>,
    pub recorded_by: Option<UserId>,
    /// Free-form audit note (waste reason, adjustment justification).
    pub note: Option<String>,
}

impl LedgerEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_id: TenantId,
        item_id: ItemId,
        location_id: LocationId,
        quantity: Decimal,
        unit_cost: Decimal,
        source: EntrySource,
        source_ref: AggregateId,
        occurred_at: DateTime<Utc>,
        recorded_by: Option<UserId>,
    ) -> DomainResult<Self> {
        if quantity == Decimal::ZERO {
            return Err(DomainError::validation("entry quantity cannot be zero"));
        }
        if unit_cost < Decimal::ZERO {
            return Err(DomainError::validation("entry unit cost cannot be negative"));
        }
        Ok(Self {
            id: EntryId::new(),
            tenant_id,
            item_id,
            location_id,
            quantity,
            unit_cost,
            source,
            source_ref,
            reverses: None,
            occurred_at,
            recorded_by,
            note: None,
        })
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Build the compensating entry for `original`: opposite sign, same
    /// item/location/cost, back-reference to the entry being undone.
    pub fn reversing(
        original: &LedgerEntry,
        source_ref: AggregateId,
        occurred_at: DateTime<Utc>,
        recorded_by: Option<UserId>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            tenant_id: original.tenant_id,
            item_id: original.item_id,
            location_id: original.location_id,
            quantity: -original.quantity,
            unit_cost: original.unit_cost,
            source: EntrySource::Reversal,
            source_ref,
            reverses: Some(original.id),
            occurred_at,
            recorded_by,
            note: None,
        }
    }

    /// Movement value (signed): `quantity × unit_cost`.
    pub fn value(&self) -> Decimal {
        self.quantity * self.unit_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_quantity_entry_is_rejected() {
        let result = LedgerEntry::new(
            TenantId::new(),
            ItemId::new(),
            LocationId::new(),
            dec!(0),
            dec!(1),
            EntrySource::Receipt,
            AggregateId::new(),
            Utc::now(),
            None,
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn reversing_flips_sign_and_links_back() {
        let original = LedgerEntry::new(
            TenantId::new(),
            ItemId::new(),
            LocationId::new(),
            dec!(-3),
            dec!(2.5),
            EntrySource::Depletion,
            AggregateId::new(),
            Utc::now(),
            None,
        )
        .unwrap();

        let reversal =
            LedgerEntry::reversing(&original, AggregateId::new(), Utc::now(), None);
        assert_eq!(reversal.quantity, dec!(3));
        assert_eq!(reversal.unit_cost, dec!(2.5));
        assert_eq!(reversal.reverses, Some(original.id));
        assert_eq!(reversal.source, EntrySource::Reversal);
        assert_eq!(reversal.value(), -original.value());
    }
}
