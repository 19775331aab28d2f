use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{DomainError, DomainResult, Entity, TenantId, domain_id};

use crate::item::{ItemId, LocationId};

domain_id!(
    /// Physical lot identifier.
    LotId
);

/// Lifecycle status of a physical lot.
///
/// QUARANTINE and EXPIRED both *block* the lot: no waste, transfer, or
/// depletion may touch it until it is released (quarantine only — expiry is
/// one-way).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotStatus {
    Active,
    Quarantine,
    Expired,
}

impl core::fmt::Display for LotStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            LotStatus::Active => "ACTIVE",
            LotStatus::Quarantine => "QUARANTINE",
            LotStatus::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// A physically identifiable batch of stock.
///
/// Created on receipt, mutated by consumption/transfer/waste/expiry, never
/// deleted (kept for audit). `remaining_qty` only goes negative when the
/// caller explicitly passes the negative-stock override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    id: LotId,
    tenant_id: TenantId,
    item_id: ItemId,
    location_id: LocationId,
    lot_number: String,
    remaining_qty: Decimal,
    unit_cost: Decimal,
    expiry: Option<DateTime<Utc>>,
    status: LotStatus,
    status_reason: Option<String>,
    received_at: DateTime<Utc>,
}

impl Lot {
    #[allow(clippy::too_many_arguments)]
    pub fn receive(
        id: LotId,
        tenant_id: TenantId,
        item_id: ItemId,
        location_id: LocationId,
        lot_number: impl Into<String>,
        qty: Decimal,
        unit_cost: Decimal,
        expiry: Option<DateTime<Utc>>,
        received_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let lot_number = lot_number.into().trim().to_string();
        if lot_number.is_empty() {
            return Err(DomainError::validation("lot number cannot be empty"));
        }
        if qty <= Decimal::ZERO {
            return Err(DomainError::validation("received quantity must be > 0"));
        }
        if unit_cost < Decimal::ZERO {
            return Err(DomainError::validation("unit cost cannot be negative"));
        }
        Ok(Self {
            id,
            tenant_id,
            item_id,
            location_id,
            lot_number,
            remaining_qty: qty,
            unit_cost,
            expiry,
            status: LotStatus::Active,
            status_reason: None,
            received_at,
        })
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn location_id(&self) -> LocationId {
        self.location_id
    }

    pub fn lot_number(&self) -> &str {
        &self.lot_number
    }

    pub fn remaining_qty(&self) -> Decimal {
        self.remaining_qty
    }

    pub fn unit_cost(&self) -> Decimal {
        self.unit_cost
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry
    }

    pub fn status(&self) -> LotStatus {
        self.status
    }

    pub fn status_reason(&self) -> Option<&str> {
        self.status_reason.as_deref()
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Blocked lots are ineligible for waste, transfer, and depletion.
    pub fn is_blocked(&self) -> bool {
        matches!(self.status, LotStatus::Quarantine | LotStatus::Expired)
    }

    pub fn ensure_unblocked(&self) -> DomainResult<()> {
        if self.is_blocked() {
            return Err(DomainError::LotBlocked {
                lot_id: self.id.into(),
                status: self.status.to_string(),
            });
        }
        Ok(())
    }

    /// Move an ACTIVE lot into quarantine.
    pub fn quarantine(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        match self.status {
            LotStatus::Active => {
                self.status = LotStatus::Quarantine;
                self.status_reason = Some(reason.into());
                Ok(())
            }
            current => Err(DomainError::invalid_state(
                current.to_string(),
                "quarantine",
            )),
        }
    }

    /// Release a quarantined lot back to ACTIVE.
    pub fn release(&mut self) -> DomainResult<()> {
        match self.status {
            LotStatus::Quarantine => {
                self.status = LotStatus::Active;
                self.status_reason = None;
                Ok(())
            }
            current => Err(DomainError::invalid_state(current.to_string(), "release")),
        }
    }

    /// Expiry is one-way: ACTIVE or QUARANTINE lots can expire, an expired
    /// lot stays expired.
    pub fn mark_expired(&mut self) -> DomainResult<()> {
        match self.status {
            LotStatus::Active | LotStatus::Quarantine => {
                self.status = LotStatus::Expired;
                self.status_reason = None;
                Ok(())
            }
            LotStatus::Expired => Err(DomainError::invalid_state("EXPIRED", "mark_expired")),
        }
    }

    /// Apply a signed quantity delta to the remainder.
    ///
    /// Driving the remainder negative is an invariant violation unless the
    /// caller passes `allow_negative` (explicit negative-stock override).
    pub fn adjust_remaining(&mut self, delta: Decimal, allow_negative: bool) -> DomainResult<()> {
        let resulting = self.remaining_qty + delta;
        if resulting < Decimal::ZERO && !allow_negative {
            return Err(DomainError::NegativeStock {
                lot_id: self.id.into(),
                resulting,
            });
        }
        self.remaining_qty = resulting;
        Ok(())
    }

    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|at| at <= now)
    }

    /// Expiring within the window `(now, now + threshold_days]`.
    pub fn expires_within(&self, now: DateTime<Utc>, threshold_days: i64) -> bool {
        self.expiry
            .is_some_and(|at| at > now && at <= now + Duration::days(threshold_days))
    }
}

impl Entity for Lot {
    type Id = LotId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_lot(qty: Decimal) -> Lot {
        Lot::receive(
            LotId::new(),
            TenantId::new(),
            ItemId::new(),
            LocationId::new(),
            "LOT-1",
            qty,
            dec!(2.50),
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn receive_rejects_non_positive_quantity() {
        let result = Lot::receive(
            LotId::new(),
            TenantId::new(),
            ItemId::new(),
            LocationId::new(),
            "LOT-1",
            dec!(0),
            dec!(1),
            None,
            Utc::now(),
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn adjust_guards_against_negative_stock() {
        let mut lot = test_lot(dec!(5));
        let err = lot.adjust_remaining(dec!(-6), false).unwrap_err();
        assert!(matches!(err, DomainError::NegativeStock { .. }));
        // Guard leaves the remainder untouched.
        assert_eq!(lot.remaining_qty(), dec!(5));
    }

    #[test]
    fn negative_override_is_explicit() {
        let mut lot = test_lot(dec!(5));
        lot.adjust_remaining(dec!(-6), true).unwrap();
        assert_eq!(lot.remaining_qty(), dec!(-1));
    }

    #[test]
    fn quarantine_blocks_and_release_unblocks() {
        let mut lot = test_lot(dec!(5));
        assert!(!lot.is_blocked());

        lot.quarantine("supplier recall").unwrap();
        assert!(lot.is_blocked());
        assert_eq!(lot.status_reason(), Some("supplier recall"));
        assert!(matches!(
            lot.ensure_unblocked(),
            Err(DomainError::LotBlocked { .. })
        ));

        lot.release().unwrap();
        assert!(!lot.is_blocked());
        assert_eq!(lot.status_reason(), None);
    }

    #[test]
    fn expiry_is_one_way() {
        let mut lot = test_lot(dec!(5));
        lot.mark_expired().unwrap();
        assert_eq!(lot.status(), LotStatus::Expired);
        assert!(matches!(
            lot.mark_expired(),
            Err(DomainError::InvalidState { .. })
        ));
        assert!(matches!(
            lot.release(),
            Err(DomainError::InvalidState { .. })
        ));
    }

    #[test]
    fn double_quarantine_is_invalid() {
        let mut lot = test_lot(dec!(5));
        lot.quarantine("check").unwrap();
        assert!(matches!(
            lot.quarantine("again"),
            Err(DomainError::InvalidState { .. })
        ));
    }

    #[test]
    fn expiry_windows() {
        let now = Utc::now();
        let mut lot = test_lot(dec!(5));

        lot.expiry = Some(now - Duration::hours(1));
        assert!(lot.has_expired(now));
        assert!(!lot.expires_within(now, 3));

        lot.expiry = Some(now + Duration::days(2));
        assert!(!lot.has_expired(now));
        assert!(lot.expires_within(now, 3));
        assert!(!lot.expires_within(now, 1));
    }
}
