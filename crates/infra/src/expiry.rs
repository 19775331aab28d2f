//! Expiry evaluation: batch/on-demand sweep of date-expired lots.
//!
//! The write-off is a separate costing category: an expired lot's layer is
//! zeroed outright, so the valuation of surviving layers is never
//! re-weighted by expiry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use larder_core::{DomainResult, Entity, TenantId};
use larder_inventory::{ItemId, LocationId, Lot, LotId, LotStatus};

use crate::stock::registry::expire_lot_in;
use crate::stock::state::{LotQuery, StockState};
use crate::stock::store::StockStore;

/// Default "expiring soon" window, in days.
pub const DEFAULT_SOON_THRESHOLD_DAYS: i64 = 3;

/// Per-lot line of an expiry report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredLotDetail {
    pub lot_id: LotId,
    pub item_id: ItemId,
    pub location_id: LocationId,
    pub lot_number: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub value: Decimal,
    pub expired_at: Option<DateTime<Utc>>,
}

impl ExpiredLotDetail {
    fn from_lot(lot: &Lot) -> Self {
        Self {
            lot_id: *lot.id(),
            item_id: lot.item_id(),
            location_id: lot.location_id(),
            lot_number: lot.lot_number().to_string(),
            quantity: lot.remaining_qty(),
            unit_cost: lot.unit_cost(),
            value: lot.remaining_qty() * lot.unit_cost(),
            expired_at: lot.expiry(),
        }
    }
}

/// Result of one evaluation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryReport {
    pub evaluated_at: DateTime<Utc>,
    pub dry_run: bool,
    pub lots_marked_expired: usize,
    pub lots_expiring_soon: usize,
    pub total_expired_value: Decimal,
    pub details: Vec<ExpiredLotDetail>,
}

/// Scans ACTIVE lots for passed expiry dates and writes them off.
#[derive(Debug, Clone)]
pub struct ExpiryEvaluator {
    store: Arc<StockStore>,
    soon_threshold_days: i64,
}

impl ExpiryEvaluator {
    pub fn new(store: Arc<StockStore>) -> Self {
        Self {
            store,
            soon_threshold_days: DEFAULT_SOON_THRESHOLD_DAYS,
        }
    }

    pub fn with_soon_threshold(mut self, days: i64) -> Self {
        self.soon_threshold_days = days;
        self
    }

    /// Evaluate expiry for a tenant (optionally one location).
    ///
    /// Dry-run performs the identical selection and valuation but commits no
    /// state change — the preview and the real run always agree.
    pub fn evaluate(
        &self,
        tenant_id: TenantId,
        location_id: Option<LocationId>,
        dry_run: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<ExpiryReport> {
        if dry_run {
            return self.store.read(tenant_id, |state| {
                let details = Self::candidates(state, location_id, now);
                Self::build_report(state, location_id, now, true, self.soon_threshold_days, details)
            });
        }

        let report = self.store.with_txn(tenant_id, |state| {
            let details = Self::candidates(state, location_id, now);
            for detail in &details {
                expire_lot_in(state, tenant_id, detail.lot_id, now, None)?;
            }
            Ok(Self::build_report(
                state,
                location_id,
                now,
                false,
                self.soon_threshold_days,
                details,
            ))
        })?;

        info!(
            tenant = %tenant_id,
            expired = report.lots_marked_expired,
            soon = report.lots_expiring_soon,
            value = %report.total_expired_value,
            "expiry evaluated"
        );
        Ok(report)
    }

    /// Pure read: ACTIVE lots expiring within `threshold_days`, nearest first.
    pub fn expiring_soon(
        &self,
        tenant_id: TenantId,
        location_id: Option<LocationId>,
        threshold_days: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<Lot>> {
        self.store.read(tenant_id, |state| {
            let mut lots: Vec<Lot> = state
                .lots(&LotQuery {
                    location_id,
                    status: Some(LotStatus::Active),
                    ..LotQuery::default()
                })
                .into_iter()
                .filter(|l| l.expires_within(now, threshold_days))
                .cloned()
                .collect();
            lots.sort_by_key(|l| l.expiry());
            lots
        })
    }

    /// Pure read: lots already in EXPIRED status.
    pub fn expired_lots(
        &self,
        tenant_id: TenantId,
        location_id: Option<LocationId>,
    ) -> DomainResult<Vec<Lot>> {
        self.store.read(tenant_id, |state| {
            state
                .lots(&LotQuery {
                    location_id,
                    status: Some(LotStatus::Expired),
                    ..LotQuery::default()
                })
                .into_iter()
                .cloned()
                .collect()
        })
    }

    /// ACTIVE lots whose expiry date has passed, valued before write-off,
    /// nearest expiry first.
    fn candidates(
        state: &StockState,
        location_id: Option<LocationId>,
        now: DateTime<Utc>,
    ) -> Vec<ExpiredLotDetail> {
        let mut details: Vec<ExpiredLotDetail> = state
            .lots(&LotQuery {
                location_id,
                status: Some(LotStatus::Active),
                ..LotQuery::default()
            })
            .into_iter()
            .filter(|l| l.has_expired(now))
            .map(ExpiredLotDetail::from_lot)
            .collect();
        details.sort_by_key(|d| d.expired_at);
        details
    }

    fn build_report(
        state: &StockState,
        location_id: Option<LocationId>,
        now: DateTime<Utc>,
        dry_run: bool,
        soon_threshold_days: i64,
        details: Vec<ExpiredLotDetail>,
    ) -> ExpiryReport {
        let lots_expiring_soon = state
            .lots(&LotQuery {
                location_id,
                status: Some(LotStatus::Active),
                ..LotQuery::default()
            })
            .into_iter()
            .filter(|l| l.expires_within(now, soon_threshold_days))
            .count();

        ExpiryReport {
            evaluated_at: now,
            dry_run,
            lots_marked_expired: details.len(),
            lots_expiring_soon,
            total_expired_value: details.iter().map(|d| d.value).sum(),
            details,
        }
    }
}
