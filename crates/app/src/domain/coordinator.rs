//! Consistency Coordinator
//!
//! The only writer that touches more than one table family in a single logical
//! operation. It composes the services and never talks to the store itself.
//!
//! Nothing here is atomic. Each step is an idempotent upsert or delete, so an
//! operation that fails part way is completed by running it again.

use std::{fmt, sync::Arc};

use jiff::civil::Date;
use promocat::promotions::{Promotion, PromotionFields, PromotionId, PromotionPatch};
use tracing::{Span, info};

use crate::domain::{
    ServiceError, active_days::ActiveDaysService, memberships::MembershipsService,
    promotions::PromotionsService,
};

/// How far a promotion delete reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadePolicy {
    /// Also delete the active-day rows of the promotion's date range. Off by
    /// default, which leaves those rows behind.
    pub purge_active_days: bool,
}

/// Rows removed by a completed cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub memberships_removed: usize,
    pub active_days_removed: usize,
}

/// Change applied by a coordinated update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionChange {
    /// Overwrite every field.
    Replace(PromotionFields),

    /// Merge the supplied fields into the stored promotion.
    Patch(PromotionPatch),
}

/// Outcome of a coordinated update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub promotion: Promotion,
    pub snapshots_resynced: usize,
    pub stale_days_removed: usize,
    pub active_days_refreshed: usize,
}

#[derive(Clone)]
pub struct Coordinator {
    promotions: Arc<dyn PromotionsService>,
    memberships: Arc<dyn MembershipsService>,
    active_days: Arc<dyn ActiveDaysService>,
    policy: CascadePolicy,
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    #[must_use]
    pub fn new(
        promotions: Arc<dyn PromotionsService>,
        memberships: Arc<dyn MembershipsService>,
        active_days: Arc<dyn ActiveDaysService>,
        policy: CascadePolicy,
    ) -> Self {
        Self {
            promotions,
            memberships,
            active_days,
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> CascadePolicy {
        self.policy
    }

    /// Delete a promotion together with its memberships.
    ///
    /// Memberships go first, in both directions, then (when the policy asks for
    /// it) the active days of the promotion's range, then the canonical row.
    /// Deleting an absent promotion succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error; earlier steps stay applied.
    #[tracing::instrument(
        name = "coordinator.delete_promotion_cascade",
        skip(self, id),
        fields(
            promotion_id = %id,
            purge_active_days = self.policy.purge_active_days,
            memberships_removed = tracing::field::Empty,
            active_days_removed = tracing::field::Empty
        ),
        err
    )]
    pub async fn delete_promotion_cascade(
        &self,
        id: &PromotionId,
    ) -> Result<CascadeReport, ServiceError> {
        let range = if self.policy.purge_active_days {
            match self.promotions.get_promotion(id).await {
                Ok(promotion) => promotion.date_range().ok(),
                Err(ServiceError::NotFound(_)) => None,
                Err(error) => return Err(error),
            }
        } else {
            None
        };

        let memberships = self.memberships.list_by_promotion(id).await?;

        for membership in &memberships {
            self.memberships
                .remove_membership(id, &membership.product_id)
                .await?;
        }

        let active_days_removed = match range {
            Some(range) => self.active_days.delete_days(id, range.days().collect()).await?,
            None => 0,
        };

        self.promotions.delete_promotion(id).await?;

        let report = CascadeReport {
            memberships_removed: memberships.len(),
            active_days_removed,
        };

        let span = Span::current();

        span.record("memberships_removed", report.memberships_removed);
        span.record("active_days_removed", report.active_days_removed);

        info!("deleted promotion with cascade");

        Ok(report)
    }

    /// Change a promotion and carry the change into the derived views.
    ///
    /// Rewrites the canonical row and refreshes every product-keyed snapshot.
    /// Active days that fall outside the new range are deleted, and existing days
    /// inside both ranges are rewritten with the new name, type and range. Days
    /// newly inside the range are not written; regenerate the promotion for those.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown promotion and `Validation` for an invalid
    /// change, both before any write.
    #[tracing::instrument(
        name = "coordinator.update_promotion",
        skip(self, id, change),
        fields(promotion_id = %id),
        err
    )]
    pub async fn update_promotion(
        &self,
        id: PromotionId,
        change: PromotionChange,
    ) -> Result<UpdateReport, ServiceError> {
        let current = self.promotions.get_promotion(&id).await?;

        let fields = match change {
            PromotionChange::Replace(fields) => fields,
            PromotionChange::Patch(patch) => patch.apply(current.clone())?.into_fields().1,
        };

        let promotion = self.promotions.update_promotion(id.clone(), fields).await?;

        let snapshots_resynced = self.memberships.resync(&id).await?;

        let stale = stale_days(&current, &promotion);

        let stale_days_removed = if stale.is_empty() {
            0
        } else {
            self.active_days.delete_days(&id, stale).await?
        };

        let retained = retained_days(&current, &promotion);

        let active_days_refreshed = if retained.is_empty() {
            0
        } else {
            self.active_days.refresh_days(&promotion, retained).await?
        };

        info!(
            snapshots_resynced,
            stale_days_removed, active_days_refreshed, "updated promotion and derived views"
        );

        Ok(UpdateReport {
            promotion,
            snapshots_resynced,
            stale_days_removed,
            active_days_refreshed,
        })
    }
}

/// Days of `before`'s range that `after`'s range no longer covers.
fn stale_days(before: &Promotion, after: &Promotion) -> Vec<Date> {
    match (before.date_range(), after.date_range()) {
        (Ok(old), Ok(new)) => old.days_outside(&new).collect(),
        (Ok(old), Err(_)) => old.days().collect(),
        (Err(_), _) => Vec::new(),
    }
}

/// Days covered by both `before`'s and `after`'s ranges.
fn retained_days(before: &Promotion, after: &Promotion) -> Vec<Date> {
    match (before.date_range(), after.date_range()) {
        (Ok(old), Ok(new)) => old.days().filter(|day| new.contains(*day)).collect(),
        _ => Vec::new(),
    }
}
