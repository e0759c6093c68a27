//! Active Days Service
//!
//! Expands a promotion's inclusive date range into one `promotions_active_by_day`
//! row per day. Rows are derived only, never authored directly.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use jiff::civil::Date;
use mockall::automock;
use promocat::promotions::{Promotion, PromotionId};
use tracing::{Span, info};

use crate::{
    domain::{ServiceError, active_days::records::ActiveDay},
    store::Executor,
};

#[derive(Clone)]
pub struct StoreActiveDaysService {
    store: Arc<dyn Executor>,
}

impl fmt::Debug for StoreActiveDaysService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreActiveDaysService").finish_non_exhaustive()
    }
}

impl StoreActiveDaysService {
    #[must_use]
    pub fn new(store: Arc<dyn Executor>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ActiveDaysService for StoreActiveDaysService {
    #[tracing::instrument(
        name = "active_days.service.regenerate",
        skip(self, promotion),
        fields(promotion_id = %promotion, days = tracing::field::Empty),
        err
    )]
    async fn regenerate(&self, promotion: &PromotionId) -> Result<usize, ServiceError> {
        let canonical = self
            .store
            .select_promotion(promotion)
            .await?
            .ok_or_else(|| ServiceError::NotFound(promotion.clone()))?;

        let range = canonical.date_range()?;

        Span::current().record("days", range.day_count());

        let mut written = 0;

        for day in range.days() {
            self.store
                .insert_active_day(&ActiveDay {
                    day,
                    promotion_id: canonical.id.clone(),
                    name: canonical.name.clone(),
                    kind: canonical.kind.clone(),
                    start_date: range.start(),
                    end_date: range.end(),
                })
                .await?;

            written += 1;
        }

        info!(days = written, "regenerated active days");

        Ok(written)
    }

    #[tracing::instrument(
        name = "active_days.service.delete_day",
        skip(self, promotion),
        fields(promotion_id = %promotion),
        err
    )]
    async fn delete_day(&self, promotion: &PromotionId, day: Date) -> Result<(), ServiceError> {
        self.store.delete_active_day(day, promotion).await?;

        info!("deleted active day");

        Ok(())
    }

    #[tracing::instrument(
        name = "active_days.service.delete_days",
        skip(self, promotion, days),
        fields(promotion_id = %promotion, days = days.len()),
        err
    )]
    async fn delete_days(
        &self,
        promotion: &PromotionId,
        days: Vec<Date>,
    ) -> Result<usize, ServiceError> {
        for day in &days {
            self.store.delete_active_day(*day, promotion).await?;
        }

        info!("deleted active days");

        Ok(days.len())
    }

    #[tracing::instrument(
        name = "active_days.service.refresh_days",
        skip(self, promotion, days),
        fields(promotion_id = %promotion.id, refreshed = tracing::field::Empty),
        err
    )]
    async fn refresh_days(
        &self,
        promotion: &Promotion,
        days: Vec<Date>,
    ) -> Result<usize, ServiceError> {
        let range = promotion.date_range()?;

        let mut refreshed = 0;

        for day in days.into_iter().filter(|day| range.contains(*day)) {
            let present = self
                .store
                .select_active_by_day(day)
                .await?
                .iter()
                .any(|row| row.promotion_id == promotion.id);

            if !present {
                continue;
            }

            self.store
                .insert_active_day(&ActiveDay {
                    day,
                    promotion_id: promotion.id.clone(),
                    name: promotion.name.clone(),
                    kind: promotion.kind.clone(),
                    start_date: range.start(),
                    end_date: range.end(),
                })
                .await?;

            refreshed += 1;
        }

        Span::current().record("refreshed", refreshed);

        info!("refreshed active days");

        Ok(refreshed)
    }

    #[tracing::instrument(name = "active_days.service.list_active_on", skip(self), err)]
    async fn list_active_on(&self, day: Date) -> Result<Vec<ActiveDay>, ServiceError> {
        Ok(self.store.select_active_by_day(day).await?)
    }
}

#[automock]
#[async_trait]
pub trait ActiveDaysService: Send + Sync {
    /// Write one active-day row for every day of the promotion's range, in order.
    ///
    /// Fails before any write when the promotion is missing or its range is
    /// absent or inverted. Days outside a shrunk range are left behind. Returns
    /// the number of days written.
    async fn regenerate(&self, promotion: &PromotionId) -> Result<usize, ServiceError>;

    /// Delete exactly one active-day row.
    async fn delete_day(&self, promotion: &PromotionId, day: Date) -> Result<(), ServiceError>;

    /// Delete the promotion's row for each of `days`. Returns the deletes issued.
    async fn delete_days(
        &self,
        promotion: &PromotionId,
        days: Vec<Date>,
    ) -> Result<usize, ServiceError>;

    /// Rewrite the promotion's existing rows for `days` with its current name,
    /// type and range. Days outside the range or without a row are skipped, so
    /// no row is created. Returns the rows rewritten.
    async fn refresh_days(
        &self,
        promotion: &Promotion,
        days: Vec<Date>,
    ) -> Result<usize, ServiceError>;

    /// Promotions with an active-day row for `day`.
    async fn list_active_on(&self, day: Date) -> Result<Vec<ActiveDay>, ServiceError>;
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use jiff::civil::date;
    use promocat::{
        errors::ValidationError,
        promotions::{PromotionFields, PromotionPatch},
    };
    use testresult::TestResult;

    use crate::{
        domain::promotions::PromotionsService, store::MockExecutor, test::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn regenerate_writes_one_row_per_inclusive_day() -> TestResult {
        let ctx = TestContext::new();
        let km03 = PromotionId::new("KM03")?;

        ctx.promotions
            .create_promotion(ctx.new_promotion("KM03")?)
            .await?;

        let written = ctx.active_days.regenerate(&km03).await?;

        assert_eq!(written, 3);

        for day in [date(2025, 12, 20), date(2025, 12, 21), date(2025, 12, 22)] {
            let rows = ctx.active_days.list_active_on(day).await?;
            let row = rows.first().ok_or("missing active day")?;

            assert_eq!(rows.len(), 1);
            assert_eq!(row.promotion_id, km03);
            assert_eq!(row.name, "Year end sale");
            assert_eq!(row.kind, "percentage discount");
            assert_eq!(row.start_date, date(2025, 12, 20));
            assert_eq!(row.end_date, date(2025, 12, 22));
        }

        assert!(
            ctx.active_days
                .list_active_on(date(2025, 12, 23))
                .await?
                .is_empty()
        );

        Ok(())
    }

    #[tokio::test]
    async fn regenerate_single_day_range_writes_one_row() -> TestResult {
        let ctx = TestContext::new();

        let mut promotion = ctx.new_promotion("KM07")?;
        promotion.fields.end_date = promotion.fields.start_date;

        ctx.promotions.create_promotion(promotion).await?;

        assert_eq!(
            ctx.active_days
                .regenerate(&PromotionId::new("KM07")?)
                .await?,
            1
        );

        Ok(())
    }

    #[tokio::test]
    async fn regenerate_counts_leap_days() -> TestResult {
        let ctx = TestContext::new();

        let mut promotion = ctx.new_promotion("KM08")?;
        promotion.fields.start_date = Some(date(2024, 2, 27));
        promotion.fields.end_date = Some(date(2024, 3, 1));

        ctx.promotions.create_promotion(promotion).await?;

        assert_eq!(
            ctx.active_days
                .regenerate(&PromotionId::new("KM08")?)
                .await?,
            4
        );
        assert_eq!(
            ctx.active_days.list_active_on(date(2024, 2, 29)).await?.len(),
            1
        );

        Ok(())
    }

    #[tokio::test]
    async fn regenerate_twice_leaves_the_same_rows() -> TestResult {
        let ctx = TestContext::new();
        let km03 = PromotionId::new("KM03")?;

        ctx.promotions
            .create_promotion(ctx.new_promotion("KM03")?)
            .await?;

        ctx.active_days.regenerate(&km03).await?;
        let first = ctx.active_days.list_active_on(date(2025, 12, 21)).await?;

        ctx.active_days.regenerate(&km03).await?;
        let second = ctx.active_days.list_active_on(date(2025, 12, 21)).await?;

        assert_eq!(first, second);
        assert_eq!(second.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn regenerate_after_shrinking_leaves_stale_days() -> TestResult {
        let ctx = TestContext::new();
        let km03 = PromotionId::new("KM03")?;

        ctx.promotions
            .create_promotion(ctx.new_promotion("KM03")?)
            .await?;
        ctx.active_days.regenerate(&km03).await?;

        ctx.promotions
            .patch_promotion(
                km03.clone(),
                PromotionPatch {
                    end_date: Some(date(2025, 12, 20)),
                    ..PromotionPatch::default()
                },
            )
            .await?;

        assert_eq!(ctx.active_days.regenerate(&km03).await?, 1);
        assert_eq!(
            ctx.active_days.list_active_on(date(2025, 12, 22)).await?.len(),
            1
        );

        Ok(())
    }

    #[tokio::test]
    async fn regenerate_writes_days_in_order() -> TestResult {
        let ctx = TestContext::new();
        let promotion = ctx.new_promotion("KM03")?.into_promotion()?;
        let written = Arc::new(Mutex::new(Vec::new()));

        let mut store = MockExecutor::new();

        store
            .expect_select_promotion()
            .returning(move |_| Ok(Some(promotion.clone())));

        let sink = Arc::clone(&written);

        store
            .expect_insert_active_day()
            .times(3)
            .returning(move |row| {
                if let Ok(mut days) = sink.lock() {
                    days.push(row.day);
                }

                Ok(())
            });

        StoreActiveDaysService::new(Arc::new(store))
            .regenerate(&PromotionId::new("KM03")?)
            .await?;

        let days = written.lock().map_err(|_| "poisoned")?.clone();

        assert_eq!(
            days,
            [date(2025, 12, 20), date(2025, 12, 21), date(2025, 12, 22)]
        );

        Ok(())
    }

    #[tokio::test]
    async fn regenerate_without_dates_fails_before_writing() -> TestResult {
        let promotion = PromotionFields {
            name: "Open ended".to_string(),
            kind: "gift".to_string(),
            start_date: Some(date(2025, 12, 20)),
            ..PromotionFields::default()
        }
        .into_promotion(PromotionId::new("KM09")?)?;

        let mut store = MockExecutor::new();

        store
            .expect_select_promotion()
            .returning(move |_| Ok(Some(promotion.clone())));
        store.expect_insert_active_day().never();

        let result = StoreActiveDaysService::new(Arc::new(store))
            .regenerate(&PromotionId::new("KM09")?)
            .await;

        assert!(
            matches!(
                result,
                Err(ServiceError::Validation(ValidationError::MissingDateRange))
            ),
            "expected MissingDateRange, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn regenerate_inverted_stored_range_fails_before_writing() -> TestResult {
        let mut promotion = TestContext::new()
            .new_promotion("KM10")?
            .into_promotion()?;

        promotion.start_date = Some(date(2025, 12, 22));
        promotion.end_date = Some(date(2025, 12, 20));

        let mut store = MockExecutor::new();

        store
            .expect_select_promotion()
            .returning(move |_| Ok(Some(promotion.clone())));
        store.expect_insert_active_day().never();

        let result = StoreActiveDaysService::new(Arc::new(store))
            .regenerate(&PromotionId::new("KM10")?)
            .await;

        assert!(
            matches!(
                result,
                Err(ServiceError::Validation(ValidationError::InvertedRange { .. }))
            ),
            "expected InvertedRange, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn regenerate_unknown_promotion_returns_not_found() -> TestResult {
        let ctx = TestContext::new();

        let result = ctx.active_days.regenerate(&PromotionId::new("KM99")?).await;

        assert!(
            matches!(result, Err(ServiceError::NotFound(_))),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn delete_day_removes_exactly_one_row() -> TestResult {
        let ctx = TestContext::new();
        let km03 = PromotionId::new("KM03")?;

        ctx.promotions
            .create_promotion(ctx.new_promotion("KM03")?)
            .await?;
        ctx.active_days.regenerate(&km03).await?;

        ctx.active_days.delete_day(&km03, date(2025, 12, 21)).await?;

        assert!(
            ctx.active_days
                .list_active_on(date(2025, 12, 21))
                .await?
                .is_empty()
        );
        assert_eq!(
            ctx.active_days.list_active_on(date(2025, 12, 20)).await?.len(),
            1
        );
        assert_eq!(
            ctx.active_days.list_active_on(date(2025, 12, 22)).await?.len(),
            1
        );

        Ok(())
    }

    #[tokio::test]
    async fn delete_days_is_idempotent() -> TestResult {
        let ctx = TestContext::new();
        let km03 = PromotionId::new("KM03")?;
        let days = vec![date(2025, 12, 20), date(2025, 12, 21)];

        ctx.promotions
            .create_promotion(ctx.new_promotion("KM03")?)
            .await?;
        ctx.active_days.regenerate(&km03).await?;

        assert_eq!(ctx.active_days.delete_days(&km03, days.clone()).await?, 2);
        assert_eq!(ctx.active_days.delete_days(&km03, days).await?, 2);

        assert_eq!(
            ctx.active_days.list_active_on(date(2025, 12, 22)).await?.len(),
            1
        );

        Ok(())
    }

    #[tokio::test]
    async fn refresh_days_rewrites_only_existing_rows() -> TestResult {
        let ctx = TestContext::new();
        let km03 = PromotionId::new("KM03")?;

        ctx.promotions
            .create_promotion(ctx.new_promotion("KM03")?)
            .await?;
        ctx.active_days.regenerate(&km03).await?;
        ctx.active_days.delete_day(&km03, date(2025, 12, 21)).await?;

        let renamed = ctx
            .promotions
            .patch_promotion(
                km03.clone(),
                PromotionPatch {
                    name: Some("Renamed".to_string()),
                    end_date: Some(date(2025, 12, 23)),
                    ..PromotionPatch::default()
                },
            )
            .await?;

        let refreshed = ctx
            .active_days
            .refresh_days(
                &renamed,
                vec![
                    date(2025, 12, 20),
                    date(2025, 12, 21),
                    date(2025, 12, 22),
                    date(2025, 12, 24),
                ],
            )
            .await?;

        assert_eq!(refreshed, 2);

        let rows = ctx.active_days.list_active_on(date(2025, 12, 22)).await?;
        let row = rows.first().ok_or("missing active day")?;

        assert_eq!(row.name, "Renamed");
        assert_eq!(row.end_date, date(2025, 12, 23));
        assert!(
            ctx.active_days
                .list_active_on(date(2025, 12, 21))
                .await?
                .is_empty(),
            "a deleted day must not be recreated"
        );

        Ok(())
    }

    #[tokio::test]
    async fn refresh_days_without_dates_fails_before_writing() -> TestResult {
        let promotion = PromotionFields {
            name: "Open ended".to_string(),
            kind: "gift".to_string(),
            ..PromotionFields::default()
        }
        .into_promotion(PromotionId::new("KM09")?)?;

        let mut store = MockExecutor::new();

        store.expect_select_active_by_day().never();
        store.expect_insert_active_day().never();

        let result = StoreActiveDaysService::new(Arc::new(store))
            .refresh_days(&promotion, vec![date(2025, 12, 20)])
            .await;

        assert!(
            matches!(
                result,
                Err(ServiceError::Validation(ValidationError::MissingDateRange))
            ),
            "expected MissingDateRange, got {result:?}"
        );

        Ok(())
    }
}
