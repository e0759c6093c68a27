//! In-memory Executor
//!
//! Wide-column tables held in process: partitions are hashed, rows inside a
//! partition are ordered by clustering key. `promotions_by_type` is projected from
//! the canonical table on read, the way the store maintains its view.

use std::collections::BTreeMap;

use async_trait::async_trait;
use jiff::civil::Date;
use promocat::{
    memberships::ProductId,
    promotions::{Promotion, PromotionId},
};
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::{
    domain::{
        active_days::records::ActiveDay,
        memberships::records::{ProductInPromotion, PromotionForProduct},
        promotions::records::PromotionByType,
    },
    store::{Executor, StoreError},
};

type Partitions<K, C, R> = FxHashMap<K, BTreeMap<C, R>>;

#[derive(Debug, Default)]
struct Tables {
    promotions_by_id: FxHashMap<PromotionId, Promotion>,
    products_by_promo: Partitions<PromotionId, ProductId, ProductInPromotion>,
    promos_by_product: Partitions<ProductId, PromotionId, PromotionForProduct>,
    active_by_day: Partitions<Date, PromotionId, ActiveDay>,
}

#[derive(Debug, Default)]
pub struct MemoryExecutor {
    tables: RwLock<Tables>,
}

impl MemoryExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn read_partition<K, C, R>(partitions: &Partitions<K, C, R>, key: &K) -> Vec<R>
where
    K: Eq + std::hash::Hash,
    R: Clone,
{
    partitions
        .get(key)
        .map(|rows| rows.values().cloned().collect())
        .unwrap_or_default()
}

fn upsert_row<K, C, R>(partitions: &mut Partitions<K, C, R>, key: K, clustering: C, row: R)
where
    K: Eq + std::hash::Hash,
    C: Ord,
{
    partitions.entry(key).or_default().insert(clustering, row);
}

fn delete_row<K, C, R>(partitions: &mut Partitions<K, C, R>, key: &K, clustering: &C)
where
    K: Eq + std::hash::Hash,
    C: Ord,
{
    if let Some(rows) = partitions.get_mut(key) {
        rows.remove(clustering);

        if rows.is_empty() {
            partitions.remove(key);
        }
    }
}

#[async_trait]
impl Executor for MemoryExecutor {
    async fn select_promotion(&self, id: &PromotionId) -> Result<Option<Promotion>, StoreError> {
        Ok(self.tables.read().await.promotions_by_id.get(id).cloned())
    }

    async fn insert_promotion(&self, promotion: &Promotion) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .promotions_by_id
            .insert(promotion.id.clone(), promotion.clone());

        Ok(())
    }

    async fn delete_promotion(&self, id: &PromotionId) -> Result<(), StoreError> {
        self.tables.write().await.promotions_by_id.remove(id);

        Ok(())
    }

    async fn select_promotions_by_type(
        &self,
        kind: &str,
    ) -> Result<Vec<PromotionByType>, StoreError> {
        let tables = self.tables.read().await;

        let mut rows: Vec<PromotionByType> = tables
            .promotions_by_id
            .values()
            .filter(|promotion| promotion.kind == kind)
            .map(|promotion| PromotionByType {
                kind: promotion.kind.clone(),
                promotion_id: promotion.id.clone(),
                name: promotion.name.clone(),
                start_date: promotion.start_date,
                end_date: promotion.end_date,
            })
            .collect();

        rows.sort_by(|a, b| a.promotion_id.cmp(&b.promotion_id));

        Ok(rows)
    }

    async fn select_products_by_promotion(
        &self,
        id: &PromotionId,
    ) -> Result<Vec<ProductInPromotion>, StoreError> {
        Ok(read_partition(
            &self.tables.read().await.products_by_promo,
            id,
        ))
    }

    async fn insert_product_by_promotion(
        &self,
        row: &ProductInPromotion,
    ) -> Result<(), StoreError> {
        upsert_row(
            &mut self.tables.write().await.products_by_promo,
            row.promotion_id.clone(),
            row.product_id.clone(),
            row.clone(),
        );

        Ok(())
    }

    async fn delete_product_by_promotion(
        &self,
        promotion: &PromotionId,
        product: &ProductId,
    ) -> Result<(), StoreError> {
        delete_row(
            &mut self.tables.write().await.products_by_promo,
            promotion,
            product,
        );

        Ok(())
    }

    async fn select_promotions_by_product(
        &self,
        product: &ProductId,
    ) -> Result<Vec<PromotionForProduct>, StoreError> {
        Ok(read_partition(
            &self.tables.read().await.promos_by_product,
            product,
        ))
    }

    async fn insert_promotion_by_product(
        &self,
        row: &PromotionForProduct,
    ) -> Result<(), StoreError> {
        upsert_row(
            &mut self.tables.write().await.promos_by_product,
            row.product_id.clone(),
            row.promotion_id.clone(),
            row.clone(),
        );

        Ok(())
    }

    async fn delete_promotion_by_product(
        &self,
        product: &ProductId,
        promotion: &PromotionId,
    ) -> Result<(), StoreError> {
        delete_row(
            &mut self.tables.write().await.promos_by_product,
            product,
            promotion,
        );

        Ok(())
    }

    async fn select_active_by_day(&self, day: Date) -> Result<Vec<ActiveDay>, StoreError> {
        Ok(read_partition(&self.tables.read().await.active_by_day, &day))
    }

    async fn insert_active_day(&self, row: &ActiveDay) -> Result<(), StoreError> {
        upsert_row(
            &mut self.tables.write().await.active_by_day,
            row.day,
            row.promotion_id.clone(),
            row.clone(),
        );

        Ok(())
    }

    async fn delete_active_day(
        &self,
        day: Date,
        promotion: &PromotionId,
    ) -> Result<(), StoreError> {
        delete_row(&mut self.tables.write().await.active_by_day, &day, promotion);

        Ok(())
    }

    async fn release_version(&self) -> Result<String, StoreError> {
        Ok("memory".to_string())
    }
}
