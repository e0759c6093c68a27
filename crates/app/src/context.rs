//! App Context

use std::{fmt, sync::Arc};

use thiserror::Error;
use tracing::info;

use crate::{
    config::StoreConfig,
    domain::{
        active_days::{ActiveDaysService, StoreActiveDaysService},
        coordinator::{CascadePolicy, Coordinator},
        memberships::{MembershipsService, StoreMembershipsService},
        promotions::{PromotionsService, StorePromotionsService},
    },
    store::{Executor, StoreError, cassandra::CassandraExecutor},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to store")]
    Store(#[source] StoreError),
}

/// Services sharing one store handle.
///
/// Built once at process start and passed to callers. Clones share the store
/// handle, so the session closes when the last clone is dropped.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn Executor>,
    pub promotions: Arc<dyn PromotionsService>,
    pub memberships: Arc<dyn MembershipsService>,
    pub active_days: Arc<dyn ActiveDaysService>,
    pub coordinator: Coordinator,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build application context over an existing executor.
    #[must_use]
    pub fn from_executor(store: Arc<dyn Executor>, policy: CascadePolicy) -> Self {
        let promotions: Arc<dyn PromotionsService> =
            Arc::new(StorePromotionsService::new(store.clone()));
        let memberships: Arc<dyn MembershipsService> =
            Arc::new(StoreMembershipsService::new(store.clone()));
        let active_days: Arc<dyn ActiveDaysService> =
            Arc::new(StoreActiveDaysService::new(store.clone()));

        Self {
            coordinator: Coordinator::new(
                promotions.clone(),
                memberships.clone(),
                active_days.clone(),
                policy,
            ),
            store,
            promotions,
            memberships,
            active_days,
        }
    }

    /// Build application context from store settings.
    ///
    /// # Errors
    ///
    /// Returns an error when connecting to the store or preparing statements fails.
    pub async fn connect(
        config: &StoreConfig,
        policy: CascadePolicy,
    ) -> Result<Self, AppInitError> {
        let executor = CassandraExecutor::connect(config)
            .await
            .map_err(AppInitError::Store)?;

        Ok(Self::from_executor(Arc::new(executor), policy))
    }

    /// The same services with a different cascade policy.
    #[must_use]
    pub fn with_cascade_policy(self, policy: CascadePolicy) -> Self {
        Self {
            coordinator: Coordinator::new(
                self.promotions.clone(),
                self.memberships.clone(),
                self.active_days.clone(),
                policy,
            ),
            ..self
        }
    }

    /// Store release version; fails when the store is unreachable.
    ///
    /// # Errors
    ///
    /// Returns the store error from the version query.
    pub async fn healthcheck(&self) -> Result<String, StoreError> {
        self.store.release_version().await
    }

    /// Drop this context's handle on the store. The session closes once no
    /// other clone holds it.
    pub fn shutdown(self) {
        drop(self);

        info!("application context closed");
    }
}
