//! Service errors.

use promocat::{errors::ValidationError, promotions::PromotionId};
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid input")]
    Validation(#[from] ValidationError),

    #[error("promotion `{0}` not found")]
    NotFound(PromotionId),

    #[error("storage error")]
    Store(#[from] StoreError),
}
