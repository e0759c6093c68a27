//! Store errors.

use std::error::Error as StdError;

use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure reported by the underlying store. Never retried by the engine.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to the store")]
    Connect(#[source] BoxError),

    #[error("invalid keyspace name `{0}`")]
    InvalidKeyspace(String),

    #[error("failed to prepare statement `{statement}`")]
    Prepare {
        statement: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("statement `{statement}` failed")]
    Execute {
        statement: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("failed to decode rows of `{statement}`")]
    Decode {
        statement: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("column `{column}` of `{statement}` was unexpectedly null")]
    UnexpectedNull {
        statement: &'static str,
        column: &'static str,
    },

    #[error("value for column `{column}` is out of range")]
    OutOfRange {
        column: &'static str,
        #[source]
        source: Option<BoxError>,
    },
}

impl StoreError {
    pub(crate) fn connect(source: impl StdError + Send + Sync + 'static) -> Self {
        Self::Connect(Box::new(source))
    }

    pub(crate) fn prepare(
        statement: &'static str,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Prepare {
            statement,
            source: Box::new(source),
        }
    }

    pub(crate) fn execute(
        statement: &'static str,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Execute {
            statement,
            source: Box::new(source),
        }
    }

    pub(crate) fn decode(
        statement: &'static str,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Decode {
            statement,
            source: Box::new(source),
        }
    }

    pub(crate) fn out_of_range(
        column: &'static str,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::OutOfRange {
            column,
            source: Some(Box::new(source)),
        }
    }
}
