use thiserror::Error;

use crate::model::{EntityKind, Id};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} not found with id: {id}")]
    NotFound { entity: EntityKind, id: Id },

    #[error("{0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Store(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(entity: EntityKind, id: Id) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
