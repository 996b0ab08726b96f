use thiserror::Error;

use crate::persistence::StorageError;
use crate::store::StoreError;

pub type ServiceResult<T> = core::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Prompt(#[from] dialoguer::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_failures_convert_and_keep_their_message() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only disk");
        let err: ServiceError = StorageError::from(io).into();
        assert!(matches!(err, ServiceError::Storage(StorageError::Io(_))));
        assert_eq!(err.to_string(), "I/O error: read-only disk");

        let blocked: ServiceError = StoreError::LastPlanner.into();
        assert!(matches!(blocked, ServiceError::Store(StoreError::LastPlanner)));
    }
}
