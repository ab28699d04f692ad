//! Error types for the Quyca reporting service.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

/// Errors from the document store layer.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// MongoDB driver error (connection, server selection, command failure, etc.)
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// A document could not be decoded into the expected model
    #[error("Failed to decode document: {0}")]
    Decode(#[from] bson::de::Error),

    /// Document not found
    #[error("Document not found: {collection}/{id}")]
    NotFound {
        /// Collection that was queried
        collection: String,
        /// Identifier that was looked up
        id: String,
    },

    /// Identifier that cannot be used as a document key
    #[error("Invalid identifier: {0}")]
    InvalidId(String),
}

impl StoreError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound { collection: collection.into(), id: id.into() }
    }

    /// Returns true if retrying the same operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Mongo(err) => {
                matches!(
                    *err.kind,
                    mongodb::error::ErrorKind::Io(_)
                        | mongodb::error::ErrorKind::ServerSelection { .. }
                        | mongodb::error::ErrorKind::ConnectionPoolCleared { .. }
                )
            }
            _ => false,
        }
    }
}

/// Errors from service and plot execution.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    /// Error from the document store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Input validation failed
    #[error("Validation error: {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// The requested plot does not exist or does not apply to the entity
    #[error("Plot '{plot}' is not available for {entity}")]
    UnsupportedPlot {
        /// Requested plot name
        plot: String,
        /// Entity kind the plot was requested for
        entity: String,
    },

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    /// Internal service logic error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    /// Create an unsupported plot error.
    #[must_use]
    pub fn unsupported_plot(plot: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::UnsupportedPlot { plot: plot.into(), entity: entity.into() }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if the error was caused by a missing document.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(StoreError::NotFound { .. }))
    }

    /// Convert to a user-friendly error message for API responses.
    #[must_use]
    pub fn to_user_message(&self) -> String {
        match self {
            Self::Store(StoreError::NotFound { collection, id }) => {
                format!("No {collection} record with id {id}.")
            }
            Self::Store(StoreError::InvalidId(id)) => format!("'{id}' is not a valid identifier."),
            Self::Store(_) => "The database is unavailable, please retry later.".to_string(),
            Self::Validation { field, message } => {
                format!("Invalid input for '{field}': {message}")
            }
            _ => self.to_string(),
        }
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_not_retryable() {
        assert!(!StoreError::not_found("works", "abc").is_retryable());
        assert!(!StoreError::InvalidId(String::new()).is_retryable());
    }

    #[test]
    fn test_service_error_not_found() {
        let err = ServiceError::from(StoreError::not_found("person", "p1"));
        assert!(err.is_not_found());
        assert_eq!(err.to_user_message(), "No person record with id p1.");

        assert!(!ServiceError::internal("boom").is_not_found());
    }

    #[test]
    fn test_service_error_user_message() {
        let err = ServiceError::validation("years", "start year after end year");
        assert!(err.to_user_message().contains("years"));
        assert!(err.to_user_message().contains("start year after end year"));

        let err = ServiceError::unsupported_plot("h_by_affiliation", "person");
        assert_eq!(err.to_user_message(), "Plot 'h_by_affiliation' is not available for person");
    }
}
