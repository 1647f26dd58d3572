use std::fmt;

/// Storage error kinds for the token cache and mapping stores
#[derive(Debug, Clone)]
pub enum DatabaseErrorKind {
    /// Connection pool is exhausted
    PoolExhausted,
    /// Record not found
    NotFound {
        entity: String,
        id: String,
    },
    /// Unique constraint violation (e.g., duplicate key)
    UniqueConstraintViolation {
        entity: String,
        value: String,
    },
    /// Query execution error
    QueryError {
        message: String,
    },
    /// Database connection error
    ConnectionError {
        message: String,
    },
    /// Stored value could not be encoded or decoded
    SerializationError {
        message: String,
    },
    /// Configuration error
    ConfigError {
        message: String,
    },
    /// Migration failed
    MigrationError {
        message: String,
    },
    /// Unknown error
    Unknown {
        message: String,
    },
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DatabaseError>;

#[derive(Debug, Clone)]
pub struct DatabaseError {
    pub kind: DatabaseErrorKind,
    pub context: Option<String>,
}

impl DatabaseError {
    pub fn new(kind: DatabaseErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self.kind, DatabaseErrorKind::UniqueConstraintViolation { .. })
    }

    /// Map SQLx error to our custom error type
    pub fn from_sqlx(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => Self::new(DatabaseErrorKind::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            }),
            sqlx::Error::PoolTimedOut => Self::new(DatabaseErrorKind::PoolExhausted),
            sqlx::Error::PoolClosed => Self::new(DatabaseErrorKind::ConnectionError {
                message: "Connection pool is closed".to_string(),
            }),
            sqlx::Error::Configuration(msg) => Self::new(DatabaseErrorKind::ConfigError {
                message: msg.to_string(),
            }),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    Self::new(DatabaseErrorKind::UniqueConstraintViolation {
                        entity: db_err.table().unwrap_or("unknown").to_string(),
                        value: "provided value".to_string(),
                    })
                } else {
                    Self::new(DatabaseErrorKind::QueryError {
                        message: db_err.message().to_string(),
                    })
                }
            }
            sqlx::Error::Io(io_err) => Self::new(DatabaseErrorKind::ConnectionError {
                message: io_err.to_string(),
            }),
            _ => Self::new(DatabaseErrorKind::Unknown {
                message: error.to_string(),
            }),
        }
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match &self.kind {
            DatabaseErrorKind::PoolExhausted => {
                "Database connection pool exhausted. Please try again.".to_string()
            }
            DatabaseErrorKind::NotFound { entity, id } => {
                format!("{} with ID '{}' not found", entity, id)
            }
            DatabaseErrorKind::UniqueConstraintViolation { entity, value } => {
                format!("A {} record with '{}' already exists", entity, value)
            }
            DatabaseErrorKind::QueryError { message } => {
                format!("Database query failed: {}", message)
            }
            DatabaseErrorKind::ConnectionError { message } => {
                format!("Database connection error: {}", message)
            }
            DatabaseErrorKind::SerializationError { message } => {
                format!("Stored value could not be decoded: {}", message)
            }
            DatabaseErrorKind::ConfigError { message } => {
                format!("Database configuration error: {}", message)
            }
            DatabaseErrorKind::MigrationError { message } => {
                format!("Database migration failed: {}", message)
            }
            DatabaseErrorKind::Unknown { message } => {
                format!("Unknown database error: {}", message)
            }
        };

        if let Some(context) = &self.context {
            write!(f, "{} ({})", message, context)
        } else {
            write!(f, "{}", message)
        }
    }
}

impl std::error::Error for DatabaseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error = DatabaseError::from_sqlx(sqlx::Error::RowNotFound);
        assert!(matches!(error.kind, DatabaseErrorKind::NotFound { .. }));
    }

    #[test]
    fn test_pool_timeout_maps_to_pool_exhausted() {
        let error = DatabaseError::from_sqlx(sqlx::Error::PoolTimedOut);
        assert!(matches!(error.kind, DatabaseErrorKind::PoolExhausted));
    }

    #[test]
    fn test_display_includes_context() {
        let error = DatabaseError::new(DatabaseErrorKind::NotFound {
            entity: "TokenMapping".to_string(),
            id: "gw_1".to_string(),
        })
        .with_context("callback");
        assert_eq!(
            error.to_string(),
            "TokenMapping with ID 'gw_1' not found (callback)"
        );
    }
}
