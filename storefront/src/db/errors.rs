use thiserror::Error;

/// Errors surfaced by the repositories.
///
/// Postgres constraint failures are classified by SQLSTATE so handlers can turn them into
/// client errors instead of 500s.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Entity not found")]
    NotFound,

    #[error("Unique constraint violation on {table}: {message}")]
    UniqueViolation {
        constraint: Option<String>,
        table: String,
        message: String,
    },

    #[error("Check constraint violation on {table}: {message}")]
    CheckViolation {
        constraint: Option<String>,
        table: String,
        message: String,
    },

    #[error("Foreign key violation on {table}: {message}")]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: String,
        message: String,
    },

    #[error("Database error: {0}")]
    Other(#[source] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

// SQLSTATE codes we care about
const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(ref db_err) => {
                let constraint = db_err.constraint().map(str::to_string);
                let table = db_err.table().unwrap_or("unknown").to_string();
                let message = db_err.message().to_string();
                let code = db_err.code().map(|c| c.into_owned());

                match code.as_deref() {
                    Some(UNIQUE_VIOLATION) => DbError::UniqueViolation {
                        constraint,
                        table,
                        message,
                    },
                    Some(CHECK_VIOLATION) => DbError::CheckViolation {
                        constraint,
                        table,
                        message,
                    },
                    Some(FOREIGN_KEY_VIOLATION) => DbError::ForeignKeyViolation {
                        constraint,
                        table,
                        message,
                    },
                    _ => DbError::Other(err),
                }
            }
            other => DbError::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(DbError::from(sqlx::Error::RowNotFound), DbError::NotFound));
    }

    #[test]
    fn test_other_errors_are_wrapped() {
        let err = DbError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DbError::Other(sqlx::Error::PoolTimedOut)));
    }
}
