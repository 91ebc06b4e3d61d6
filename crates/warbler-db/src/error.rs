use rusqlite::{ErrorCode, ffi};
use thiserror::Error;
use warbler_types::error::WarblerError;

/// Store errors. Constraint violations are classified here so callers can
/// match on them instead of on SQLite result codes.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("duplicate value for {column}")]
    Duplicate { column: String },

    #[error("referenced row does not exist")]
    MissingReference,

    #[error("database lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

pub type DbResult<T> = std::result::Result<T, DbError>;

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, msg) = &err {
            if code.code == ErrorCode::ConstraintViolation {
                match code.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        return DbError::Duplicate {
                            column: constraint_column(msg.as_deref()),
                        };
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return DbError::MissingReference,
                    _ => {}
                }
            }
        }
        DbError::Sqlite(err)
    }
}

/// Pulls the first column out of "UNIQUE constraint failed: users.username".
fn constraint_column(msg: Option<&str>) -> String {
    msg.and_then(|m| m.split_once(": "))
        .and_then(|(_, cols)| cols.split(',').next())
        .map(|col| {
            let col = col.trim();
            col.rsplit_once('.').map_or(col, |(_, name)| name).to_string()
        })
        .unwrap_or_else(|| "unknown".to_string())
}

impl From<DbError> for WarblerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Duplicate { column } => match column.as_str() {
                "username" => WarblerError::value("Username already taken."),
                "email" => WarblerError::value("Email already registered."),
                other => WarblerError::value(format!("Duplicate value for {other}.")),
            },
            DbError::MissingReference => {
                WarblerError::value("Referenced record does not exist.")
            }
            other => WarblerError::Internal(other.to_string()),
        }
    }
}
