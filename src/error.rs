use std::num::ParseIntError;
use std::path::PathBuf;

/// Failure reported by the underlying database driver.
#[derive(thiserror::Error, Debug)]
pub enum DriverError {
    #[cfg(feature = "sqlite")]
    #[error("{0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[cfg(feature = "postgres")]
    #[error("{0}")]
    Postgres(#[from] postgres::Error),
    #[error("{0}")]
    Generic(String),
}

impl From<String> for DriverError {
    fn from(value: String) -> Self {
        Self::Generic(value)
    }
}

/// Why a single migration record refused to execute.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidMigration {
    #[error("version is not a positive number")]
    NonPositiveVersion,
    #[error("description is empty")]
    EmptyDescription,
    #[error("sql file is empty")]
    EmptySql,
    #[error("file name is empty")]
    EmptyFileName,
}

/// Error type for the sqlsoda crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read migration directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read migration file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{file_name:?} is not a valid migration SQL file name")]
    InvalidFileName { file_name: String },
    #[error("{file_name:?} has an invalid version: {source}")]
    InvalidVersion {
        file_name: String,
        source: ParseIntError,
    },
    #[error("migration UPs and DOWNs are not well paired: {ups} up scripts vs. {downs} down scripts")]
    UnpairedCount { ups: usize, downs: usize },
    #[error("migration UPs and DOWNs are not well paired at position {index}: up {up} vs. down {down}")]
    UnpairedVersion { index: usize, up: u64, down: u64 },
    #[error("schema version is inconsistent. {applied} vs. {expected}")]
    Inconsistent { applied: u64, expected: u64 },
    #[error("schema has {applied} versions, more than the {available} migration down SQLs")]
    MissingDownMigration { applied: usize, available: usize },
    #[error("migration {file_name:?} is invalid: {reason}")]
    InvalidMigration {
        file_name: String,
        reason: InvalidMigration,
    },
    #[error("{statement} {source}")]
    Statement {
        statement: String,
        source: DriverError,
    },
    #[error("{0:?} is not a valid version table name")]
    InvalidTableName(String),
    #[error(transparent)]
    Driver(#[from] DriverError),
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        Self::Driver(DriverError::Rusqlite(value))
    }
}

#[cfg(feature = "postgres")]
impl From<postgres::Error> for Error {
    fn from(value: postgres::Error) -> Self {
        Self::Driver(DriverError::Postgres(value))
    }
}

impl Error {
    /// Problems with the migration directory itself, raised before any database access.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::ReadDir { .. }
                | Self::ReadFile { .. }
                | Self::InvalidFileName { .. }
                | Self::InvalidVersion { .. }
                | Self::UnpairedCount { .. }
                | Self::UnpairedVersion { .. }
        )
    }

    /// The recorded ledger disagrees with the loaded migrations.
    pub fn is_consistency_error(&self) -> bool {
        matches!(
            self,
            Self::Inconsistent { .. } | Self::MissingDownMigration { .. }
        )
    }

    /// A statement (migration script or ledger bookkeeping) was rejected by the database.
    pub fn is_execution_error(&self) -> bool {
        matches!(self, Self::Statement { .. })
    }

    /// The offending SQL, when the error came from executing a statement.
    pub fn statement(&self) -> Option<&str> {
        match self {
            Self::Statement { statement, .. } => Some(statement),
            _ => None,
        }
    }
}
