use std::fmt;

use serde::Serialize;

use crate::database::Transaction;
use crate::error::{Error, InvalidMigration};

/// Which way a migration script moves the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One SQL script, tagged with the version and description taken from its file name.
///
/// Records are immutable once loaded. Well-formedness is checked by [SqlMigration::validate]
/// right before the script runs, not at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlMigration {
    version: u64,
    description: String,
    sql: String,
    file_name: String,
}

impl SqlMigration {
    pub fn new(
        version: u64,
        description: impl Into<String>,
        sql: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            version,
            description: description.into(),
            sql: sql.into(),
            file_name: file_name.into(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The raw script body, exactly as read from disk.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn validate(&self) -> Result<(), InvalidMigration> {
        if self.version == 0 {
            return Err(InvalidMigration::NonPositiveVersion);
        }
        if self.description.is_empty() {
            return Err(InvalidMigration::EmptyDescription);
        }
        if self.sql.is_empty() {
            return Err(InvalidMigration::EmptySql);
        }
        if self.file_name.is_empty() {
            return Err(InvalidMigration::EmptyFileName);
        }
        Ok(())
    }

    /// The non-empty, trimmed statements of the script, in order.
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        split_statements(&self.sql).into_iter()
    }

    /// Validate the record, then run each of its statements in `tx`.
    /// The first failing statement aborts the record; nothing is retried.
    pub fn execute<T: Transaction>(&self, tx: &mut T) -> Result<(), Error> {
        self.validate().map_err(|reason| Error::InvalidMigration {
            file_name: self.file_name.clone(),
            reason,
        })?;

        for statement in self.statements() {
            tracing::debug!(file = %self.file_name, statement, "Executing statement");
            tx.execute(statement).map_err(|source| Error::Statement {
                statement: statement.to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Scan {
    Code,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment,
}

/// Split a script on `;`, ignoring semicolons inside quoted literals, quoted identifiers
/// and comments. Each piece is trimmed; empty pieces are dropped.
pub fn split_statements(sql: &str) -> Vec<&str> {
    let bytes = sql.as_bytes();
    let mut statements = Vec::new();
    let mut state = Scan::Code;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match state {
            Scan::Code => match b {
                b';' => {
                    statements.push(&sql[start..i]);
                    start = i + 1;
                }
                b'\'' => state = Scan::SingleQuoted,
                b'"' => state = Scan::DoubleQuoted,
                b'-' if next == Some(b'-') => {
                    state = Scan::LineComment;
                    i += 1;
                }
                b'/' if next == Some(b'*') => {
                    state = Scan::BlockComment;
                    i += 1;
                }
                _ => {}
            },
            // a doubled quote closes and immediately reopens, so '' needs no special case
            Scan::SingleQuoted if b == b'\'' => state = Scan::Code,
            Scan::DoubleQuoted if b == b'"' => state = Scan::Code,
            Scan::LineComment if b == b'\n' => state = Scan::Code,
            Scan::BlockComment if b == b'*' && next == Some(b'/') => {
                state = Scan::Code;
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    statements.push(&sql[start..]);

    statements
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
