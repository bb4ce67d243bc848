use crate::database::Transaction;
use crate::error::Error;

/// Default name of the table recording applied versions.
pub const DEFAULT_VERSION_TABLE_NAME: &str = "schema_migration";

/// Access to the applied-version ledger kept inside the target database.
///
/// Every call runs in the transaction passed to it; the store never opens a connection or
/// transaction of its own, so ledger rows commit or roll back together with the scripts
/// they describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionStore {
    table_name: String,
}

impl Default for VersionStore {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_VERSION_TABLE_NAME.to_string(),
        }
    }
}

impl VersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom ledger table. The name may be schema-qualified (`schema.table`).
    pub fn with_table_name(name: impl Into<String>) -> Result<Self, Error> {
        let table_name = name.into();
        if !is_valid_table_name(&table_name) {
            return Err(Error::InvalidTableName(table_name));
        }
        Ok(Self { table_name })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Create the ledger table if it does not exist yet. Safe to call on every run.
    pub fn ensure_table<T: Transaction>(&self, tx: &mut T) -> Result<(), Error> {
        let query = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n\tversion TEXT NOT NULL\n)",
            self.table_name
        );
        tx.execute(&query).map_err(|source| Error::Statement {
            statement: query,
            source,
        })
    }

    /// All recorded versions, ascending. NULL and non-numeric rows are skipped.
    pub fn read_versions<T: Transaction>(&self, tx: &mut T) -> Result<Vec<u64>, Error> {
        let query = format!(
            "SELECT version FROM {} ORDER BY version ASC",
            self.table_name
        );
        let rows = tx.query_column(&query).map_err(|source| Error::Statement {
            statement: query,
            source,
        })?;

        let mut versions: Vec<u64> = rows
            .into_iter()
            .flatten()
            .filter_map(|raw| match raw.trim().parse::<u64>() {
                Ok(version) => Some(version),
                Err(_) => {
                    tracing::warn!(value = %raw, "Ignoring non-numeric row in version table");
                    None
                }
            })
            .collect();
        versions.sort_unstable();
        Ok(versions)
    }

    pub fn record_version<T: Transaction>(&self, tx: &mut T, version: u64) -> Result<(), Error> {
        let query = format!(
            "INSERT INTO {}(version) VALUES ({})",
            self.table_name,
            tx.placeholder(1)
        );
        tx.execute_with_param(&query, &version.to_string())
            .map_err(|source| Error::Statement {
                statement: query,
                source,
            })
    }

    pub fn erase_version<T: Transaction>(&self, tx: &mut T, version: u64) -> Result<(), Error> {
        let query = format!(
            "DELETE FROM {} WHERE version = {}",
            self.table_name,
            tx.placeholder(1)
        );
        tx.execute_with_param(&query, &version.to_string())
            .map_err(|source| Error::Statement {
                statement: query,
                source,
            })
    }
}

fn is_valid_table_name(name: &str) -> bool {
    fn is_identifier(part: &str) -> bool {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    match name.split_once('.') {
        Some((schema, table)) => is_identifier(schema) && is_identifier(table),
        None => is_identifier(name),
    }
}
