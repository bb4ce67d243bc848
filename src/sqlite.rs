//! # SQLite support
//!
//! [Database] is implemented for [rusqlite::Connection], so a connection can be handed straight
//! to [Migrator::migrate_up](crate::Migrator::migrate_up):
//!
//! ```
//! use rusqlite::Connection;
//! use sqlsoda::{MigrationSet, Migrator, SqlMigration, Step};
//!
//! let set = MigrationSet::new(
//!     vec![SqlMigration::new(
//!         20240101000000,
//!         "create_users",
//!         "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);",
//!         "20240101000000_create_users.up.sql",
//!     )],
//!     vec![SqlMigration::new(
//!         20240101000000,
//!         "create_users",
//!         "DROP TABLE users;",
//!         "20240101000000_create_users.down.sql",
//!     )],
//! )
//! .unwrap();
//!
//! let mut conn = Connection::open_in_memory().unwrap();
//! let report = Migrator::new(set).migrate_up(&mut conn, Step::All).unwrap();
//! assert_eq!(report.migrations_run, vec![20240101000000]);
//! ```
//!
//! Statements run through `execute_batch`, so DDL, DML and statements that return rows are
//! all accepted. SQLite DDL is transactional; a failed run leaves no trace, not even the
//! version table if this run created it.

use rusqlite::types::Value;
use rusqlite::Connection;

use crate::database::{Database, Transaction};
use crate::error::DriverError;

impl Database for Connection {
    type Tx<'a> = rusqlite::Transaction<'a>;

    fn begin(&mut self) -> Result<rusqlite::Transaction<'_>, DriverError> {
        Ok(self.transaction()?)
    }
}

impl Transaction for rusqlite::Transaction<'_> {
    fn execute(&mut self, statement: &str) -> Result<(), DriverError> {
        let conn: &Connection = self;
        conn.execute_batch(statement)?;
        Ok(())
    }

    fn execute_with_param(&mut self, statement: &str, param: &str) -> Result<(), DriverError> {
        let conn: &Connection = self;
        conn.execute(statement, [param])?;
        Ok(())
    }

    fn query_column(&mut self, query: &str) -> Result<Vec<Option<String>>, DriverError> {
        let conn: &Connection = self;
        let mut stmt = conn.prepare(query)?;
        let values = stmt
            .query_map([], |row| row.get::<_, Value>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(values
            .into_iter()
            .map(|value| match value {
                Value::Null => None,
                Value::Integer(i) => Some(i.to_string()),
                Value::Real(f) => Some(f.to_string()),
                Value::Text(s) => Some(s),
                Value::Blob(bytes) => String::from_utf8(bytes).ok(),
            })
            .collect())
    }

    fn placeholder(&self, index: usize) -> String {
        format!("?{index}")
    }

    fn commit(self) -> Result<(), DriverError> {
        rusqlite::Transaction::commit(self)?;
        Ok(())
    }
}
