//! Testing utilities for migration scripts, backed by an in-memory SQLite database.
//!
//! # Example
//!
//! ```
//! # #[cfg(not(feature = "testing"))]
//! # fn main() {}
//! # #[cfg(feature = "testing")]
//! # fn main() -> Result<(), sqlsoda::Error> {
//! use sqlsoda::testing::SqliteTestHarness;
//! use sqlsoda::{MigrationSet, Migrator, SqlMigration, Step};
//!
//! let set = MigrationSet::new(
//!     vec![SqlMigration::new(
//!         20240101000000,
//!         "users",
//!         "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);",
//!         "20240101000000_users.up.sql",
//!     )],
//!     vec![SqlMigration::new(
//!         20240101000000,
//!         "users",
//!         "DROP TABLE users;",
//!         "20240101000000_users.down.sql",
//!     )],
//! )?;
//! let mut harness = SqliteTestHarness::new(Migrator::new(set))?;
//!
//! harness.migrate_up(Step::All)?;
//! harness.assert_table_exists("users")?;
//! harness.execute("INSERT INTO users VALUES (1, 'alice')")?;
//! let name: String = harness.query_one("SELECT name FROM users WHERE id = 1")?;
//! assert_eq!(name, "alice");
//!
//! harness.migrate_down(Step::All)?;
//! harness.assert_table_not_exists("users")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use rusqlite::types::FromSql;
use rusqlite::Connection;

use crate::{load_migrations, Error, MigrationReport, Migrator, Step};

/// A test harness owning an in-memory database and the [Migrator] under test.
#[derive(Debug)]
pub struct SqliteTestHarness {
    conn: Connection,
    migrator: Migrator,
}

impl SqliteTestHarness {
    pub fn new(migrator: Migrator) -> Result<Self, Error> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            migrator,
        })
    }

    /// Load the scripts in `dir` and build a harness around them.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, Error> {
        Self::new(Migrator::new(load_migrations(dir)?))
    }

    pub fn migrate_up(&mut self, step: impl Into<Step>) -> Result<MigrationReport, Error> {
        self.migrator.migrate_up(&mut self.conn, step)
    }

    pub fn migrate_down(&mut self, step: impl Into<Step>) -> Result<MigrationReport, Error> {
        self.migrator.migrate_down(&mut self.conn, step)
    }

    /// Versions currently recorded in the ledger, ascending.
    pub fn applied_versions(&mut self) -> Result<Vec<u64>, Error> {
        Ok(self.migrator.status(&mut self.conn)?.applied)
    }

    /// Run arbitrary SQL outside of any migration, e.g. to seed data.
    pub fn execute(&mut self, sql: &str) -> Result<(), Error> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Run a query expected to return a single value.
    pub fn query_one<T: FromSql>(&self, sql: &str) -> Result<T, Error> {
        Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
    }

    pub fn assert_table_exists(&self, table: &str) -> Result<(), Error> {
        if !self.table_exists(table)? {
            return Err(Error::Driver(
                format!("expected table {table:?} to exist").into(),
            ));
        }
        Ok(())
    }

    pub fn assert_table_not_exists(&self, table: &str) -> Result<(), Error> {
        if self.table_exists(table)? {
            return Err(Error::Driver(
                format!("expected table {table:?} not to exist").into(),
            ));
        }
        Ok(())
    }

    /// Direct access to the underlying connection.
    pub fn connection(&mut self) -> &mut Connection {
        &mut self.conn
    }

    fn table_exists(&self, table: &str) -> Result<bool, Error> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
