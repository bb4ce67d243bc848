#![cfg_attr(docsrs, feature(doc_cfg))]
//! `sqlsoda` applies and reverts versioned SQL migration scripts, recording which versions
//! have been applied in a table inside the target database.
//!
//! # Migration files
//!
//! A migrations directory holds pairs of plain SQL files:
//!
//! ```text
//! migrations/
//!   20230106093513_create_users.up.sql
//!   20230106093513_create_users.down.sql
//!   20230201120000_add_email.up.sql
//!   20230201120000_add_email.down.sql
//! ```
//!
//! The 14-digit prefix is the version. Every up script needs a down script with the same
//! version; [load_migrations] refuses directories where they do not pair up, and any file not
//! following the naming scheme fails the load.
//!
//! # Applying
//!
//! [Migrator::migrate_up] and [Migrator::migrate_down] each run inside a single transaction.
//! Either every script executed by the call commits together with its version-table row, or
//! the database is left exactly as it was.
//!
//! ```
//! # #[cfg(not(feature = "sqlite"))]
//! # fn main() {}
//! # #[cfg(feature = "sqlite")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use rusqlite::Connection;
//! use sqlsoda::{load_migrations, Migrator, Step};
//!
//! let dir = tempfile::tempdir()?;
//! std::fs::write(
//!     dir.path().join("20230106093513_create_users.up.sql"),
//!     "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);",
//! )?;
//! std::fs::write(
//!     dir.path().join("20230106093513_create_users.down.sql"),
//!     "DROP TABLE users;",
//! )?;
//!
//! let migrator = Migrator::new(load_migrations(dir.path())?);
//! let mut conn = Connection::open_in_memory()?;
//!
//! let report = migrator.migrate_up(&mut conn, Step::All)?;
//! assert_eq!(report.migrations_run, vec![20230106093513]);
//!
//! // a second run finds nothing left to do
//! assert!(migrator.migrate_up(&mut conn, Step::All)?.nothing_to_migrate());
//!
//! let report = migrator.migrate_down(&mut conn, Step::Limit(1))?;
//! assert_eq!(report.migrations_run, vec![20230106093513]);
//! # Ok(())
//! # }
//! ```
//!
//! # Ordering
//!
//! Applied versions are compared with the loaded scripts by position, not by membership: the
//! n-th recorded version must equal the n-th script's version. Renumbering, removing or
//! inserting a script below the applied range is reported as [Error::Inconsistent] and
//! nothing runs.
//!
//! # Database support
//!
//! - [`SQLite`](sqlite) - available with the `sqlite` feature flag (on by default).
//! - [`PostgreSQL`](postgres) - available with the `postgres` feature flag.
//! - Anything else: implement [Database] and [Transaction].

mod database;
pub use database::{Database, Transaction};

mod error;
pub use error::{DriverError, Error, InvalidMigration};

mod loader;
pub use loader::{load_migrations, parse_file_name, MigrationSet, ParsedFileName, VERSION_DIGITS};

mod migration;
pub use migration::{split_statements, Direction, SqlMigration};

mod migrator;
pub use migrator::{MigrationReport, MigrationStatus, Migrator, Step};

mod version_store;
pub use version_store::{VersionStore, DEFAULT_VERSION_TABLE_NAME};

#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite;

#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres;

#[cfg(feature = "testing")]
#[cfg_attr(docsrs, doc(cfg(feature = "testing")))]
pub mod testing;

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(all(test, feature = "postgres"))]
pub(crate) mod test_postgres;
