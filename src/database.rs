//! The seam between the migration engine and a concrete database driver.
//!
//! The engine only ever holds one [Transaction] per invocation and hands it explicitly to
//! every call that touches the database. Dropping a transaction without calling
//! [Transaction::commit] must roll it back; that is the only cleanup path the engine relies on.

use crate::error::DriverError;

/// A database connection that can open read-write transactions.
pub trait Database {
    type Tx<'a>: Transaction
    where
        Self: 'a;

    /// Begin a read-write transaction.
    fn begin(&mut self) -> Result<Self::Tx<'_>, DriverError>;
}

/// An open transaction. Rolled back on drop unless committed.
pub trait Transaction {
    /// Execute a single statement that takes no parameters. Any rows it produces are discarded.
    fn execute(&mut self, statement: &str) -> Result<(), DriverError>;

    /// Execute a statement with one text parameter bound at placeholder index 1.
    fn execute_with_param(&mut self, statement: &str, param: &str) -> Result<(), DriverError>;

    /// Run a query and return its first column as text, one entry per row.
    /// Non-text values are rendered as text where possible; NULLs come back as `None`.
    fn query_column(&mut self, query: &str) -> Result<Vec<Option<String>>, DriverError>;

    /// The driver's spelling of the positional parameter at `index` (1-based).
    fn placeholder(&self, index: usize) -> String;

    fn commit(self) -> Result<(), DriverError>
    where
        Self: Sized;
}
