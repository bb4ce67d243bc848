//! In-memory stand-in for a transactional database, used by unit tests.
//!
//! Ledger rows and executed statements are staged on the transaction and only written back
//! to the [MemoryDatabase] on commit. `attempted` records every statement sent, committed or not.

use crate::database::{Database, Transaction};
use crate::error::DriverError;

#[derive(Debug, Default)]
pub(crate) struct MemoryDatabase {
    pub ledger: Vec<Option<String>>,
    pub executed: Vec<String>,
    pub attempted: Vec<String>,
    pub ledger_table_created: bool,
    pub commits: usize,
    fail_on: Option<String>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the ledger with already-applied versions.
    pub fn with_ledger(versions: &[u64]) -> Self {
        Self {
            ledger: versions.iter().map(|v| Some(v.to_string())).collect(),
            ledger_table_created: true,
            ..Self::default()
        }
    }

    /// Any statement containing `needle` fails.
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    /// Parsed ledger contents, in row order.
    pub fn ledger_versions(&self) -> Vec<u64> {
        self.ledger
            .iter()
            .flatten()
            .filter_map(|v| v.parse().ok())
            .collect()
    }
}

pub(crate) struct MemoryTransaction<'a> {
    db: &'a mut MemoryDatabase,
    ledger: Vec<Option<String>>,
    executed: Vec<String>,
    ledger_table_created: bool,
}

impl Database for MemoryDatabase {
    type Tx<'a> = MemoryTransaction<'a>;

    fn begin(&mut self) -> Result<MemoryTransaction<'_>, DriverError> {
        Ok(MemoryTransaction {
            ledger: self.ledger.clone(),
            executed: Vec::new(),
            ledger_table_created: self.ledger_table_created,
            db: self,
        })
    }
}

impl MemoryTransaction<'_> {
    fn check(&mut self, statement: &str) -> Result<(), DriverError> {
        self.db.attempted.push(statement.to_string());
        match &self.db.fail_on {
            Some(needle) if statement.contains(needle.as_str()) => Err(DriverError::Generic(
                format!("simulated failure executing {statement:?}"),
            )),
            _ => Ok(()),
        }
    }
}

impl Transaction for MemoryTransaction<'_> {
    fn execute(&mut self, statement: &str) -> Result<(), DriverError> {
        self.check(statement)?;
        if statement.starts_with("CREATE TABLE IF NOT EXISTS") {
            self.ledger_table_created = true;
        } else {
            self.executed.push(statement.to_string());
        }
        Ok(())
    }

    fn execute_with_param(&mut self, statement: &str, param: &str) -> Result<(), DriverError> {
        self.check(statement)?;
        if !self.ledger_table_created {
            return Err(DriverError::Generic("no such table".to_string()));
        }
        if statement.starts_with("INSERT") {
            self.ledger.push(Some(param.to_string()));
        } else if statement.starts_with("DELETE") {
            self.ledger.retain(|row| row.as_deref() != Some(param));
        } else {
            return Err(DriverError::Generic(format!(
                "unsupported statement {statement:?}"
            )));
        }
        Ok(())
    }

    fn query_column(&mut self, query: &str) -> Result<Vec<Option<String>>, DriverError> {
        self.check(query)?;
        if !self.ledger_table_created {
            return Err(DriverError::Generic("no such table".to_string()));
        }
        Ok(self.ledger.clone())
    }

    fn placeholder(&self, index: usize) -> String {
        format!("?{index}")
    }

    fn commit(self) -> Result<(), DriverError> {
        self.db.ledger = self.ledger;
        self.db.executed.extend(self.executed);
        self.db.ledger_table_created = self.ledger_table_created;
        self.db.commits += 1;
        Ok(())
    }
}
