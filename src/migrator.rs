use std::time::{Duration, Instant};

use serde::Serialize;

use crate::database::{Database, Transaction};
use crate::error::Error;
use crate::loader::MigrationSet;
use crate::migration::{Direction, SqlMigration};
use crate::version_store::VersionStore;

/// How many scripts a single run may execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    /// No limit.
    #[default]
    All,
    /// At most this many. `Limit(0)` executes nothing.
    Limit(usize),
}

impl Step {
    fn max_scripts(self) -> usize {
        match self {
            Self::All => usize::MAX,
            Self::Limit(n) => n,
        }
    }
}

/// Negative counts (the command-line default is `-1`) mean "no limit".
impl From<i64> for Step {
    fn from(value: i64) -> Self {
        usize::try_from(value).map_or(Self::All, Self::Limit)
    }
}

impl From<usize> for Step {
    fn from(value: usize) -> Self {
        Self::Limit(value)
    }
}

/// A report of the scripts executed by one migrate call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub direction: Direction,
    /// Versions executed, in execution order. Empty when there was nothing to do.
    pub migrations_run: Vec<u64>,
}

impl MigrationReport {
    pub fn nothing_to_migrate(&self) -> bool {
        self.migrations_run.is_empty()
    }
}

/// Where the database stands relative to the loaded migrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// Versions recorded in the ledger, ascending.
    pub applied: Vec<u64>,
    /// Versions a full migrate-up would apply, in order.
    pub pending: Vec<u64>,
}

/// The entrypoint for migrating a database up or down through a [MigrationSet].
///
/// Each call to [Migrator::migrate_up] or [Migrator::migrate_down] runs inside exactly one
/// transaction: either every script it executed and every ledger change it made commits, or
/// none of it does.
pub struct Migrator {
    migrations: MigrationSet,
    version_store: VersionStore,
    on_migration_start: Option<Box<dyn Fn(u64, &str) + Send + Sync>>,
    on_migration_complete: Option<Box<dyn Fn(u64, &str, Duration) + Send + Sync>>,
    on_migration_error: Option<Box<dyn Fn(u64, &str, &Error) + Send + Sync>>,
}

// Manual Debug impl since closures don't implement Debug
impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("migrations", &self.migrations)
            .field("version_store", &self.version_store)
            .field("on_migration_start", &self.on_migration_start.is_some())
            .field(
                "on_migration_complete",
                &self.on_migration_complete.is_some(),
            )
            .field("on_migration_error", &self.on_migration_error.is_some())
            .finish()
    }
}

impl Migrator {
    pub fn new(migrations: MigrationSet) -> Self {
        Self {
            migrations,
            version_store: VersionStore::default(),
            on_migration_start: None,
            on_migration_complete: None,
            on_migration_error: None,
        }
    }

    /// Record applied versions somewhere other than the default `schema_migration` table.
    pub fn with_version_store(mut self, version_store: VersionStore) -> Self {
        self.version_store = version_store;
        self
    }

    /// Set a callback invoked before each script runs, with its version and file name.
    pub fn on_migration_start<F>(mut self, callback: F) -> Self
    where
        F: Fn(u64, &str) + Send + Sync + 'static,
    {
        self.on_migration_start = Some(Box::new(callback));
        self
    }

    /// Set a callback invoked after each script and its ledger update succeed.
    ///
    /// Completion is per script; the enclosing transaction may still roll back later.
    pub fn on_migration_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(u64, &str, Duration) + Send + Sync + 'static,
    {
        self.on_migration_complete = Some(Box::new(callback));
        self
    }

    /// Set a callback invoked when a script or its ledger update fails.
    pub fn on_migration_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(u64, &str, &Error) + Send + Sync + 'static,
    {
        self.on_migration_error = Some(Box::new(callback));
        self
    }

    pub fn migrations(&self) -> &MigrationSet {
        &self.migrations
    }

    pub fn version_store(&self) -> &VersionStore {
        &self.version_store
    }

    /// Apply up to `step` pending up-migrations, oldest first.
    pub fn migrate_up<D: Database>(
        &self,
        db: &mut D,
        step: impl Into<Step>,
    ) -> Result<MigrationReport, Error> {
        self.run(db, Direction::Up, step.into())
    }

    /// Revert up to `step` applied migrations, most recent first.
    pub fn migrate_down<D: Database>(
        &self,
        db: &mut D,
        step: impl Into<Step>,
    ) -> Result<MigrationReport, Error> {
        self.run(db, Direction::Down, step.into())
    }

    /// The up-migrations [Migrator::migrate_up] would execute, without executing them.
    pub fn preview_up<D: Database>(
        &self,
        db: &mut D,
        step: impl Into<Step>,
    ) -> Result<Vec<&SqlMigration>, Error> {
        let applied = self.applied_versions(db)?;
        self.plan_up(&applied, step.into())
    }

    /// The down-migrations [Migrator::migrate_down] would execute, in execution order.
    pub fn preview_down<D: Database>(
        &self,
        db: &mut D,
        step: impl Into<Step>,
    ) -> Result<Vec<&SqlMigration>, Error> {
        let applied = self.applied_versions(db)?;
        self.plan_down(&applied, step.into())
    }

    /// Compare the ledger against the loaded migrations without changing anything.
    pub fn status<D: Database>(&self, db: &mut D) -> Result<MigrationStatus, Error> {
        let applied = self.applied_versions(db)?;
        let pending = self
            .plan_up(&applied, Step::All)?
            .into_iter()
            .map(SqlMigration::version)
            .collect();
        Ok(MigrationStatus { applied, pending })
    }

    /// Read the ledger in a transaction that is rolled back afterwards.
    fn applied_versions<D: Database>(&self, db: &mut D) -> Result<Vec<u64>, Error> {
        let mut tx = db.begin()?;
        self.version_store.ensure_table(&mut tx)?;
        let applied = self.version_store.read_versions(&mut tx)?;
        Ok(applied)
    }

    fn run<D: Database>(
        &self,
        db: &mut D,
        direction: Direction,
        step: Step,
    ) -> Result<MigrationReport, Error> {
        // Dropping `tx` on any early return rolls back everything done so far.
        let mut tx = db.begin()?;
        self.version_store.ensure_table(&mut tx)?;
        let applied = self.version_store.read_versions(&mut tx)?;

        tracing::debug!(
            direction = %direction,
            applied = ?applied,
            available = ?self.migrations.ups().iter().map(SqlMigration::version).collect::<Vec<_>>(),
            step = ?step,
            "Considering migrations to run"
        );

        let plan = match direction {
            Direction::Up => self.plan_up(&applied, step)?,
            Direction::Down => self.plan_down(&applied, step)?,
        };

        let mut migrations_run = Vec::with_capacity(plan.len());
        for migration in plan {
            self.apply(&mut tx, migration, direction)?;
            migrations_run.push(migration.version());
        }

        if migrations_run.is_empty() {
            tracing::info!("Nothing to migrate {}.", direction);
        }
        tx.commit()?;

        Ok(MigrationReport {
            direction,
            migrations_run,
        })
    }

    /// Walk the ups positionally against the ledger. Entries inside the applied range must
    /// match exactly; everything after it is pending.
    fn plan_up(&self, applied: &[u64], step: Step) -> Result<Vec<&SqlMigration>, Error> {
        let ups = self.migrations.ups();
        for (applied_version, migration) in applied.iter().zip(ups) {
            if *applied_version != migration.version() {
                return Err(Error::Inconsistent {
                    applied: *applied_version,
                    expected: migration.version(),
                });
            }
        }

        Ok(ups
            .iter()
            .skip(applied.len())
            .take(step.max_scripts())
            .collect())
    }

    /// Match every applied version to the down-migration at the same position, then take the
    /// most recent ones first.
    fn plan_down(&self, applied: &[u64], step: Step) -> Result<Vec<&SqlMigration>, Error> {
        let downs = self.migrations.downs();
        let mut on_db = Vec::with_capacity(applied.len());
        for (i, applied_version) in applied.iter().enumerate() {
            let migration = downs.get(i).ok_or_else(|| Error::MissingDownMigration {
                applied: applied.len(),
                available: downs.len(),
            })?;
            if *applied_version != migration.version() {
                return Err(Error::Inconsistent {
                    applied: *applied_version,
                    expected: migration.version(),
                });
            }
            on_db.push(migration);
        }

        Ok(on_db.into_iter().rev().take(step.max_scripts()).collect())
    }

    fn apply<T: Transaction>(
        &self,
        tx: &mut T,
        migration: &SqlMigration,
        direction: Direction,
    ) -> Result<(), Error> {
        let version = migration.version();
        let file_name = migration.file_name();
        let _span = tracing::info_span!(
            "migration",
            direction = %direction,
            version,
            file = %file_name
        )
        .entered();
        tracing::info!("Execute {}.", file_name);

        if let Some(ref callback) = self.on_migration_start {
            callback(version, file_name);
        }
        let started = Instant::now();

        let result = migration.execute(tx).and_then(|()| match direction {
            Direction::Up => self.version_store.record_version(tx, version),
            Direction::Down => self.version_store.erase_version(tx, version),
        });

        match result {
            Ok(()) => {
                let elapsed = started.elapsed();
                tracing::info!(duration_ms = elapsed.as_millis() as u64, "Migration finished");
                if let Some(ref callback) = self.on_migration_complete {
                    callback(version, file_name, elapsed);
                }
                Ok(())
            }
            Err(error) => {
                tracing::error!(error = %error, "Migration failed");
                if let Some(ref callback) = self.on_migration_error {
                    callback(version, file_name, &error);
                }
                Err(error)
            }
        }
    }
}
