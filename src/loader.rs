//! Discovery of migration scripts on disk.
//!
//! A migrations directory holds pairs of files named
//! `<14-digit version>_<description>.up.sql` and `<14-digit version>_<description>.down.sql`.
//! Any other regular file in the directory fails the whole load; subdirectories are ignored.

use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::migration::{Direction, SqlMigration};

/// Width of the numeric version prefix.
pub const VERSION_DIGITS: usize = 14;

/// The pieces of a well-formed migration file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedFileName<'a> {
    pub version: u64,
    pub description: &'a str,
    pub direction: Direction,
}

/// Parse `<14 digits>_<description>.(up|down).sql`.
///
/// The description may only contain lowercase ASCII letters, digits, `-` and `_`. It may be
/// empty; such a record loads but fails validation when it is about to run.
pub fn parse_file_name(file_name: &str) -> Result<ParsedFileName<'_>, Error> {
    let invalid = || Error::InvalidFileName {
        file_name: file_name.to_string(),
    };

    let stem = file_name.strip_suffix(".sql").ok_or_else(invalid)?;
    let (stem, direction) = if let Some(stem) = stem.strip_suffix(".up") {
        (stem, Direction::Up)
    } else if let Some(stem) = stem.strip_suffix(".down") {
        (stem, Direction::Down)
    } else {
        return Err(invalid());
    };

    let digits = stem.get(..VERSION_DIGITS).ok_or_else(invalid)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let description = stem[VERSION_DIGITS..]
        .strip_prefix('_')
        .ok_or_else(invalid)?;
    if !description
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
    {
        return Err(invalid());
    }

    let version = digits
        .parse::<u64>()
        .map_err(|source| Error::InvalidVersion {
            file_name: file_name.to_string(),
            source,
        })?;

    Ok(ParsedFileName {
        version,
        description,
        direction,
    })
}

/// Up and down migrations, positionally paired: `ups[i]` and `downs[i]` share a version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSet {
    ups: Vec<SqlMigration>,
    downs: Vec<SqlMigration>,
}

impl MigrationSet {
    /// Sort both lists by version (stable) and check that they pair up.
    pub fn new(mut ups: Vec<SqlMigration>, mut downs: Vec<SqlMigration>) -> Result<Self, Error> {
        ups.sort_by_key(SqlMigration::version);
        downs.sort_by_key(SqlMigration::version);

        if ups.len() != downs.len() {
            return Err(Error::UnpairedCount {
                ups: ups.len(),
                downs: downs.len(),
            });
        }
        if let Some((index, (up, down))) = ups
            .iter()
            .zip(&downs)
            .enumerate()
            .find(|(_, (up, down))| up.version() != down.version())
        {
            return Err(Error::UnpairedVersion {
                index,
                up: up.version(),
                down: down.version(),
            });
        }

        Ok(Self { ups, downs })
    }

    pub fn ups(&self) -> &[SqlMigration] {
        &self.ups
    }

    pub fn downs(&self) -> &[SqlMigration] {
        &self.downs
    }

    pub fn len(&self) -> usize {
        self.ups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ups.is_empty()
    }

    /// Iterate over `(up, down)` pairs in ascending version order.
    pub fn pairs(&self) -> impl Iterator<Item = (&SqlMigration, &SqlMigration)> {
        self.ups.iter().zip(&self.downs)
    }
}

/// Read every migration script in `dir` (non-recursively) and pair ups with downs.
pub fn load_migrations(dir: impl AsRef<Path>) -> Result<MigrationSet, Error> {
    let dir = dir.as_ref();
    let read_dir_err = |source: std::io::Error| Error::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut ups = Vec::new();
    let mut downs = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        if entry.file_type().map_err(read_dir_err)?.is_dir() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        let parsed = parse_file_name(&file_name)?;
        let path = entry.path();
        let sql = fs::read_to_string(&path).map_err(|source| Error::ReadFile { path, source })?;

        let migration = SqlMigration::new(parsed.version, parsed.description, sql, &file_name);
        match parsed.direction {
            Direction::Up => ups.push(migration),
            Direction::Down => downs.push(migration),
        }
    }

    tracing::debug!(
        dir = %dir.display(),
        ups = ups.len(),
        downs = downs.len(),
        "Loaded migration scripts"
    );

    MigrationSet::new(ups, downs)
}
