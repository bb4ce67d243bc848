//! Choosing a driver from the connection URL.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseUrl {
    SqliteMemory,
    Sqlite(PathBuf),
    Postgres(String),
}

impl DatabaseUrl {
    pub fn parse(url: &str) -> Result<Self, String> {
        let url = url.trim();
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok(Self::Postgres(url.to_string()));
        }
        if matches!(url, "sqlite::memory:" | "sqlite://:memory:" | ":memory:") {
            return Ok(Self::SqliteMemory);
        }

        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        if path.is_empty() {
            return Err("database URL is empty".to_string());
        }
        if let Some((scheme, _)) = path.split_once("://") {
            return Err(format!("unsupported database URL scheme {scheme:?}"));
        }
        Ok(Self::Sqlite(PathBuf::from(path)))
    }
}
