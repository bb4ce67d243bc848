//! sqlsoda CLI - migrate a database up or down from a directory of SQL scripts.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use sqlsoda::{load_migrations, Database, MigrationSet, Migrator, VersionStore};
use tracing_subscriber::EnvFilter;

mod cli;
mod database_url;

use cli::{Cli, Commands, GlobalArgs, MigrateCommand};
use database_url::DatabaseUrl;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    if let Err(e) = run(cli) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let dir = migrations_dir(&cli.global)?;
    tracing::info!(dir = %dir.display(), "Load migration SQLs.");
    let migrations = load_migrations(&dir)?;

    let command = match cli.command {
        Commands::List => {
            print_list(&migrations);
            return Ok(());
        }
        Commands::Migrate(command) => command,
    };

    let migrator = Migrator::new(migrations)
        .with_version_store(VersionStore::with_table_name(cli.global.table.as_str())?);
    let url = cli
        .global
        .database_url
        .as_deref()
        .ok_or("no database configured; pass --database-url or set DATABASE_URL")?;

    match DatabaseUrl::parse(url)? {
        DatabaseUrl::SqliteMemory => {
            tracing::info!("Open in-memory SQLite database.");
            let mut conn = rusqlite::Connection::open_in_memory()?;
            execute(&migrator, &mut conn, &command)?;
        }
        DatabaseUrl::Sqlite(path) => {
            tracing::info!(path = %path.display(), "Open SQLite database.");
            let mut conn = rusqlite::Connection::open(&path)?;
            execute(&migrator, &mut conn, &command)?;
        }
        DatabaseUrl::Postgres(url) => run_postgres(&migrator, &url, &command)?,
    }

    tracing::info!("Done.");
    Ok(())
}

#[cfg(feature = "postgres")]
fn run_postgres(
    migrator: &Migrator,
    url: &str,
    command: &MigrateCommand,
) -> Result<(), Box<dyn Error>> {
    tracing::info!("Build connection to PostgreSQL.");
    let mut client = postgres::Client::connect(url, postgres::NoTls)?;
    execute(migrator, &mut client, command)
}

#[cfg(not(feature = "postgres"))]
fn run_postgres(_: &Migrator, _: &str, _: &MigrateCommand) -> Result<(), Box<dyn Error>> {
    Err("this build has no PostgreSQL support; rebuild sqlsoda-cli with --features postgres".into())
}

fn execute<D: Database>(
    migrator: &Migrator,
    db: &mut D,
    command: &MigrateCommand,
) -> Result<(), Box<dyn Error>> {
    match command {
        MigrateCommand::Up(args) => {
            tracing::info!("Migrate up.");
            let report = migrator.migrate_up(db, args.step)?;
            tracing::info!(applied = report.migrations_run.len(), "Migrate up finished.");
        }
        MigrateCommand::Down(args) => {
            tracing::info!("Migrate down.");
            let report = migrator.migrate_down(db, args.step)?;
            tracing::info!(reverted = report.migrations_run.len(), "Migrate down finished.");
        }
        MigrateCommand::Status(args) => {
            let status = migrator.status(db)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("Applied ({}):", status.applied.len());
                for version in &status.applied {
                    println!("  {version}");
                }
                println!("Pending ({}):", status.pending.len());
                for version in &status.pending {
                    println!("  {version}");
                }
            }
        }
    }
    Ok(())
}

fn migrations_dir(global: &GlobalArgs) -> Result<PathBuf, Box<dyn Error>> {
    match &global.migrations_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(std::env::current_dir()
            .map_err(|e| format!("fail to get working directory: {e}"))?
            .join("migrations")),
    }
}

fn print_list(migrations: &MigrationSet) {
    if migrations.is_empty() {
        println!("No migrations defined.");
        return;
    }
    println!("Defined migrations ({}):", migrations.len());
    for (up, down) in migrations.pairs() {
        println!("  {}: {}", up.version(), up.description());
        println!("      {}", up.file_name());
        println!("      {}", down.file_name());
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let migrations = dir.path().join("migrations");
        fs::create_dir(&migrations).unwrap();
        fs::write(
            migrations.join("20230106093513_users.up.sql"),
            "CREATE TABLE users (id INTEGER PRIMARY KEY);",
        )
        .unwrap();
        fs::write(
            migrations.join("20230106093513_users.down.sql"),
            "DROP TABLE users;",
        )
        .unwrap();
        fs::write(
            migrations.join("20230201000000_orders.up.sql"),
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER);",
        )
        .unwrap();
        fs::write(
            migrations.join("20230201000000_orders.down.sql"),
            "DROP TABLE orders;",
        )
        .unwrap();
        dir
    }

    fn cli(project: &TempDir, args: &[&str]) -> Cli {
        let migrations = project.path().join("migrations");
        let db = project.path().join("app.db");
        let mut argv = vec![
            "sqlsoda".to_string(),
            "--migrations-dir".to_string(),
            migrations.display().to_string(),
            "--database-url".to_string(),
            format!("sqlite://{}", db.display()),
            "--table".to_string(),
            "schema_migration".to_string(),
        ];
        argv.extend(args.iter().map(|a| a.to_string()));
        Cli::try_parse_from(argv).unwrap()
    }

    fn ledger(project: &TempDir) -> Vec<String> {
        let conn = rusqlite::Connection::open(project.path().join("app.db")).unwrap();
        let mut stmt = conn
            .prepare("SELECT version FROM schema_migration ORDER BY version")
            .unwrap();
        let versions = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        versions
    }

    #[test]
    fn up_then_down_against_a_sqlite_file() {
        let project = project();

        run(cli(&project, &["migrate", "up", "1"])).unwrap();
        assert_eq!(ledger(&project), vec!["20230106093513"]);

        run(cli(&project, &["migrate", "up"])).unwrap();
        assert_eq!(ledger(&project), vec!["20230106093513", "20230201000000"]);

        run(cli(&project, &["migrate", "status"])).unwrap();

        run(cli(&project, &["migrate", "down"])).unwrap();
        assert!(ledger(&project).is_empty());
    }

    #[test]
    fn load_errors_stop_before_the_database_is_opened() {
        let project = project();
        fs::remove_file(
            project
                .path()
                .join("migrations")
                .join("20230201000000_orders.down.sql"),
        )
        .unwrap();

        let err = run(cli(&project, &["migrate", "up"])).unwrap_err();

        assert!(err.to_string().contains("not well paired"));
        assert!(!project.path().join("app.db").exists());
    }

    #[test]
    fn list_needs_no_database() {
        let project = project();
        let migrations = project.path().join("migrations");
        let cli = Cli::try_parse_from([
            "sqlsoda",
            "--migrations-dir",
            migrations.to_str().unwrap(),
            "list",
        ])
        .unwrap();

        run(cli).unwrap();
    }

    #[test]
    fn invalid_table_name_is_rejected() {
        let project = project();
        let mut cli = cli(&project, &["migrate", "up"]);
        cli.global.table = "bad name".to_string();

        assert!(run(cli).is_err());
    }
}
