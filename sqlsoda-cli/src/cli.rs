//! CLI argument definitions using clap derive API

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// sqlsoda - a table schema migration tool
#[derive(Parser, Debug)]
#[command(name = "sqlsoda")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding the migration SQL files [default: ./migrations]
    #[arg(long, global = true, env = "SQLSODA_MIGRATIONS_DIR")]
    pub migrations_dir: Option<PathBuf>,

    /// Database to migrate: postgres://..., sqlite://path, sqlite::memory: or a file path
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Table recording applied versions
    #[arg(
        long,
        global = true,
        env = "SQLSODA_VERSION_TABLE",
        default_value = sqlsoda::DEFAULT_VERSION_TABLE_NAME
    )]
    pub table: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Migrate table schema
    #[command(subcommand)]
    Migrate(MigrateCommand),

    /// List the migrations found in the migrations directory (no database required)
    List,
}

#[derive(Subcommand, Debug)]
pub enum MigrateCommand {
    /// Apply pending migrations
    Up(StepArgs),

    /// Revert applied migrations, most recent first
    Down(StepArgs),

    /// Show applied and pending versions
    Status(StatusArgs),
}

#[derive(Args, Debug)]
pub struct StepArgs {
    /// How many migration steps to execute (-1 for all)
    #[arg(default_value_t = -1, allow_negative_numbers = true)]
    pub step: i64,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,
}
