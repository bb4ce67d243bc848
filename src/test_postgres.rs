#![allow(dead_code)]

//! PostgreSQL test infrastructure: one shared testcontainers instance per test run and a
//! fresh database per test.

use std::sync::OnceLock;

use postgres::{Client, NoTls};
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

/// Default credentials for testcontainers-modules postgres
const PG_USER: &str = "postgres";
const PG_PASSWORD: &str = "postgres";
const PG_DB: &str = "postgres";

/// The runtime that owns the container, and the container's mapped port.
static POSTGRES: OnceLock<(tokio::runtime::Runtime, u16)> = OnceLock::new();

fn postgres_port() -> u16 {
    let (_, port) = POSTGRES.get_or_init(|| {
        let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
        let port = rt.block_on(async {
            let container = Postgres::default()
                .start()
                .await
                .expect("failed to start postgres container");
            let port = container
                .get_host_port_ipv4(5432)
                .await
                .expect("failed to get postgres port");
            // keep the container running for the rest of the test binary
            std::mem::forget(container);
            port
        });
        (rt, port)
    });
    *port
}

fn url_with_db(db: &str) -> String {
    format!(
        "postgres://{}:{}@127.0.0.1:{}/{}",
        PG_USER,
        PG_PASSWORD,
        postgres_port(),
        db
    )
}

/// Create a uniquely named database and return a client connected to it.
pub fn fresh_postgres_db() -> (Client, String) {
    let mut admin =
        Client::connect(&url_with_db(PG_DB), NoTls).expect("failed to connect as admin");
    let db_name = format!("test_{}", Uuid::new_v4().simple());
    admin
        .batch_execute(&format!("CREATE DATABASE \"{}\"", db_name))
        .expect("failed to create test database");
    drop(admin);

    let client =
        Client::connect(&url_with_db(&db_name), NoTls).expect("failed to connect to test database");
    (client, db_name)
}

pub fn get_test_client() -> Client {
    let (client, _db_name) = fresh_postgres_db();
    client
}
