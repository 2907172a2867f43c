//! Embedded PostgreSQL cluster and per-test databases.
//!
//! One cluster is shared by every test in the binary. Each test gets its own
//! database cloned from a template that already carries the store schema;
//! the template name includes a hash of `migrations/` so schema edits build
//! a fresh one.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use pg_embedded_setup_unpriv::test_support::hash_directory;
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use postgres::types::ToSql;
use postgres::{Client, NoTls};
use store_backend::domain::ports::RepositoryError;
use uuid::Uuid;

use super::format_postgres_error;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const TEMPLATE_NAME_PREFIX: &str = "store_template";
const SETUP_RETRIES: usize = 5;
const SETUP_RETRY_DELAY: Duration = Duration::from_millis(500);

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Start (or reuse) the process-wide cluster.
pub fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    ensure_stable_password();
    let mut attempt = 1;
    loop {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(err) if attempt >= SETUP_RETRIES => {
                return Err(format!("start cluster after {attempt} attempts: {err:?}"));
            }
            Err(_) => {
                std::thread::sleep(SETUP_RETRY_DELAY);
                attempt += 1;
            }
        }
    }
}

/// Keep `PG_PASSWORD` fixed so a reused data directory still accepts it.
fn ensure_stable_password() {
    if std::env::var_os("PG_PASSWORD").is_none() {
        // SAFETY: runs before the cluster bootstrap starts any thread.
        unsafe {
            std::env::set_var("PG_PASSWORD", "store_embedded_test");
        }
    }
}

fn template_database_name() -> Result<String, RepositoryError> {
    let migrations = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let hash = hash_directory(migrations)
        .map_err(|err| RepositoryError::query(format!("hash migrations: {err}")))?;
    let short_hash = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_NAME_PREFIX}_{short_hash}"))
}

fn ensure_template_database(cluster: &ClusterHandle) -> Result<String, RepositoryError> {
    let template = template_database_name()?;
    let _lock = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(template.as_str())
        .map_err(|err| RepositoryError::query(format!("template check: {err:?}")))?;
    if !exists {
        cluster
            .create_database(template.as_str())
            .map_err(|err| RepositoryError::query(format!("create template: {err:?}")))?;
        migrate_schema(&cluster.connection().database_url(&template))?;
    }
    Ok(template)
}

/// Database cloned from the migrated template; dropped with the handle.
pub fn provision_template_database(
    cluster: &ClusterHandle,
) -> Result<TemporaryDatabase, RepositoryError> {
    let mut last_error = RepositoryError::query("provision database: no attempt made");
    for attempt in 1..=SETUP_RETRIES {
        let provisioned = ensure_template_database(cluster).and_then(|template| {
            let name = format!("test_{}", Uuid::new_v4().simple());
            cluster
                .temporary_database_from_template(name.as_str(), template.as_str())
                .map_err(|err| RepositoryError::query(format!("clone template: {err:?}")))
        });
        match provisioned {
            Ok(database) => return Ok(database),
            Err(err) => last_error = err,
        }
        if attempt < SETUP_RETRIES {
            std::thread::sleep(SETUP_RETRY_DELAY);
        }
    }
    Err(last_error)
}

/// Apply every pending migration to the database at `url`.
pub fn migrate_schema(url: &str) -> Result<(), RepositoryError> {
    let mut conn = PgConnection::establish(url)
        .map_err(|err| RepositoryError::connection(err.to_string()))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| RepositoryError::query(format!("migration: {err}")))?;
    Ok(())
}

/// Run one statement outside Diesel, for fixtures the ports cannot express.
pub fn execute(url: &str, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64, String> {
    let mut client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
    client
        .execute(sql, params)
        .map_err(|err| format_postgres_error(&err))
}
