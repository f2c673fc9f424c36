//! SQLite connection pool for the insights table.
//!
//! Diesel is synchronous, so every statement runs on the blocking pool via
//! [`run_blocking`]. Each pooled connection gets WAL pragmas on checkout.

use std::path::Path;
use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError};

use super::StoreError;

pub type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

const POOL_SIZE: u32 = 8;
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

const PRAGMAS: &str = "PRAGMA journal_mode = WAL;
     PRAGMA synchronous = NORMAL;
     PRAGMA busy_timeout = 5000;
     PRAGMA temp_store = MEMORY;";

#[derive(Debug, Clone, Copy)]
struct WalPragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for WalPragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(PRAGMAS)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Build a pool over the database file at `db_path`, creating it if needed.
pub fn create_diesel_pool(db_path: &Path) -> Result<SqlitePool, PoolError> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path.to_string_lossy());
    Pool::builder()
        .max_size(POOL_SIZE)
        .connection_timeout(CHECKOUT_TIMEOUT)
        .connection_customizer(Box::new(WalPragmas))
        .build(manager)
}

/// Check out a connection and run `f` on the blocking thread pool.
pub async fn run_blocking<F, T>(pool: SqlitePool, f: F) -> Result<T, StoreError>
where
    F: FnOnce(&mut SqliteConnection) -> QueryResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || -> Result<T, StoreError> {
        let mut conn = pool.get()?;
        Ok(f(&mut conn)?)
    })
    .await
    .map_err(|e| StoreError::Unavailable(format!("storage task failed: {}", e)))?
}
