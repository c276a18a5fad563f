//! SQLite connection pool and schema bootstrap.

use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{
    ConnectionManager, CustomizeConnection, Error as R2d2Error, Pool, PoolError, PooledConnection,
};
use diesel::sqlite::SqliteConnection;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

const CREATE_PRODUCTS: &str = "
    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source TEXT NOT NULL,
        url TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        price REAL,
        image_url TEXT,
        name_emb BLOB,
        descr_emb BLOB,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )";

const CREATE_PRODUCTS_SOURCE_IDX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS products_source_idx ON products (source, url)";

/// How long a writer waits for a competing lock before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Pragmas applied to every pooled connection.
#[derive(Debug)]
struct ConnectionOptions {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, R2d2Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), R2d2Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA journal_mode = WAL;",
            self.busy_timeout.as_millis()
        ))
        .map_err(R2d2Error::QueryError)
    }
}

/// Build a connection pool for the SQLite database at `database_url`.
///
/// Concurrent jobs share the file, so every connection waits up to
/// [`BUSY_TIMEOUT`] for a lock instead of failing with `SQLITE_BUSY`.
pub fn establish_connection_pool(database_url: &str) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .connection_customizer(Box::new(ConnectionOptions {
            busy_timeout: BUSY_TIMEOUT,
        }))
        .build(manager)
}

/// Create the `products` table and its `(source, url)` index when missing.
pub fn init_schema(conn: &mut SqliteConnection) -> QueryResult<()> {
    diesel::sql_query(CREATE_PRODUCTS).execute(conn)?;
    diesel::sql_query(CREATE_PRODUCTS_SOURCE_IDX).execute(conn)?;
    Ok(())
}
