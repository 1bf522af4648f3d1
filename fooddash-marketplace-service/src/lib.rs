use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use diesel::{Connection, ConnectionResult, PgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub mod cart;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod error;
pub mod events;
pub mod lookup;
pub mod models;
pub mod orders;
pub mod payments;
pub mod pricing;
pub mod principal;
pub mod riders;
pub mod schema;

pub use config::Settings;
pub use error::{Conflict, ErrorKind, MarketplaceError};
pub use principal::{Principal, Role};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn establish_connection(settings: &Settings) -> ConnectionResult<PgConnection> {
    PgConnection::establish(&settings.database_url)
}

pub fn build_pool(settings: &Settings) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(&settings.database_url);
    Pool::builder().max_size(settings.pool_size).build(manager)
}

/// Applies every migration not yet recorded in the database.
pub fn run_migrations(
    conn: &mut PgConnection,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    for version in applied {
        tracing::info!(%version, "migration applied");
    }
    Ok(())
}
