/// Database migration runner
///
/// Migrations live in `migrations/` at the workspace root as reversible
/// pairs (`{version}_{name}.up.sql` / `.down.sql`) and are embedded at
/// compile time.

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Applies every pending migration
///
/// # Errors
///
/// Returns an error if a migration fails; the failing migration is rolled
/// back by `sqlx`
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    match sqlx::migrate!("../migrations").run(pool).await {
        Ok(()) => {
            info!("Database schema is up to date");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}
