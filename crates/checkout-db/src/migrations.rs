//! # Schema Migrations
//!
//! `migrations/sqlite/*.sql` is compiled into the binary and applied by
//! [`Database::new`](crate::Database::new). sqlx records what ran in
//! `_sqlx_migrations` and checks each applied file's checksum, so a
//! migration must never be edited once shipped; add `NNN_next.sql`
//! instead.
//!
//! | File                     | Creates                                          |
//! |--------------------------|--------------------------------------------------|
//! | `001_initial_schema.sql` | products, sales, sale_items, payments, sale_returns |

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Migrations from `migrations/sqlite`, embedded at compile time.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever has not run yet. Safe to call repeatedly.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    let (embedded, applied) = migration_status(pool).await?;
    info!(embedded, applied, "Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}
