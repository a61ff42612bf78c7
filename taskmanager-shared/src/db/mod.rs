/// Database layer for TaskManager
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: schema migrations embedded from the workspace `migrations/` directory
/// - `seed`: startup data that cannot live in SQL (the default admin account)
///
/// Repository code lives in the `models` module at crate root level.
///
/// # Example
///
/// ```no_run
/// use taskmanager_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskmanager_shared::db::migrations::run_migrations;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig::from_url(std::env::var("DATABASE_URL")?)).await?;
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
pub mod seed;
