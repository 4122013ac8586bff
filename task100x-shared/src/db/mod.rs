/// Database layer for Task 100x
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks and startup retry
/// - `migrations`: Embedded schema migrations
///
/// Models live in the `models` module at crate root level.
///
/// # Example
///
/// ```no_run
/// use task100x_shared::db::pool::{connect_with_retry, DatabaseConfig};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = connect_with_retry(config, 5, Duration::from_secs(5)).await?;
///     task100x_shared::db::migrations::run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
