//! Connection cleanup during graceful shutdown.

use tracing::{error, info};

/// Closes a SeaORM PostgreSQL connection with logging.
pub async fn close_postgres(db: sea_orm::DatabaseConnection, name: &str) {
    match db.close().await {
        Ok(_) => info!("PostgreSQL connection '{}' closed successfully", name),
        Err(e) => error!("Error closing PostgreSQL connection '{}': {}", name, e),
    }
}
