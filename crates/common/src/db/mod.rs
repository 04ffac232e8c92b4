//! Database layer for KitchenBuddy
//!
//! Provides:
//! - SeaORM entity models
//! - The `KitchenStore` abstraction
//! - Postgres repository and in-memory store implementations
//! - Connection pool management
//! - Recipe enrichment (joining recipes with their ingredient rows)

mod enrich;
mod memory;
pub mod models;
mod repository;
mod store;

pub use enrich::{enrich_recipes, load_enriched_recipes, EnrichedRecipe};
pub use memory::MemoryStore;
pub use repository::Repository;
pub use store::{IngredientPatch, KitchenStore, NewIngredient};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use models::{RecipeEntity, RecipeIngredientEntity, UserIngredientEntity};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    conn: Arc<DatabaseConnection>,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let mut opts = ConnectOptions::new(&config.url);
        opts
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(false);

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e)
            })?;

        info!("Database connection established");

        Ok(Self { conn: Arc::new(conn) })
    }

    /// Get the underlying connection
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Create the recipe and inventory tables when they do not exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);

        // recipes must exist before the rows that reference it
        let statements = [
            schema.create_table_from_entity(RecipeEntity),
            schema.create_table_from_entity(RecipeIngredientEntity),
            schema.create_table_from_entity(UserIngredientEntity),
        ];

        for mut statement in statements {
            statement.if_not_exists();
            self.conn.execute(backend.build(&statement)).await?;
        }

        info!("Database schema ready");
        Ok(())
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;

        Ok(())
    }
}
