use std::sync::Arc;

use opsdesk_infra::{
    DeliveryStore, InMemoryDeliveryStore, InMemoryOrderStore, OrderStore, PostgresDeliveryStore,
    PostgresOrderStore, db,
};

use crate::config::ApiConfig;

/// Stores shared by every handler.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<dyn OrderStore>,
    pub deliveries: Arc<dyn DeliveryStore>,
}

impl AppServices {
    pub fn new(orders: Arc<dyn OrderStore>, deliveries: Arc<dyn DeliveryStore>) -> Self {
        Self { orders, deliveries }
    }

    /// Empty in-memory stores (dev/test).
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryOrderStore::new()),
            Arc::new(InMemoryDeliveryStore::new()),
        )
    }
}

pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    if !config.use_persistent_stores {
        tracing::warn!("USE_PERSISTENT_STORES is not set; serving from empty in-memory stores");
        return Ok(AppServices::in_memory());
    }

    let Some(database_url) = config.database_url.as_deref() else {
        anyhow::bail!("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");
    };

    let pool = db::connect(database_url, config.max_connections).await?;
    db::ensure_schema(&pool).await?;
    tracing::info!(max_connections = config.max_connections, "connected to postgres");

    Ok(AppServices::new(
        Arc::new(PostgresOrderStore::new(pool.clone())),
        Arc::new(PostgresDeliveryStore::new(pool)),
    ))
}
