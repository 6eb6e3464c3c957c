//! Database handle carried in the request extensions.

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbBackend,
    TransactionTrait,
};
use tracing::info;

use crate::config::{redact_dsn, DatabaseConfig};
use crate::error::Result;

/// Shared connection pool used by every `SeaModelView`.
///
/// Views read it from `AdminRequest::extension::<Session>()`; cloning is cheap.
#[derive(Clone, Debug)]
pub struct Session {
    conn: DatabaseConnection,
}

impl Session {
    #[must_use]
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Open a pool from configuration.
    ///
    /// # Errors
    /// Returns the driver error if the database cannot be reached.
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self> {
        let mut opts = ConnectOptions::new(cfg.dsn.clone());
        if let Some(n) = cfg.max_conns {
            opts.max_connections(n);
        }
        if let Some(n) = cfg.min_conns {
            opts.min_connections(n);
        }
        if let Some(t) = cfg.acquire_timeout {
            opts.acquire_timeout(t);
        }
        opts.sqlx_logging(cfg.sqlx_logging);

        info!(dsn = %redact_dsn(&cfg.dsn), "connecting admin database");
        let conn = Database::connect(opts).await?;
        Ok(Self::new(conn))
    }

    #[must_use]
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    #[must_use]
    pub fn backend(&self) -> DbBackend {
        self.conn.get_database_backend()
    }

    /// # Errors
    /// Returns the driver error if the transaction cannot be started.
    pub async fn begin(&self) -> Result<DatabaseTransaction> {
        Ok(self.conn.begin().await?)
    }
}
