use paywall::{HttpFetcher, InvoiceMinter, JsonFetcher, Materializer, MinterConfig, TierLayout};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::Database;
use crate::error::ServerError;

/// Invoice minter over the asset database. Registered as its own app data so
/// the LNURL transport can be swapped.
pub type Minter<F = HttpFetcher> = InvoiceMinter<Database, F>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub db: Arc<Database>,
    pub layout: TierLayout,
    pub materializer: Materializer,
}

impl AppState {
    /// Wire the core services together and create the tier directories.
    pub fn new(config: ServerConfig, db: Database) -> Result<Self, ServerError> {
        let layout = TierLayout::new(&config.assets_dir);
        layout.ensure_dirs().map_err(|e| {
            ServerError::Internal(format!(
                "cannot create asset dirs under {}: {e}",
                config.assets_dir.display()
            ))
        })?;

        Ok(Self {
            materializer: Materializer::new(config.blur),
            config: Arc::new(config),
            db: Arc::new(db),
            layout,
        })
    }

    /// Minter that reaches LNURL servers over HTTPS with the configured timeout.
    pub fn http_minter(&self) -> Result<Minter, ServerError> {
        let fetcher = HttpFetcher::new(self.config.http_timeout)
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        Ok(self.minter_with(fetcher))
    }

    pub fn minter_with<F: JsonFetcher + Clone>(&self, fetcher: F) -> Minter<F> {
        InvoiceMinter::new(
            Database::clone(&self.db),
            fetcher,
            MinterConfig {
                network: self.config.network.clone(),
                strict_callbacks: !self.config.insecure_dev,
            },
        )
    }
}
