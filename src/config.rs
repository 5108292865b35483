use crate::application::controller::{ControllerOptions, DEFAULT_DEBIT_REASON};
use crate::application::search::{DEFAULT_DEBOUNCE, DEFAULT_LIMIT};
use crate::domain::money::Money;
use crate::domain::ports::Gateways;
use crate::error::{DeskError, Result};
use crate::infrastructure::http::{DEFAULT_TIMEOUT, HttpBackend, SupabaseCatalog};
use crate::infrastructure::in_memory::{InMemoryBackend, InMemoryCatalog, ManualDecoder};
use crate::interfaces::csv::catalog_reader::CatalogReader;
use clap::Parser;
use rust_decimal::Decimal;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Share of the order total credited by the offline backend.
const OFFLINE_CASHBACK_RATE: Decimal = rust_decimal_macros::dec!(0.05);

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Cashback and bonus desk for retail staff", long_about = None)]
pub struct Settings {
    /// Base URL of the cashback backend
    #[arg(long, env = "CASHBACK_API_URL", default_value = "http://localhost:8080/")]
    pub api_url: String,

    /// Supabase project URL holding the product table
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase anonymous API key
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub supabase_key: Option<String>,

    /// Name of the product table
    #[arg(long, default_value = "products")]
    pub products_table: String,

    /// Delay after the last keystroke before a catalog search is sent
    #[arg(long, default_value_t = DEFAULT_DEBOUNCE.as_millis() as u64)]
    pub search_debounce_ms: u64,

    /// Maximum number of search results
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub search_limit: usize,

    /// Request timeout for every remote call
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Reason text sent with bonus debits
    #[arg(long, default_value = DEFAULT_DEBIT_REASON)]
    pub debit_reason: String,

    /// Default log filter; RUST_LOG takes precedence
    #[arg(long, env = "CASHBACK_LOG", default_value = "info")]
    pub log_level: String,

    /// Run without a network: products come from this CSV file
    /// (id,name,price,description) and the backend is simulated in memory.
    #[arg(long)]
    pub offline_catalog: Option<PathBuf>,

    /// Bonus balance the simulated backend reports for new customers
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub offline_balance: Decimal,
}

impl Settings {
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            search_debounce: Duration::from_millis(self.search_debounce_ms),
            search_limit: self.search_limit,
            debit_reason: self.debit_reason.clone(),
        }
    }

    /// Wires up the gateways: in-memory when an offline catalog is given,
    /// HTTP otherwise.
    pub fn gateways(&self) -> Result<Gateways> {
        let decoder = Arc::new(ManualDecoder::new());

        if let Some(path) = &self.offline_catalog {
            let products = CatalogReader::new(File::open(path)?).read_all()?;
            let catalog = InMemoryCatalog::new(products);
            if catalog.is_empty() {
                warn!(path = %path.display(), "offline catalog has no products");
            }
            info!(products = catalog.len(), path = %path.display(), "offline mode");
            let backend = Arc::new(InMemoryBackend::new(
                catalog.clone(),
                OFFLINE_CASHBACK_RATE,
                Money::new(self.offline_balance),
            ));
            return Ok(Gateways {
                catalog: Arc::new(catalog),
                balance: backend.clone(),
                accrual: backend.clone(),
                debit: backend,
                decoder,
            });
        }

        let (Some(supabase_url), Some(supabase_key)) = (&self.supabase_url, &self.supabase_key)
        else {
            return Err(DeskError::Config(
                "SUPABASE_URL and SUPABASE_ANON_KEY are required unless --offline-catalog is given"
                    .to_string(),
            ));
        };
        if self.api_url.trim().is_empty() {
            return Err(DeskError::Config("API URL must not be empty".to_string()));
        }

        let timeout = Duration::from_secs(self.timeout_secs);
        let catalog = SupabaseCatalog::new(supabase_url, supabase_key, &self.products_table, timeout)?;
        let backend = Arc::new(HttpBackend::new(&self.api_url, timeout)?);
        info!(api = %self.api_url, "online mode");
        Ok(Gateways {
            catalog: Arc::new(catalog),
            balance: backend.clone(),
            accrual: backend.clone(),
            debit: backend,
            decoder,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::parse_from(["cashback-desk"]);
        let options = settings.controller_options();
        assert_eq!(options.search_debounce, Duration::from_millis(300));
        assert_eq!(options.search_limit, 10);
        assert_eq!(options.debit_reason, DEFAULT_DEBIT_REASON);
        assert_eq!(settings.products_table, "products");
    }

    #[test]
    fn test_online_mode_requires_supabase() {
        let mut settings =
            Settings::parse_from(["cashback-desk", "--api-url", "http://10.0.0.2:8080"]);
        settings.supabase_url = None;
        settings.supabase_key = None;
        assert!(matches!(settings.gateways(), Err(DeskError::Config(_))));

        settings.supabase_url = Some("https://demo.supabase.co".to_string());
        assert!(matches!(settings.gateways(), Err(DeskError::Config(_))));

        settings.supabase_key = Some("anon-key".to_string());
        assert!(settings.gateways().is_ok());
    }

    #[test]
    fn test_offline_mode_loads_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,name,price").unwrap();
        writeln!(file, "1,Latte,180").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let settings = Settings::parse_from(["cashback-desk", "--offline-catalog", path.as_str()]);
        assert!(settings.gateways().is_ok());
    }

    #[test]
    fn test_offline_catalog_missing_file() {
        let settings =
            Settings::parse_from(["cashback-desk", "--offline-catalog", "/no/such/catalog.csv"]);
        assert!(matches!(settings.gateways(), Err(DeskError::Io(_))));
    }
}
