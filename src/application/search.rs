use crate::domain::catalog::{CatalogProduct, CatalogQuery};
use crate::domain::ports::CatalogGatewayRef;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_LIMIT: usize = 10;

/// Results published for one issued query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSnapshot {
    pub token: u64,
    pub query: String,
    pub products: Vec<CatalogProduct>,
    pub error: Option<String>,
}

/// Debounced product search where only the newest query may publish results.
///
/// Every call to [`CatalogSearch::query`] issues a new token. The spawned
/// lookup checks the token after the debounce delay (a newer keystroke means it
/// never reaches the gateway) and again before publishing, so a slow response
/// for an old query can never overwrite results for a newer one.
pub struct CatalogSearch {
    gateway: CatalogGatewayRef,
    debounce: Duration,
    limit: usize,
    latest: Arc<AtomicU64>,
    results: Arc<watch::Sender<SearchSnapshot>>,
    receiver: watch::Receiver<SearchSnapshot>,
}

impl CatalogSearch {
    pub fn new(gateway: CatalogGatewayRef, debounce: Duration, limit: usize) -> Self {
        let (tx, rx) = watch::channel(SearchSnapshot::default());
        Self {
            gateway,
            debounce,
            limit,
            latest: Arc::new(AtomicU64::new(0)),
            results: Arc::new(tx),
            receiver: rx,
        }
    }

    /// Issues a new query and returns its token.
    pub fn query(&self, text: &str) -> u64 {
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let text = text.trim().to_string();

        if text.is_empty() {
            publish(&self.results, &self.latest, SearchSnapshot {
                token,
                ..SearchSnapshot::default()
            });
            return token;
        }

        let gateway = Arc::clone(&self.gateway);
        let latest = Arc::clone(&self.latest);
        let results = Arc::clone(&self.results);
        let debounce = self.debounce;
        let limit = self.limit;

        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if latest.load(Ordering::SeqCst) != token {
                debug!(query = %text, token, "search superseded before dispatch");
                return;
            }

            let query = CatalogQuery {
                name_pattern: text.clone(),
                limit,
            };
            let snapshot = match gateway.search(query).await {
                Ok(mut products) => {
                    products.truncate(limit);
                    SearchSnapshot {
                        token,
                        query: text,
                        products,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(query = %text, error = %e, "catalog search failed");
                    SearchSnapshot {
                        token,
                        query: text,
                        products: Vec::new(),
                        error: Some(e.detail().message),
                    }
                }
            };
            publish(&results, &latest, snapshot);
        });

        token
    }

    /// Results of the newest query that has completed.
    pub fn current(&self) -> SearchSnapshot {
        self.receiver.borrow().clone()
    }

    /// Waits until the newest issued query has published its results.
    pub async fn settled(&self) -> SearchSnapshot {
        let mut rx = self.receiver.clone();
        let latest = Arc::clone(&self.latest);
        match rx
            .wait_for(|snap| snap.token == latest.load(Ordering::SeqCst))
            .await
        {
            Ok(snap) => snap.clone(),
            Err(_) => self.current(),
        }
    }

    /// A receiver that sees every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.receiver.clone()
    }
}

/// Applies the snapshot only while its token is still the newest one issued.
fn publish(results: &watch::Sender<SearchSnapshot>, latest: &AtomicU64, snapshot: SearchSnapshot) {
    results.send_if_modified(|current| {
        if snapshot.token != latest.load(Ordering::SeqCst) || snapshot.token < current.token {
            debug!(token = snapshot.token, "discarding stale search results");
            return false;
        }
        *current = snapshot;
        true
    });
}
