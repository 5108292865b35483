use crate::domain::catalog::{CatalogProduct, CatalogQuery};
use crate::domain::money::Money;
use crate::domain::phone::PhoneNumber;
use crate::domain::ports::{
    AccrualGateway, BalanceGateway, CatalogGateway, DebitGateway, DecodeSource, GatewayResult,
    ScanLease,
};
use crate::domain::requests::{AccrualItem, AccrualRequest, DebitRequest, Receipt};
use crate::error::{DeviceError, GatewayError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// A product table held in memory.
///
/// Used for offline mode (loaded from CSV) and in tests.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    products: Arc<Vec<CatalogProduct>>,
}

impl InMemoryCatalog {
    /// Creates a catalog over the given products, kept in their original order.
    pub fn new(products: Vec<CatalogProduct>) -> Self {
        Self {
            products: Arc::new(products),
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[async_trait]
impl CatalogGateway for InMemoryCatalog {
    async fn search(&self, query: CatalogQuery) -> GatewayResult<Vec<CatalogProduct>> {
        Ok(self
            .products
            .iter()
            .filter(|p| query.matches(&p.name))
            .take(query.limit)
            .cloned()
            .collect())
    }
}

/// A bonus ledger held in memory, standing in for the backend.
///
/// Accruals credit `rate` of the order total (catalog items at their catalog
/// price unless overridden); debits fail when the balance is too small.
/// Unknown customers start at `opening_balance`.
#[derive(Clone)]
pub struct InMemoryBackend {
    catalog: InMemoryCatalog,
    rate: Decimal,
    opening_balance: Money,
    balances: Arc<RwLock<HashMap<String, Money>>>,
    accruals: Arc<RwLock<Vec<AccrualRequest>>>,
    debits: Arc<RwLock<Vec<DebitRequest>>>,
}

impl InMemoryBackend {
    /// Creates a backend with no recorded customers. Prices for catalog items
    /// without an override are looked up in `catalog`.
    pub fn new(catalog: InMemoryCatalog, rate: Decimal, opening_balance: Money) -> Self {
        Self {
            catalog,
            rate,
            opening_balance,
            balances: Arc::default(),
            accruals: Arc::default(),
            debits: Arc::default(),
        }
    }

    /// Every accrual accepted so far, oldest first.
    pub async fn accruals(&self) -> Vec<AccrualRequest> {
        self.accruals.read().await.clone()
    }

    /// Every debit accepted so far, oldest first.
    pub async fn debits(&self) -> Vec<DebitRequest> {
        self.debits.read().await.clone()
    }

    /// Overrides the balance of one customer, keyed by normalized phone.
    pub async fn set_balance(&self, phone: &str, balance: Money) {
        self.balances.write().await.insert(phone.to_string(), balance);
    }

    fn price_of(&self, item: &AccrualItem) -> Money {
        match item {
            AccrualItem::Catalog {
                custom_price: Some(price),
                ..
            } => (*price).into(),
            AccrualItem::Catalog { product_id, .. } => self
                .catalog
                .products
                .iter()
                .find(|p| &p.id == product_id)
                .map(|p| p.price)
                .unwrap_or(Money::ZERO),
            AccrualItem::Manual { price, .. } => (*price).into(),
        }
    }
}

#[async_trait]
impl BalanceGateway for InMemoryBackend {
    async fn balance(&self, phone: &PhoneNumber) -> GatewayResult<Money> {
        let balances = self.balances.read().await;
        Ok(balances
            .get(phone.as_str())
            .copied()
            .unwrap_or(self.opening_balance))
    }
}

#[async_trait]
impl AccrualGateway for InMemoryBackend {
    async fn accrue(&self, request: AccrualRequest) -> GatewayResult<Receipt> {
        let total: Money = request.items.iter().map(|i| self.price_of(i)).sum();
        let cashback = Money::new((total.value() * self.rate).round_dp(2));

        let mut balances = self.balances.write().await;
        let balance = balances
            .entry(request.phone_number.as_str().to_string())
            .or_insert(self.opening_balance);
        *balance += cashback;
        let new_balance = *balance;
        drop(balances);

        let mut accruals = self.accruals.write().await;
        accruals.push(request);
        Ok(Receipt(serde_json::json!({
            "success": true,
            "transactionId": format!("offline-{}", accruals.len()),
            "amount": cashback,
            "newBalance": new_balance,
        })))
    }
}

#[async_trait]
impl DebitGateway for InMemoryBackend {
    async fn debit(&self, request: DebitRequest) -> GatewayResult<Receipt> {
        let mut balances = self.balances.write().await;
        let balance = balances
            .entry(request.phone_number.as_str().to_string())
            .or_insert(self.opening_balance);
        let amount = Money::from(request.amount);
        if *balance < amount {
            return Err(GatewayError::Rejected {
                status: 400,
                message: Some("Insufficient bonus balance".to_string()),
            });
        }
        *balance = *balance - amount;
        let new_balance = *balance;
        drop(balances);

        self.debits.write().await.push(request);
        Ok(Receipt(serde_json::json!({
            "success": true,
            "newBalance": new_balance,
        })))
    }
}

/// A decoder whose payloads are typed in by hand. Counts outstanding leases so
/// tests can check the device is released.
#[derive(Default, Clone)]
pub struct ManualDecoder {
    active: Arc<AtomicUsize>,
}

struct ManualLease {
    active: Arc<AtomicUsize>,
}

impl ScanLease for ManualLease {}

impl Drop for ManualLease {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ManualDecoder {
    /// Creates a decoder with no lease outstanding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of leases not yet dropped. At most one.
    pub fn active_leases(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl DecodeSource for ManualDecoder {
    fn open(&self) -> Result<Box<dyn ScanLease>, DeviceError> {
        if self.active.load(Ordering::SeqCst) > 0 {
            return Err(DeviceError("decoder already in use".to_string()));
        }
        self.active.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ManualLease {
            active: Arc::clone(&self.active),
        }))
    }
}
