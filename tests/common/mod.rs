#![allow(dead_code)]

use async_trait::async_trait;
use cashback_desk::application::controller::{ControllerOptions, WorkflowController};
use cashback_desk::domain::catalog::{CatalogProduct, ProductId};
use cashback_desk::domain::money::Money;
use cashback_desk::domain::phone::PhoneNumber;
use cashback_desk::domain::ports::{
    AccrualGateway, BalanceGateway, DebitGateway, DecodeSource, GatewayResult, Gateways, ScanLease,
};
use cashback_desk::domain::requests::{AccrualRequest, DebitRequest, Receipt};
use cashback_desk::error::{DeviceError, GatewayError};
use cashback_desk::infrastructure::in_memory::{InMemoryCatalog, ManualDecoder};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn product(id: &str, name: &str, price: Decimal) -> CatalogProduct {
    CatalogProduct {
        id: ProductId::new(id),
        name: name.to_string(),
        price: Money::new(price),
        description: None,
    }
}

pub fn catalog() -> InMemoryCatalog {
    use rust_decimal_macros::dec;
    InMemoryCatalog::new(vec![
        product("1", "Latte", dec!(100)),
        product("2", "Croissant", dec!(50)),
        product("3", "Iced latte", dec!(150)),
    ])
}

/// Balance gateway answering with a fixed result after an optional delay.
pub struct ScriptedBalance {
    pub result: GatewayResult<Money>,
    pub delay: Duration,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl BalanceGateway for ScriptedBalance {
    async fn balance(&self, phone: &PhoneNumber) -> GatewayResult<Money> {
        self.calls.lock().unwrap().push(phone.as_str().to_string());
        tokio::time::sleep(self.delay).await;
        self.result.clone()
    }
}

/// Accrual and debit gateway that records every request.
pub struct RecordingBackend {
    pub result: GatewayResult<Receipt>,
    pub accruals: Mutex<Vec<AccrualRequest>>,
    pub debits: Mutex<Vec<DebitRequest>>,
}

impl RecordingBackend {
    pub fn accruals(&self) -> Vec<AccrualRequest> {
        self.accruals.lock().unwrap().clone()
    }

    pub fn debits(&self) -> Vec<DebitRequest> {
        self.debits.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccrualGateway for RecordingBackend {
    async fn accrue(&self, request: AccrualRequest) -> GatewayResult<Receipt> {
        self.accruals.lock().unwrap().push(request);
        self.result.clone()
    }
}

#[async_trait]
impl DebitGateway for RecordingBackend {
    async fn debit(&self, request: DebitRequest) -> GatewayResult<Receipt> {
        self.debits.lock().unwrap().push(request);
        self.result.clone()
    }
}

/// A camera that is never available.
pub struct BrokenCamera;

impl DecodeSource for BrokenCamera {
    fn open(&self) -> Result<Box<dyn ScanLease>, DeviceError> {
        Err(DeviceError("camera permission denied".to_string()))
    }
}

pub struct Harness {
    pub controller: WorkflowController,
    pub balance: Arc<ScriptedBalance>,
    pub backend: Arc<RecordingBackend>,
    pub decoder: Arc<ManualDecoder>,
}

pub struct HarnessBuilder {
    balance: GatewayResult<Money>,
    balance_delay: Duration,
    submit: GatewayResult<Receipt>,
    decoder: Option<Arc<dyn DecodeSource>>,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            balance: Ok(Money::ZERO),
            balance_delay: Duration::ZERO,
            submit: Ok(Receipt(serde_json::json!({"success": true}))),
            decoder: None,
        }
    }
}

impl HarnessBuilder {
    pub fn balance(mut self, balance: Decimal) -> Self {
        self.balance = Ok(Money::new(balance));
        self
    }

    pub fn balance_fails(mut self) -> Self {
        self.balance = Err(GatewayError::Transport("balance service down".to_string()));
        self
    }

    pub fn balance_delay(mut self, delay: Duration) -> Self {
        self.balance_delay = delay;
        self
    }

    pub fn submit_result(mut self, result: GatewayResult<Receipt>) -> Self {
        self.submit = result;
        self
    }

    pub fn decoder(mut self, decoder: Arc<dyn DecodeSource>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn build(self) -> Harness {
        let balance = Arc::new(ScriptedBalance {
            result: self.balance,
            delay: self.balance_delay,
            calls: Mutex::new(Vec::new()),
        });
        let backend = Arc::new(RecordingBackend {
            result: self.submit,
            accruals: Mutex::new(Vec::new()),
            debits: Mutex::new(Vec::new()),
        });
        let decoder = Arc::new(ManualDecoder::new());
        let gateways = Gateways {
            catalog: Arc::new(catalog()),
            balance: balance.clone(),
            accrual: backend.clone(),
            debit: backend.clone(),
            decoder: self.decoder.unwrap_or_else(|| decoder.clone()),
        };
        let options = ControllerOptions {
            search_debounce: Duration::from_millis(5),
            ..ControllerOptions::default()
        };
        Harness {
            controller: WorkflowController::new(gateways, options),
            balance,
            backend,
            decoder,
        }
    }
}

pub fn harness() -> HarnessBuilder {
    HarnessBuilder::default()
}
