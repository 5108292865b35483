use super::catalog::{CatalogProduct, CatalogQuery};
use super::money::Money;
use super::phone::PhoneNumber;
use super::requests::{AccrualRequest, DebitRequest, Receipt};
use crate::error::{DeviceError, GatewayError};
use async_trait::async_trait;
use std::sync::Arc;

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn search(&self, query: CatalogQuery) -> GatewayResult<Vec<CatalogProduct>>;
}

#[async_trait]
pub trait BalanceGateway: Send + Sync {
    async fn balance(&self, phone: &PhoneNumber) -> GatewayResult<Money>;
}

#[async_trait]
pub trait AccrualGateway: Send + Sync {
    async fn accrue(&self, request: AccrualRequest) -> GatewayResult<Receipt>;
}

#[async_trait]
pub trait DebitGateway: Send + Sync {
    async fn debit(&self, request: DebitRequest) -> GatewayResult<Receipt>;
}

/// Exclusive hold on the QR decoder. Dropping the lease releases the device.
pub trait ScanLease: Send {}

/// Something that decodes QR codes, typically a camera.
///
/// Decoded payloads are delivered to the controller as events; the source only
/// hands out the exclusive lease.
pub trait DecodeSource: Send + Sync {
    fn open(&self) -> Result<Box<dyn ScanLease>, DeviceError>;
}

pub type CatalogGatewayRef = Arc<dyn CatalogGateway>;
pub type BalanceGatewayRef = Arc<dyn BalanceGateway>;
pub type AccrualGatewayRef = Arc<dyn AccrualGateway>;
pub type DebitGatewayRef = Arc<dyn DebitGateway>;
pub type DecodeSourceRef = Arc<dyn DecodeSource>;

/// The full set of collaborators a controller talks to.
#[derive(Clone)]
pub struct Gateways {
    pub catalog: CatalogGatewayRef,
    pub balance: BalanceGatewayRef,
    pub accrual: AccrualGatewayRef,
    pub debit: DebitGatewayRef,
    pub decoder: DecodeSourceRef,
}
