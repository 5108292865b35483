//! Request and response bodies exchanged with the remote gateways.

use super::catalog::ProductId;
use super::money::{Amount, Money};
use super::payment::PaymentMethod;
use super::phone::PhoneNumber;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One purchased entry in a cashback accrual.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AccrualItem {
    #[serde(rename_all = "camelCase")]
    Catalog {
        product_id: ProductId,
        #[serde(skip_serializing_if = "Option::is_none")]
        custom_price: Option<Amount>,
    },
    Manual { name: String, price: Amount },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccrualRequest {
    pub phone_number: PhoneNumber,
    pub payment_method: PaymentMethod,
    pub items: Vec<AccrualItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebitRequest {
    pub phone_number: PhoneNumber,
    pub amount: Amount,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: Money,
}

/// Opaque success payload returned by the accrual and debit endpoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Receipt(pub Value);

impl Receipt {
    /// New bonus balance reported by a debit response, if any.
    pub fn new_balance(&self) -> Option<Money> {
        ["newBalance", "balance"]
            .iter()
            .find_map(|key| self.0.get(key))
            .and_then(|v| serde_json::from_value::<Money>(v.clone()).ok())
    }
}
