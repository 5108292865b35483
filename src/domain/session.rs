use super::line_item::LineItems;
use super::money::Money;
use super::payment::{OperationType, PaymentMethod};
use super::phone::PhoneNumber;
use super::requests::Receipt;
use serde::Serialize;

/// What we know about the scanned customer's bonus balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", content = "balance", rename_all = "lowercase")]
pub enum BalanceLookup {
    #[default]
    Pending,
    Known(Money),
    /// The lookup failed; treated as "no information", never as an error.
    Unknown,
}

impl BalanceLookup {
    pub fn known(&self) -> Option<Money> {
        match self {
            BalanceLookup::Known(balance) => Some(*balance),
            _ => None,
        }
    }
}

/// Customer data that only exists once a QR code has been decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub phone: PhoneNumber,
    pub balance: BalanceLookup,
    /// Increases with every decode; stale balance lookups are matched against it.
    #[serde(skip)]
    pub scan_seq: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success { amount: Money, detail: Receipt },
    Failure { message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// Where the cashier is in the scan, select, submit cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    Selecting,
    ReadyToScan,
    Scanning,
    Scanned { customer: Customer },
    Submitting { customer: Customer },
    Result { customer: Customer, outcome: Outcome },
    Error { message: String },
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Selecting => "selecting",
            WorkflowState::ReadyToScan => "ready to scan",
            WorkflowState::Scanning => "scanning",
            WorkflowState::Scanned { .. } => "scanned",
            WorkflowState::Submitting { .. } => "submitting",
            WorkflowState::Result { .. } => "showing a result",
            WorkflowState::Error { .. } => "in error",
        }
    }

    pub fn customer(&self) -> Option<&Customer> {
        match self {
            WorkflowState::Scanned { customer }
            | WorkflowState::Submitting { customer }
            | WorkflowState::Result { customer, .. } => Some(customer),
            _ => None,
        }
    }

    pub fn customer_mut(&mut self) -> Option<&mut Customer> {
        match self {
            WorkflowState::Scanned { customer }
            | WorkflowState::Submitting { customer }
            | WorkflowState::Result { customer, .. } => Some(customer),
            _ => None,
        }
    }
}

/// The single record describing one interaction with one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub state: WorkflowState,
    pub operation: OperationType,
    pub payment_method: PaymentMethod,
    pub items: LineItems,
    pub debit_amount: Money,
    /// Inline message from the last rejected action.
    pub notice: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            state: WorkflowState::Selecting,
            operation: OperationType::default(),
            payment_method: PaymentMethod::default(),
            items: LineItems::default(),
            debit_amount: Money::ZERO,
            notice: None,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount the current operation is about: the order total for cashback,
    /// the entered amount for debit.
    pub fn payable(&self) -> Money {
        match self.operation {
            OperationType::Cashback => self.items.total(),
            OperationType::Debit => self.debit_amount,
        }
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.state.customer()
    }

    pub fn balance(&self) -> Option<BalanceLookup> {
        self.customer().map(|c| c.balance)
    }

    /// Advisory: the entered debit is larger than the known balance.
    pub fn debit_exceeds_balance(&self) -> bool {
        self.operation == OperationType::Debit
            && self
                .balance()
                .and_then(|b| b.known())
                .is_some_and(|balance| self.debit_amount > balance)
    }
}
