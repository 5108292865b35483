use super::search::{CatalogSearch, DEFAULT_DEBOUNCE, DEFAULT_LIMIT, SearchSnapshot};
use crate::domain::catalog::{CatalogProduct, ProductId};
use crate::domain::line_item::{LineItems, ManualItem};
use crate::domain::money::{Amount, Money};
use crate::domain::payment::{OperationType, PaymentMethod};
use crate::domain::phone::PhoneNumber;
use crate::domain::ports::{Gateways, ScanLease};
use crate::domain::requests::{AccrualRequest, DebitRequest};
use crate::domain::session::{BalanceLookup, Customer, Outcome, Session, WorkflowState};
use crate::error::{DeskError, Result, ValidationError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, info, warn};

pub const DEFAULT_DEBIT_REASON: &str = "Bonus debit at checkout";

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub search_debounce: Duration,
    pub search_limit: usize,
    pub debit_reason: String,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            search_debounce: DEFAULT_DEBOUNCE,
            search_limit: DEFAULT_LIMIT,
            debit_reason: DEFAULT_DEBIT_REASON.to_string(),
        }
    }
}

struct PendingBalance {
    scan_seq: u64,
    rx: oneshot::Receiver<BalanceLookup>,
}

/// Drives one cashier session through select, scan, submit and result.
///
/// The controller owns the [`Session`] record and is the only thing that
/// mutates it. Every event either transitions the session or is rejected with
/// a [`ValidationError`], which is also stored as the session's inline notice.
///
/// Taking `&mut self` for `submit` means a second submit cannot start while
/// one is outstanding.
pub struct WorkflowController {
    session: Session,
    gateways: Gateways,
    search: CatalogSearch,
    options: ControllerOptions,
    scanner: Option<Box<dyn ScanLease>>,
    scan_seq: u64,
    pending_balance: Option<PendingBalance>,
}

impl WorkflowController {
    /// Creates a controller with a fresh session in SELECTING.
    pub fn new(gateways: Gateways, options: ControllerOptions) -> Self {
        let search = CatalogSearch::new(
            Arc::clone(&gateways.catalog),
            options.search_debounce,
            options.search_limit,
        );
        Self {
            session: Session::new(),
            gateways,
            search,
            options,
            scanner: None,
            scan_seq: 0,
            pending_balance: None,
        }
    }

    /// The session record as it stands after the last event.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> &WorkflowState {
        &self.session.state
    }

    /// Whether the decoder is currently held.
    pub fn is_scanner_active(&self) -> bool {
        self.scanner.is_some()
    }

    // ------------------------------------------------------------------
    // Catalog search
    // ------------------------------------------------------------------

    /// Starts a debounced catalog search and returns its token. Results land
    /// in [`WorkflowController::search_results`] once the query settles.
    pub fn search(&self, text: &str) -> u64 {
        self.search.query(text)
    }

    /// Results of the newest completed search.
    pub fn search_results(&self) -> SearchSnapshot {
        self.search.current()
    }

    /// Waits for the newest search to publish.
    pub async fn search_settled(&self) -> SearchSnapshot {
        self.search.settled().await
    }

    // ------------------------------------------------------------------
    // Order editing (SELECTING only)
    // ------------------------------------------------------------------

    /// Chooses between cashback accrual and bonus debit.
    pub fn switch_operation(&mut self, operation: OperationType) -> Result<()> {
        self.require_selecting("change the operation")?;
        self.session.operation = operation;
        self.accept();
        Ok(())
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) -> Result<()> {
        self.require_selecting("change the payment method")?;
        self.session.payment_method = method;
        self.accept();
        Ok(())
    }

    /// Records the amount to debit. Validated on confirm, not here.
    pub fn set_debit_amount(&mut self, amount: Money) -> Result<()> {
        self.require_selecting("change the amount")?;
        self.session.debit_amount = amount;
        self.accept();
        Ok(())
    }

    /// Selects or deselects a catalog product; returns whether it is now selected.
    pub fn toggle_product(&mut self, product: &CatalogProduct) -> Result<bool> {
        self.require_selecting("change products")?;
        let selected = self.session.items.toggle(product);
        debug!(product = %product.id, selected, "toggled product");
        self.accept();
        Ok(selected)
    }

    /// Adds an item that is not in the catalog. The name must be non-blank and
    /// the price positive.
    pub fn add_manual_item(&mut self, name: &str, price: Money) -> Result<()> {
        self.require_selecting("add items")?;
        let result = self.session.items.add_manual(name, price);
        self.settle(result)
    }

    /// Removes the manual item at `index` (0-based) and returns it.
    pub fn remove_manual_item(&mut self, index: usize) -> Result<ManualItem> {
        self.require_selecting("remove items")?;
        let result = self.session.items.remove_manual(index);
        self.settle(result)
    }

    /// Opens the price editor for a selected product; returns the seeded price.
    pub fn begin_price_edit(&mut self, id: &ProductId) -> Result<Money> {
        self.require_selecting("edit prices")?;
        let result = self.session.items.begin_price_edit(id);
        self.settle(result)
    }

    pub fn set_override_price(&mut self, id: &ProductId, price: Money) -> Result<()> {
        self.require_selecting("edit prices")?;
        let result = self.session.items.set_override(id, price);
        self.settle(result)
    }

    pub fn confirm_price_edit(&mut self, id: &ProductId) -> Result<()> {
        self.require_selecting("edit prices")?;
        let result = self.session.items.confirm_price_edit(id);
        self.settle(result)
    }

    pub fn cancel_price_edit(&mut self, id: &ProductId) -> Result<()> {
        self.require_selecting("edit prices")?;
        let result = self.session.items.cancel_price_edit(id);
        self.settle(result)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// SELECTING -> READY_TO_SCAN, once there is something to process.
    pub fn confirm_selection(&mut self) -> Result<()> {
        self.require_selecting("confirm the selection")?;
        match self.session.operation {
            OperationType::Cashback if self.session.items.is_empty() => {
                return self.reject(ValidationError::EmptySelection);
            }
            OperationType::Debit if !self.session.debit_amount.is_positive() => {
                return self.reject(ValidationError::NonPositiveAmount);
            }
            _ => {}
        }
        self.transition(WorkflowState::ReadyToScan);
        Ok(())
    }

    /// READY_TO_SCAN -> SELECTING. Returning to selection starts a fresh
    /// order: line items and the debit amount are cleared. The chosen
    /// operation and payment method are kept.
    pub fn back_to_selection(&mut self) -> Result<()> {
        if self.session.state != WorkflowState::ReadyToScan {
            return self.invalid("go back to selection");
        }
        self.session.items = LineItems::default();
        self.session.debit_amount = Money::ZERO;
        self.transition(WorkflowState::Selecting);
        Ok(())
    }

    /// READY_TO_SCAN -> SCANNING. Failing to acquire the decoder is fatal for
    /// the session; only a reset recovers.
    pub fn start_scan(&mut self) -> Result<()> {
        if self.session.state != WorkflowState::ReadyToScan {
            return self.invalid("start scanning");
        }
        match self.gateways.decoder.open() {
            Ok(lease) => {
                self.scanner = Some(lease);
                self.transition(WorkflowState::Scanning);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "could not acquire scanner");
                self.transition(WorkflowState::Error {
                    message: e.to_string(),
                });
                Err(DeskError::Device(e))
            }
        }
    }

    /// SCANNING -> READY_TO_SCAN, releasing the decoder.
    pub fn stop_scan(&mut self) -> Result<()> {
        if self.session.state != WorkflowState::Scanning {
            return self.invalid("stop scanning");
        }
        self.release_scanner();
        self.transition(WorkflowState::ReadyToScan);
        Ok(())
    }

    /// SCANNING -> SCANNED on a non-empty payload. Releases the decoder and
    /// starts the balance lookup in the background.
    pub fn on_decoded(&mut self, payload: &str) -> Result<()> {
        if self.session.state != WorkflowState::Scanning {
            return self.invalid("accept a scan");
        }
        let phone = match PhoneNumber::from_scan(payload) {
            Ok(phone) => phone,
            Err(e) => return self.reject(e),
        };
        self.release_scanner();

        self.scan_seq += 1;
        info!(phone = %phone, "customer scanned");
        self.spawn_balance_lookup(phone.clone(), self.scan_seq);
        self.transition(WorkflowState::Scanned {
            customer: Customer {
                phone,
                balance: BalanceLookup::Pending,
                scan_seq: self.scan_seq,
            },
        });
        Ok(())
    }

    /// SCANNED -> SUBMITTING -> RESULT.
    ///
    /// Gateway failures do not make this return an error: they end up as a
    /// failed [`Outcome`] so the result screen handles both cases.
    pub async fn submit(&mut self) -> Result<Outcome> {
        let customer = match &self.session.state {
            WorkflowState::Scanned { customer } => customer.clone(),
            WorkflowState::Selecting | WorkflowState::ReadyToScan | WorkflowState::Scanning => {
                return self.reject(ValidationError::MissingScan);
            }
            _ => return self.invalid("submit"),
        };

        let outcome = match self.session.operation {
            OperationType::Cashback => {
                if self.session.items.is_empty() {
                    return self.reject(ValidationError::EmptySelection);
                }
                let amount = self.session.items.total();
                let request = AccrualRequest {
                    phone_number: customer.phone.clone(),
                    payment_method: self.session.payment_method,
                    items: self.session.items.to_accrual_items(),
                };
                self.enter_submitting(&customer);
                info!(
                    phone = %customer.phone,
                    items = request.items.len(),
                    total = %amount,
                    "submitting cashback accrual"
                );
                match self.gateways.accrual.accrue(request).await {
                    Ok(detail) => Outcome::Success { amount, detail },
                    Err(e) => {
                        warn!(error = %e, "cashback accrual failed");
                        Outcome::Failure {
                            message: e.detail().message,
                        }
                    }
                }
            }
            OperationType::Debit => {
                let amount = match Amount::try_from(self.session.debit_amount) {
                    Ok(amount) => amount,
                    Err(e) => return self.reject(e),
                };
                self.sync_balance();
                let balance = self.session.balance().and_then(|b| b.known());
                if let Some(balance) = balance
                    && Money::from(amount) > balance
                {
                    return self.reject(ValidationError::InsufficientBalance {
                        amount: amount.value(),
                        balance: balance.value(),
                    });
                }
                let request = DebitRequest {
                    phone_number: customer.phone.clone(),
                    amount,
                    reason: self.options.debit_reason.clone(),
                };
                self.enter_submitting(&customer);
                info!(phone = %customer.phone, amount = %amount, "submitting bonus debit");
                match self.gateways.debit.debit(request).await {
                    Ok(detail) => Outcome::Success {
                        amount: amount.into(),
                        detail,
                    },
                    Err(e) => {
                        warn!(error = %e, "bonus debit failed");
                        Outcome::Failure {
                            message: e.detail().message,
                        }
                    }
                }
            }
        };

        // Picks up a balance applied while checking the debit guard.
        let mut customer = self.session.customer().cloned().unwrap_or(customer);
        if let Outcome::Success { detail, .. } = &outcome
            && self.session.operation == OperationType::Debit
            && let Some(new_balance) = detail.new_balance()
        {
            customer.balance = BalanceLookup::Known(new_balance);
            self.pending_balance = None;
        }

        self.transition(WorkflowState::Result {
            customer,
            outcome: outcome.clone(),
        });
        Ok(outcome)
    }

    /// RESULT(failure) -> SCANNED, keeping the customer and the order.
    pub fn retry(&mut self) -> Result<()> {
        let customer = match &self.session.state {
            WorkflowState::Result {
                customer,
                outcome: Outcome::Failure { .. },
            } => customer.clone(),
            _ => return self.invalid("retry"),
        };
        self.transition(WorkflowState::Scanned { customer });
        Ok(())
    }

    /// Any state -> SELECTING with a brand-new session.
    pub fn reset(&mut self) {
        debug!(from = self.session.state.name(), "session reset");
        self.release_scanner();
        self.pending_balance = None;
        self.session = Session::new();
    }

    // ------------------------------------------------------------------
    // Balance lookup
    // ------------------------------------------------------------------

    /// Applies a finished balance lookup without waiting for one in flight.
    pub fn sync_balance(&mut self) -> Option<BalanceLookup> {
        if let Some(pending) = self.pending_balance.as_mut() {
            let lookup = match pending.rx.try_recv() {
                Ok(lookup) => Some(lookup),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Closed) => Some(BalanceLookup::Unknown),
            };
            if let Some(lookup) = lookup {
                let scan_seq = pending.scan_seq;
                self.pending_balance = None;
                self.apply_balance(scan_seq, lookup);
            }
        }
        self.session.balance()
    }

    /// Waits for the in-flight balance lookup, if any, and applies it.
    pub async fn await_balance(&mut self) -> Option<BalanceLookup> {
        if let Some(pending) = self.pending_balance.take() {
            let lookup = pending.rx.await.unwrap_or(BalanceLookup::Unknown);
            self.apply_balance(pending.scan_seq, lookup);
        }
        self.session.balance()
    }

    fn spawn_balance_lookup(&mut self, phone: PhoneNumber, scan_seq: u64) {
        let (tx, rx) = oneshot::channel();
        let gateway = Arc::clone(&self.gateways.balance);
        tokio::spawn(async move {
            let lookup = match gateway.balance(&phone).await {
                Ok(balance) => {
                    debug!(phone = %phone, balance = %balance, "balance fetched");
                    BalanceLookup::Known(balance)
                }
                Err(e) => {
                    warn!(phone = %phone, error = %e, "balance lookup failed, treating as unknown");
                    BalanceLookup::Unknown
                }
            };
            let _ = tx.send(lookup);
        });
        self.pending_balance = Some(PendingBalance { scan_seq, rx });
    }

    fn apply_balance(&mut self, scan_seq: u64, lookup: BalanceLookup) {
        match self.session.state.customer_mut() {
            Some(customer) if customer.scan_seq == scan_seq => customer.balance = lookup,
            _ => debug!(scan_seq, "dropping balance for a scan that is no longer current"),
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn enter_submitting(&mut self, customer: &Customer) {
        let customer = self.session.customer().cloned().unwrap_or_else(|| customer.clone());
        self.transition(WorkflowState::Submitting { customer });
    }

    fn release_scanner(&mut self) {
        if self.scanner.take().is_some() {
            debug!("scanner released");
        }
    }

    fn transition(&mut self, to: WorkflowState) {
        debug!(from = self.session.state.name(), to = to.name(), "transition");
        self.session.state = to;
        self.session.notice = None;
    }

    fn accept(&mut self) {
        self.session.notice = None;
    }

    fn settle<T>(&mut self, result: std::result::Result<T, ValidationError>) -> Result<T> {
        match result {
            Ok(value) => {
                self.accept();
                Ok(value)
            }
            Err(e) => self.reject(e),
        }
    }

    fn reject<T>(&mut self, error: ValidationError) -> Result<T> {
        debug!(state = self.session.state.name(), error = %error, "event rejected");
        self.session.notice = Some(error.to_string());
        Err(error.into())
    }

    fn invalid<T>(&mut self, event: &'static str) -> Result<T> {
        self.reject(ValidationError::InvalidTransition {
            state: self.session.state.name(),
            event,
        })
    }

    fn require_selecting(&mut self, event: &'static str) -> Result<()> {
        if self.session.state == WorkflowState::Selecting {
            Ok(())
        } else {
            self.invalid(event)
        }
    }
}
