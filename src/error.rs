use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Fallback text shown when neither the server nor the transport said anything useful.
pub const GENERIC_FAILURE: &str = "Request failed";

#[derive(Error, Debug)]
pub enum DeskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeskError>;

/// Input problems surfaced inline. The session never advances on one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Select at least one product or add a manual item")]
    EmptySelection,
    #[error("Amount must be positive")]
    NonPositiveAmount,
    #[error("Scan the customer's QR code first")]
    MissingScan,
    #[error("Scanned QR code is empty")]
    EmptyPayload,
    #[error("Debit of {amount} exceeds the bonus balance of {balance}")]
    InsufficientBalance { amount: Decimal, balance: Decimal },
    #[error("Item name must not be empty")]
    EmptyName,
    #[error("Product {0} is not selected")]
    NotSelected(String),
    #[error("Product {0} is not being edited")]
    NotEditing(String),
    #[error("No manual item at position {0}")]
    NoSuchItem(usize),
    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
    #[error("Cannot {event} while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
}

/// Failure of a remote call, as seen from the client.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("server rejected request (HTTP {status})")]
    Rejected {
        status: u16,
        message: Option<String>,
    },
    #[error("{0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Boundary shape of a gateway failure, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl GatewayError {
    /// Prefers the server's own message, then the transport message, then generic text.
    pub fn detail(&self) -> ErrorDetail {
        match self {
            GatewayError::Rejected { status, message } => ErrorDetail {
                message: non_blank(message.as_deref())
                    .unwrap_or_else(|| format!("Request failed with status code {status}")),
                code: Some(*status),
            },
            GatewayError::Transport(message) | GatewayError::Decode(message) => ErrorDetail {
                message: non_blank(Some(message)).unwrap_or_else(|| GENERIC_FAILURE.to_string()),
                code: None,
            },
        }
    }
}

fn non_blank(message: Option<&str>) -> Option<String> {
    message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// The camera (or whatever decodes QR codes) could not be acquired.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("scanner unavailable: {0}")]
pub struct DeviceError(pub String);
