use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which request the session will end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    #[default]
    Cashback,
    Debit,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Cashback => f.write_str("cashback"),
            OperationType::Debit => f.write_str("debit"),
        }
    }
}

impl FromStr for OperationType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cashback" => Ok(OperationType::Cashback),
            "debit" => Ok(OperationType::Debit),
            _ => Err(ValidationError::UnknownOperation(s.to_string())),
        }
    }
}

/// How the customer paid. The first variant is the default choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    MBank,
    ODengi,
    Optima,
    Elsom,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 6] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::MBank,
        PaymentMethod::ODengi,
        PaymentMethod::Optima,
        PaymentMethod::Elsom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::MBank => "mbank",
            PaymentMethod::ODengi => "odengi",
            PaymentMethod::Optima => "optima",
            PaymentMethod::Elsom => "elsom",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownPaymentMethod(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_first_entry() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::ALL[0]);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("MBank".parse::<PaymentMethod>(), Ok(PaymentMethod::MBank));
        assert_eq!(" CARD ".parse::<PaymentMethod>(), Ok(PaymentMethod::Card));
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_wire_label_matches_display() {
        for method in PaymentMethod::ALL {
            let json = serde_json::to_value(method).unwrap();
            assert_eq!(json, serde_json::json!(method.label()));
        }
    }
}
