use crate::domain::money::Money;
use crate::domain::payment::{OperationType, PaymentMethod};
use crate::error::ValidationError;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// One line of cashier input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search(String),
    /// Toggle the n-th search result (1-based).
    Select(usize),
    Manual { price: Money, name: String },
    /// Remove the n-th manual item (1-based).
    Remove(usize),
    /// Open the price editor for the n-th selected product (1-based).
    Edit(usize),
    Price { index: usize, price: Money },
    ConfirmPrice(usize),
    CancelPrice(usize),
    Mode(OperationType),
    Amount(Money),
    Pay(PaymentMethod),
    Confirm,
    Back,
    Scan,
    Stop,
    Decode(String),
    Balance,
    Submit,
    Retry,
    Reset,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Unknown command: {0} (type `help`)")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Not a number: {0}")]
    Number(String),
    #[error("{0}")]
    Value(String),
}

fn index(arg: Option<&str>, usage: &'static str) -> Result<usize, ParseError> {
    let raw = arg.ok_or(ParseError::Usage(usage))?;
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ParseError::Number(raw.to_string())),
    }
}

fn money(arg: Option<&str>, usage: &'static str) -> Result<Money, ParseError> {
    let raw = arg.ok_or(ParseError::Usage(usage))?;
    Decimal::from_str(raw)
        .map(Money::new)
        .map_err(|_| ParseError::Number(raw.to_string()))
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let mut args = rest.split_whitespace();

        match word.to_ascii_lowercase().as_str() {
            "search" | "s" => Ok(Command::Search(rest.to_string())),
            "select" => Ok(Command::Select(index(args.next(), "select <n>")?)),
            "manual" => {
                let usage = "manual <price> <name>";
                let price = money(args.next(), usage)?;
                let name = args.collect::<Vec<_>>().join(" ");
                if name.is_empty() {
                    return Err(ParseError::Usage(usage));
                }
                Ok(Command::Manual { price, name })
            }
            "remove" => Ok(Command::Remove(index(args.next(), "remove <n>")?)),
            "edit" => Ok(Command::Edit(index(args.next(), "edit <n>")?)),
            "price" => {
                let usage = "price <n> <value>";
                let index = index(args.next(), usage)?;
                let price = money(args.next(), usage)?;
                Ok(Command::Price { index, price })
            }
            "confirm-price" => Ok(Command::ConfirmPrice(index(args.next(), "confirm-price <n>")?)),
            "cancel-price" => Ok(Command::CancelPrice(index(args.next(), "cancel-price <n>")?)),
            "mode" => {
                let raw = args.next().ok_or(ParseError::Usage("mode cashback|debit"))?;
                raw.parse()
                    .map(Command::Mode)
                    .map_err(|e: ValidationError| ParseError::Value(e.to_string()))
            }
            "amount" => Ok(Command::Amount(money(args.next(), "amount <value>")?)),
            "pay" => {
                let raw = args.next().ok_or(ParseError::Usage("pay <method>"))?;
                raw.parse()
                    .map(Command::Pay)
                    .map_err(|e: ValidationError| ParseError::Value(e.to_string()))
            }
            "confirm" => Ok(Command::Confirm),
            "back" => Ok(Command::Back),
            "scan" => Ok(Command::Scan),
            "stop" => Ok(Command::Stop),
            "decode" => Ok(Command::Decode(rest.to_string())),
            "balance" => Ok(Command::Balance),
            "submit" => Ok(Command::Submit),
            "retry" => Ok(Command::Retry),
            "reset" => Ok(Command::Reset),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

pub const HELP: &str = "\
Commands:
  search <text>           find catalog products
  select <n>              toggle the n-th search result
  manual <price> <name>   add an item that is not in the catalog
  remove <n>              remove the n-th manual item
  edit <n>                open the price editor for the n-th product
  price <n> <value>       set the custom price while editing
  confirm-price <n>       keep the custom price
  cancel-price <n>        drop the custom price
  mode cashback|debit     choose the operation
  amount <value>          bonus amount to debit
  pay <method>            cash, card, mbank, odengi, optima, elsom
  confirm                 done selecting, get ready to scan
  back                    return to selection (clears the order)
  scan / stop             start or stop the scanner
  decode <payload>        feed a decoded QR payload
  balance                 wait for the customer's bonus balance
  submit                  send the request
  retry                   go back after a failed request
  reset                   start over
  quit";

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_manual_with_spaces_in_name() {
        assert_eq!(
            "manual 12.5 Gift wrap paper".parse::<Command>(),
            Ok(Command::Manual {
                price: Money::new(dec!(12.5)),
                name: "Gift wrap paper".to_string()
            })
        );
    }

    #[test]
    fn test_parse_search_keeps_whole_text() {
        assert_eq!(
            "search  iced latte ".parse::<Command>(),
            Ok(Command::Search("iced latte".to_string()))
        );
        assert_eq!("search".parse::<Command>(), Ok(Command::Search(String::new())));
    }

    #[test]
    fn test_parse_indices_are_one_based() {
        assert_eq!("select 2".parse::<Command>(), Ok(Command::Select(2)));
        assert_eq!(
            "select 0".parse::<Command>(),
            Err(ParseError::Number("0".to_string()))
        );
        assert_eq!("select".parse::<Command>(), Err(ParseError::Usage("select <n>")));
    }

    #[test]
    fn test_parse_mode_and_payment() {
        assert_eq!(
            "mode DEBIT".parse::<Command>(),
            Ok(Command::Mode(OperationType::Debit))
        );
        assert_eq!(
            "pay odengi".parse::<Command>(),
            Ok(Command::Pay(PaymentMethod::ODengi))
        );
        assert!(matches!("pay gold".parse::<Command>(), Err(ParseError::Value(_))));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            "dance".parse::<Command>(),
            Err(ParseError::Unknown("dance".to_string()))
        );
    }
}
