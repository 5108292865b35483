use crate::application::search::SearchSnapshot;
use crate::domain::payment::OperationType;
use crate::domain::session::{BalanceLookup, Outcome, Session, WorkflowState};
use std::fmt::Write;

pub fn search_results(snapshot: &SearchSnapshot, session: &Session) -> String {
    let mut out = String::new();
    if let Some(error) = &snapshot.error {
        let _ = writeln!(out, "search failed: {error}");
        return out;
    }
    if snapshot.products.is_empty() {
        let _ = writeln!(out, "no products found");
        return out;
    }
    for (i, product) in snapshot.products.iter().enumerate() {
        let mark = if session.items.is_selected(&product.id) { "x" } else { " " };
        let _ = writeln!(out, "{:>3}. [{mark}] {} - {}", i + 1, product.name, product.price);
    }
    out
}

fn balance_text(balance: BalanceLookup) -> String {
    match balance {
        BalanceLookup::Pending => "checking...".to_string(),
        BalanceLookup::Known(b) => b.to_string(),
        BalanceLookup::Unknown => "unknown".to_string(),
    }
}

/// Text view of the session, printed after every command.
pub fn session(session: &Session) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "== {} | {} | {}",
        session.state.name().to_uppercase(),
        session.operation,
        session.payment_method
    );

    match session.operation {
        OperationType::Cashback => {
            for (i, item) in session.items.selections().iter().enumerate() {
                let price = match item.override_price {
                    Some(p) if item.editing => format!("{p} (editing, was {})", item.base_price),
                    Some(p) => format!("{p} (custom, was {})", item.base_price),
                    None => item.base_price.to_string(),
                };
                let _ = writeln!(out, "  {}. {} - {price}", i + 1, item.name);
            }
            for (i, item) in session.items.manual_items().iter().enumerate() {
                let _ = writeln!(out, "  m{}. {} - {}", i + 1, item.name, item.price);
            }
            let _ = writeln!(out, "  total: {}", session.items.total());
        }
        OperationType::Debit => {
            let _ = writeln!(out, "  debit amount: {}", session.debit_amount);
        }
    }

    if let Some(customer) = session.customer() {
        let _ = writeln!(out, "  customer: {}", customer.phone);
        if customer.phone.is_link() {
            let _ = writeln!(out, "  (scanned code is a link: {})", customer.phone.raw().trim());
        }
        let _ = writeln!(out, "  bonus balance: {}", balance_text(customer.balance));
        if session.debit_exceeds_balance() {
            let _ = writeln!(out, "  warning: debit exceeds the bonus balance");
        }
    }

    match &session.state {
        WorkflowState::Result { outcome, .. } => match outcome {
            Outcome::Success { amount, detail } => {
                let _ = writeln!(out, "  SUCCESS: processed {amount}");
                if !detail.0.is_null() {
                    let _ = writeln!(out, "  {}", detail.0);
                }
            }
            Outcome::Failure { message } => {
                let _ = writeln!(out, "  FAILED: {message}");
            }
        },
        WorkflowState::Error { message } => {
            let _ = writeln!(out, "  ERROR: {message} (reset to start over)");
        }
        _ => {}
    }

    if let Some(notice) = &session.notice {
        let _ = writeln!(out, "  ! {notice}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{CatalogProduct, ProductId};
    use crate::domain::money::Money;
    use crate::domain::phone::PhoneNumber;
    use crate::domain::requests::Receipt;
    use crate::domain::session::Customer;
    use rust_decimal_macros::dec;

    fn latte() -> CatalogProduct {
        CatalogProduct {
            id: ProductId::new("1"),
            name: "Latte".to_string(),
            price: Money::new(dec!(180)),
            description: None,
        }
    }

    #[test]
    fn test_render_selection_with_custom_price() {
        let mut s = Session::new();
        s.items.toggle(&latte());
        s.items.begin_price_edit(&ProductId::new("1")).unwrap();
        s.items.set_override(&ProductId::new("1"), Money::new(dec!(150))).unwrap();
        s.items.confirm_price_edit(&ProductId::new("1")).unwrap();
        s.items.add_manual("Bag", Money::new(dec!(5))).unwrap();

        let text = session(&s);
        assert!(text.contains("== SELECTING | cashback | cash"));
        assert!(text.contains("1. Latte - 150 (custom, was 180)"));
        assert!(text.contains("m1. Bag - 5"));
        assert!(text.contains("total: 155"));
    }

    #[test]
    fn test_render_result() {
        let mut s = Session::new();
        s.state = WorkflowState::Result {
            customer: Customer {
                phone: PhoneNumber::from_scan("996700000000").unwrap(),
                balance: BalanceLookup::Unknown,
                scan_seq: 1,
            },
            outcome: Outcome::Failure {
                message: "Server down".to_string(),
            },
        };
        let text = session(&s);
        assert!(text.contains("customer: +996700000000"));
        assert!(text.contains("bonus balance: unknown"));
        assert!(text.contains("FAILED: Server down"));

        s.state = WorkflowState::Result {
            customer: Customer {
                phone: PhoneNumber::from_scan("996700000000").unwrap(),
                balance: BalanceLookup::Known(Money::new(dec!(10))),
                scan_seq: 1,
            },
            outcome: Outcome::Success {
                amount: Money::new(dec!(150)),
                detail: Receipt::default(),
            },
        };
        assert!(session(&s).contains("SUCCESS: processed 150"));
    }

    #[test]
    fn test_render_search_marks_selected() {
        let mut s = Session::new();
        s.items.toggle(&latte());
        let snapshot = SearchSnapshot {
            token: 1,
            query: "lat".to_string(),
            products: vec![latte()],
            error: None,
        };
        assert!(search_results(&snapshot, &s).contains("1. [x] Latte - 180"));
    }
}
