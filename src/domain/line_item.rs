use super::catalog::{CatalogProduct, ProductId};
use super::money::{Amount, Money};
use super::requests::AccrualItem;
use crate::error::ValidationError;
use serde::Serialize;

/// A catalog product picked for the current purchase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSelection {
    pub id: ProductId,
    pub name: String,
    pub base_price: Money,
    pub override_price: Option<Money>,
    /// The cashier has the price editor open for this item.
    pub editing: bool,
}

impl CatalogSelection {
    fn from_product(product: &CatalogProduct) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            base_price: product.price,
            override_price: None,
            editing: false,
        }
    }

    pub fn effective_price(&self) -> Money {
        self.override_price.unwrap_or(self.base_price)
    }
}

/// An ad-hoc entry typed in by the cashier. Identified only by position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManualItem {
    pub name: String,
    pub price: Amount,
}

/// Everything the customer is buying in a cashback session.
///
/// Catalog selections behave as a set keyed by product id (kept in the order
/// they were picked); manual items are an ordered list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineItems {
    selections: Vec<CatalogSelection>,
    manual: Vec<ManualItem>,
}

impl LineItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selections(&self) -> &[CatalogSelection] {
        &self.selections
    }

    pub fn manual_items(&self) -> &[ManualItem] {
        &self.manual
    }

    pub fn len(&self) -> usize {
        self.selections.len() + self.manual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_selected(&self, id: &ProductId) -> bool {
        self.position(id).is_some()
    }

    /// Selects the product, or deselects it if it was already selected.
    /// Returns whether the product is selected afterwards.
    ///
    /// Deselecting throws away any price override for the item.
    pub fn toggle(&mut self, product: &CatalogProduct) -> bool {
        match self.position(&product.id) {
            Some(index) => {
                self.selections.remove(index);
                false
            }
            None => {
                self.selections.push(CatalogSelection::from_product(product));
                true
            }
        }
    }

    pub fn add_manual(&mut self, name: &str, price: Money) -> Result<(), ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let price = Amount::try_from(price)?;
        self.manual.push(ManualItem {
            name: name.to_string(),
            price,
        });
        Ok(())
    }

    pub fn remove_manual(&mut self, index: usize) -> Result<ManualItem, ValidationError> {
        if index >= self.manual.len() {
            return Err(ValidationError::NoSuchItem(index));
        }
        Ok(self.manual.remove(index))
    }

    /// Opens the price editor, seeding the override with the current effective price.
    pub fn begin_price_edit(&mut self, id: &ProductId) -> Result<Money, ValidationError> {
        let item = self.selection_mut(id)?;
        let seed = item.effective_price();
        item.override_price = Some(seed);
        item.editing = true;
        Ok(seed)
    }

    pub fn set_override(&mut self, id: &ProductId, price: Money) -> Result<(), ValidationError> {
        let item = self.selection_mut(id)?;
        if !item.editing {
            return Err(ValidationError::NotEditing(id.to_string()));
        }
        let price = Amount::try_from(price)?;
        item.override_price = Some(price.into());
        Ok(())
    }

    /// Closes the editor and keeps the override.
    pub fn confirm_price_edit(&mut self, id: &ProductId) -> Result<(), ValidationError> {
        let item = self.selection_mut(id)?;
        if !item.editing {
            return Err(ValidationError::NotEditing(id.to_string()));
        }
        item.editing = false;
        Ok(())
    }

    /// Closes the editor and drops the override; the base price applies again.
    pub fn cancel_price_edit(&mut self, id: &ProductId) -> Result<(), ValidationError> {
        let item = self.selection_mut(id)?;
        item.override_price = None;
        item.editing = false;
        Ok(())
    }

    pub fn total(&self) -> Money {
        let catalog: Money = self
            .selections
            .iter()
            .map(CatalogSelection::effective_price)
            .sum();
        let manual: Money = self.manual.iter().map(|m| Money::from(m.price)).sum();
        catalog + manual
    }

    pub fn to_accrual_items(&self) -> Vec<AccrualItem> {
        let catalog = self.selections.iter().map(|s| AccrualItem::Catalog {
            product_id: s.id.clone(),
            custom_price: s.override_price.and_then(|p| Amount::try_from(p).ok()),
        });
        let manual = self.manual.iter().map(|m| AccrualItem::Manual {
            name: m.name.clone(),
            price: m.price,
        });
        catalog.chain(manual).collect()
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.selections.iter().position(|s| &s.id == id)
    }

    fn selection_mut(&mut self, id: &ProductId) -> Result<&mut CatalogSelection, ValidationError> {
        self.selections
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| ValidationError::NotSelected(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(id: &str, price: rust_decimal::Decimal) -> CatalogProduct {
        CatalogProduct {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Money::new(price),
            description: None,
        }
    }

    #[test]
    fn test_toggle_twice_restores_selection() {
        let mut items = LineItems::new();
        let a = product("1", dec!(100));
        let b = product("2", dec!(50));
        items.toggle(&a);
        let before = items.clone();

        assert!(items.toggle(&b));
        assert!(!items.toggle(&b));
        assert_eq!(items, before);
    }

    #[test]
    fn test_selection_is_keyed_by_id() {
        let mut items = LineItems::new();
        items.toggle(&product("1", dec!(100)));
        // Same id, different price: still the same catalog entry.
        assert!(!items.toggle(&product("1", dec!(999))));
        assert!(items.is_empty());
    }

    #[test]
    fn test_total_sums_catalog_and_manual() {
        let mut items = LineItems::new();
        items.toggle(&product("1", dec!(100)));
        items.toggle(&product("2", dec!(50)));
        items.add_manual("Gift wrap", Money::new(dec!(12.5))).unwrap();
        assert_eq!(items.total(), Money::new(dec!(162.5)));
    }

    #[test]
    fn test_override_then_cancel_restores_base_price() {
        let mut items = LineItems::new();
        let a = product("1", dec!(100));
        items.toggle(&a);

        let seed = items.begin_price_edit(&a.id).unwrap();
        assert_eq!(seed, Money::new(dec!(100)));
        items.set_override(&a.id, Money::new(dec!(70))).unwrap();
        assert_eq!(items.total(), Money::new(dec!(70)));

        items.cancel_price_edit(&a.id).unwrap();
        assert_eq!(items.total(), Money::new(dec!(100)));
        assert_eq!(items.selections()[0].override_price, None);
    }

    #[test]
    fn test_confirmed_override_stays() {
        let mut items = LineItems::new();
        let a = product("1", dec!(100));
        items.toggle(&a);
        items.begin_price_edit(&a.id).unwrap();
        items.set_override(&a.id, Money::new(dec!(85))).unwrap();
        items.confirm_price_edit(&a.id).unwrap();

        assert!(!items.selections()[0].editing);
        assert_eq!(items.total(), Money::new(dec!(85)));

        // Re-opening the editor seeds from the override, not the base price.
        assert_eq!(items.begin_price_edit(&a.id).unwrap(), Money::new(dec!(85)));
    }

    #[test]
    fn test_override_requires_edit_mode() {
        let mut items = LineItems::new();
        let a = product("1", dec!(100));
        items.toggle(&a);
        assert_eq!(
            items.set_override(&a.id, Money::new(dec!(10))),
            Err(ValidationError::NotEditing("1".to_string()))
        );
    }

    #[test]
    fn test_deselect_forgets_override() {
        let mut items = LineItems::new();
        let a = product("1", dec!(100));
        items.toggle(&a);
        items.begin_price_edit(&a.id).unwrap();
        items.set_override(&a.id, Money::new(dec!(60))).unwrap();
        items.confirm_price_edit(&a.id).unwrap();

        items.toggle(&a);
        items.toggle(&a);
        assert_eq!(items.selections()[0].override_price, None);
        assert!(!items.selections()[0].editing);
        assert_eq!(items.total(), Money::new(dec!(100)));
    }

    #[test]
    fn test_edit_unknown_product() {
        let mut items = LineItems::new();
        assert_eq!(
            items.begin_price_edit(&ProductId::new("nope")),
            Err(ValidationError::NotSelected("nope".to_string()))
        );
    }

    #[test]
    fn test_manual_item_validation() {
        let mut items = LineItems::new();
        assert_eq!(
            items.add_manual("  ", Money::new(dec!(10))),
            Err(ValidationError::EmptyName)
        );
        assert_eq!(
            items.add_manual("Bag", Money::new(dec!(0))),
            Err(ValidationError::NonPositiveAmount)
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_remove_manual_by_position() {
        let mut items = LineItems::new();
        items.add_manual("A", Money::new(dec!(1))).unwrap();
        items.add_manual("B", Money::new(dec!(2))).unwrap();
        items.add_manual("A", Money::new(dec!(1))).unwrap();

        let removed = items.remove_manual(1).unwrap();
        assert_eq!(removed.name, "B");
        assert_eq!(items.manual_items().len(), 2);
        assert_eq!(items.remove_manual(5), Err(ValidationError::NoSuchItem(5)));
    }

    #[test]
    fn test_accrual_items_carry_override_only_when_set() {
        let mut items = LineItems::new();
        let a = product("1", dec!(100));
        let b = product("2", dec!(50));
        items.toggle(&a);
        items.toggle(&b);
        items.begin_price_edit(&b.id).unwrap();
        items.set_override(&b.id, Money::new(dec!(45))).unwrap();
        items.add_manual("Bag", Money::new(dec!(5))).unwrap();

        let wire = items.to_accrual_items();
        assert_eq!(
            wire,
            vec![
                AccrualItem::Catalog {
                    product_id: ProductId::new("1"),
                    custom_price: None,
                },
                AccrualItem::Catalog {
                    product_id: ProductId::new("2"),
                    custom_price: Some(Amount::new(dec!(45)).unwrap()),
                },
                AccrualItem::Manual {
                    name: "Bag".to_string(),
                    price: Amount::new(dec!(5)).unwrap(),
                },
            ]
        );
    }
}
