use super::money::Money;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Catalog identifier. The product table hands out numeric ids in some
/// deployments and string ids in others, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => ProductId(n.to_string()),
            RawId::Text(s) => ProductId(s),
        })
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A row of the remote product table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parameters of a catalog lookup: case-insensitive substring on the name.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub name_pattern: String,
    pub limit: usize,
}

impl CatalogQuery {
    /// Whether `name` contains the pattern, ignoring case.
    pub fn matches(&self, name: &str) -> bool {
        name.to_lowercase()
            .contains(&self.name_pattern.trim().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_product_id_accepts_numbers_and_strings() {
        let product: CatalogProduct = serde_json::from_value(serde_json::json!({
            "id": 42,
            "name": "Latte",
            "price": 180
        }))
        .unwrap();
        assert_eq!(product.id, ProductId::new("42"));
        assert_eq!(product.price, Money::new(dec!(180)));
        assert_eq!(product.description, None);

        let product: CatalogProduct = serde_json::from_value(serde_json::json!({
            "id": "a1b2",
            "name": "Croissant",
            "price": 95.5,
            "description": "butter"
        }))
        .unwrap();
        assert_eq!(product.id.as_str(), "a1b2");
        assert_eq!(product.description.as_deref(), Some("butter"));
    }

    #[test]
    fn test_query_matches_case_insensitive_substring() {
        let query = CatalogQuery {
            name_pattern: "LAT".to_string(),
            limit: 10,
        };
        assert!(query.matches("Iced latte"));
        assert!(!query.matches("Espresso"));
    }
}
