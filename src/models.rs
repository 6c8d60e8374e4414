// Data models for the retail catalog

use serde::{Deserialize, Serialize};

/// A catalog record as persisted by the store.
///
/// `id`, `created_at` and `updated_at` are assigned by the store: `id` on
/// insert (never reused, never changed), the timestamps on insert and on
/// every save respectively. Timestamps are milliseconds since epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub product_name: String,
    pub category: String,
    pub price: f64,
    pub quantity: i64,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A candidate record, before the store has assigned identity and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub product_name: String,
    pub category: String,
    pub price: f64,
    pub quantity: i64,
    #[serde(default)]
    pub description: Option<String>,
}

impl Product {
    /// The mutable fields of this record as a candidate, for building a
    /// full-update payload from an existing record.
    pub fn to_candidate(&self) -> NewProduct {
        NewProduct {
            product_name: self.product_name.clone(),
            category: self.category.clone(),
            price: self.price,
            quantity: self.quantity,
            description: self.description.clone(),
        }
    }
}

/// Partial-update payload. Fields left `None` keep the existing value.
///
/// JSON `null` deserializes to `None`, so a null field behaves the same as an
/// omitted one; there is no way to clear `description` through a patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductPatch {
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub description: Option<String>,
}

impl ProductPatch {
    /// Merge this patch over an existing record, yielding the full-update
    /// payload: present fields overwrite, absent fields carry over.
    pub fn apply_to(self, existing: &Product) -> NewProduct {
        NewProduct {
            product_name: self.product_name.unwrap_or_else(|| existing.product_name.clone()),
            category: self.category.unwrap_or_else(|| existing.category.clone()),
            price: self.price.unwrap_or(existing.price),
            quantity: self.quantity.unwrap_or(existing.quantity),
            description: self.description.or_else(|| existing.description.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.product_name.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
            && self.description.is_none()
    }
}

/// Current timestamp in milliseconds since epoch.
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System time before Unix epoch")
        .as_millis() as i64
}
