// Catalog manager: the business rules gating every mutation

use crate::error::{CatalogError, Result};
use crate::models::{NewProduct, Product, ProductPatch};
use crate::store::ProductStore;
use std::path::Path;
use tracing::debug;

/// Catalog of retail products.
///
/// Owns the record store and the one business invariant: at most one record
/// may hold a given product name, compared case-insensitively. Lookups that
/// miss fail with `NotFound`; writes that would break the invariant fail with
/// `AlreadyExists`. Infrastructure failures from the store pass through.
pub struct Catalog {
    store: ProductStore,
}

impl Catalog {
    /// Open or create a catalog rooted at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            store: ProductStore::open(path)?,
        })
    }

    /// In-memory catalog, for tests and throwaway use.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            store: ProductStore::in_memory()?,
        })
    }

    /// Create a new record from a candidate.
    ///
    /// The exists pre-check gives the common case a clean error before any
    /// write; the store's unique index settles the race either way.
    pub fn create(&mut self, candidate: NewProduct) -> Result<Product> {
        if self.store.exists_by_name(&candidate.product_name)? {
            return Err(CatalogError::already_exists(
                "productName",
                &candidate.product_name,
            ));
        }
        self.store.insert(candidate)
    }

    pub fn get_by_id(&self, id: i64) -> Result<Product> {
        self.store
            .find_by_id(id)?
            .ok_or_else(|| CatalogError::not_found("id", id))
    }

    /// Lookup by product name, compared case-insensitively.
    pub fn get_by_product_name(&self, name: &str) -> Result<Product> {
        self.store
            .find_by_name(name)?
            .ok_or_else(|| CatalogError::not_found("productName", name))
    }

    /// All records in the category, compared case-insensitively. An unknown
    /// category yields an empty list, not a failure.
    pub fn list_by_category(&self, category: &str) -> Result<Vec<Product>> {
        self.store.find_by_category(category)
    }

    /// Category records holding strictly more than `min_quantity` units.
    pub fn list_by_category_with_min_quantity(
        &self,
        category: &str,
        min_quantity: i64,
    ) -> Result<Vec<Product>> {
        self.store
            .find_by_category_with_min_quantity(category, min_quantity)
    }

    /// Every record, in insertion order.
    pub fn list_all(&self) -> Result<Vec<Product>> {
        self.store.find_all()
    }

    /// Full update: overwrite every mutable field of the record with `values`.
    ///
    /// A rename is checked against the rest of the catalog; changing only the
    /// casing of the existing name is not a rename.
    pub fn replace(&mut self, id: i64, values: NewProduct) -> Result<Product> {
        let existing = self.get_by_id(id)?;

        let renamed =
            existing.product_name.to_lowercase() != values.product_name.to_lowercase();
        if renamed && self.store.exists_by_name(&values.product_name)? {
            return Err(CatalogError::already_exists(
                "productName",
                &values.product_name,
            ));
        }

        let updated = Product {
            id: existing.id,
            product_name: values.product_name,
            category: values.category,
            price: values.price,
            quantity: values.quantity,
            description: values.description,
            created_at: existing.created_at,
            updated_at: existing.updated_at,
        };
        debug!(id, renamed, "Replacing product");
        self.store.save(updated)
    }

    /// Partial update: overwrite exactly the fields present in `patch`, then
    /// run the merged record through `replace` so a renaming collision still
    /// fails with `AlreadyExists`.
    pub fn merge_update(&mut self, id: i64, patch: ProductPatch) -> Result<Product> {
        let existing = self.get_by_id(id)?;
        let merged = patch.apply_to(&existing);
        self.replace(id, merged)
    }

    pub fn delete(&mut self, id: i64) -> Result<()> {
        let existing = self.get_by_id(id)?;
        self.store.delete(&existing)
    }

    /// Unconditionally clear the catalog.
    pub fn delete_all(&mut self) -> Result<()> {
        self.store.delete_all()
    }

    pub fn exists_by_id(&self, id: i64) -> Result<bool> {
        self.store.exists_by_id(id)
    }
}
