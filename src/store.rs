// SQLite-backed record store for the catalog

use crate::error::{CatalogError, Result};
use crate::models::{NewProduct, Product, now_ms};
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Durable keyed storage for product records.
///
/// One `products` table holds the full record as JSON next to the indexed
/// shadow columns. Case-insensitive name uniqueness is enforced by a UNIQUE
/// index over the lowercased `name_lower` column, so the constraint holds
/// regardless of what the caller checked first; category lookups and the
/// quantity filter go through shadow columns of their own rather than any
/// collation default.
pub struct ProductStore {
    base_path: PathBuf,
    db: Connection,
}

impl ProductStore {
    /// Open or create a store at the given path.
    ///
    /// The store lives in a `.retailstore` subdirectory of the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().join(".retailstore");

        fs::create_dir_all(&base_path)?;

        let db_path = base_path.join("retail.db");
        let db = Connection::open(&db_path)?;

        let store = Self { base_path, db };
        store.create_schema()?;
        store.create_gitignore()?;

        info!(path = ?store.base_path, "Opened product store");
        Ok(store)
    }

    /// In-memory store, for tests and throwaway catalogs.
    pub fn in_memory() -> Result<Self> {
        let db = Connection::open_in_memory()?;
        let store = Self {
            base_path: PathBuf::new(),
            db,
        };
        store.create_schema()?;
        Ok(store)
    }

    /// Get the base path of this store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating database schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name_lower TEXT NOT NULL UNIQUE,
                category_lower TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                data_json TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_products_category ON products(category_lower);
            "#,
        )?;

        Ok(())
    }

    fn create_gitignore(&self) -> Result<()> {
        let gitignore_path = self.base_path.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(gitignore_path, "retail.db\nretail.db-shm\nretail.db-wal\n")?;
        }
        Ok(())
    }

    // ========================================================================
    // Record store contract
    // ========================================================================

    /// Persist a candidate, assigning id and timestamps.
    ///
    /// A name collision on the unique index surfaces as `AlreadyExists`.
    pub fn insert(&mut self, candidate: NewProduct) -> Result<Product> {
        let now = now_ms();

        let tx = self.db.transaction()?;
        tx.execute(
            "INSERT INTO products (name_lower, category_lower, quantity, data_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, '', ?4, ?4)",
            rusqlite::params![
                candidate.product_name.to_lowercase(),
                candidate.category.to_lowercase(),
                candidate.quantity,
                now
            ],
        )
        .map_err(|e| map_name_conflict(e, &candidate.product_name))?;

        let product = Product {
            id: tx.last_insert_rowid(),
            product_name: candidate.product_name,
            category: candidate.category,
            price: candidate.price,
            quantity: candidate.quantity,
            description: candidate.description,
            created_at: now,
            updated_at: now,
        };

        // The row exists now, so the record can carry its assigned id.
        let data_json = serde_json::to_string(&product)?;
        tx.execute(
            "UPDATE products SET data_json = ?1 WHERE id = ?2",
            rusqlite::params![data_json, product.id],
        )?;
        tx.commit()?;

        debug!(id = product.id, name = %product.product_name, "Inserted product");
        Ok(product)
    }

    /// Upsert by id, refreshing `updated_at`. Returns the persisted record.
    pub fn save(&mut self, mut product: Product) -> Result<Product> {
        product.updated_at = now_ms();
        let data_json = serde_json::to_string(&product)?;

        let tx = self.db.transaction()?;
        let changed = tx
            .execute(
                "UPDATE products
                 SET name_lower = ?1, category_lower = ?2, quantity = ?3, data_json = ?4, updated_at = ?5
                 WHERE id = ?6",
                rusqlite::params![
                    product.product_name.to_lowercase(),
                    product.category.to_lowercase(),
                    product.quantity,
                    data_json,
                    product.updated_at,
                    product.id
                ],
            )
            .map_err(|e| map_name_conflict(e, &product.product_name))?;

        if changed == 0 {
            tx.execute(
                "INSERT INTO products (id, name_lower, category_lower, quantity, data_json, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    product.id,
                    product.product_name.to_lowercase(),
                    product.category.to_lowercase(),
                    product.quantity,
                    data_json,
                    product.created_at,
                    product.updated_at
                ],
            )
            .map_err(|e| map_name_conflict(e, &product.product_name))?;
        }
        tx.commit()?;

        debug!(id = product.id, name = %product.product_name, "Saved product");
        Ok(product)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Product>> {
        let json: Option<String> = self
            .db
            .query_row(
                "SELECT data_json FROM products WHERE id = ?1",
                [id],
                |row| row.get(0),
            )
            .optional()?;

        json.map(|j| serde_json::from_str(&j).map_err(CatalogError::from))
            .transpose()
    }

    /// Lookup by product name, compared case-insensitively.
    pub fn find_by_name(&self, name: &str) -> Result<Option<Product>> {
        let json: Option<String> = self
            .db
            .query_row(
                "SELECT data_json FROM products WHERE name_lower = ?1",
                [name.to_lowercase()],
                |row| row.get(0),
            )
            .optional()?;

        json.map(|j| serde_json::from_str(&j).map_err(CatalogError::from))
            .transpose()
    }

    /// All records in the category, compared case-insensitively, in insertion order.
    pub fn find_by_category(&self, category: &str) -> Result<Vec<Product>> {
        self.collect_products(
            "SELECT data_json FROM products WHERE category_lower = ?1 ORDER BY id",
            rusqlite::params![category.to_lowercase()],
        )
    }

    /// Category records holding more than `min_quantity` units.
    pub fn find_by_category_with_min_quantity(
        &self,
        category: &str,
        min_quantity: i64,
    ) -> Result<Vec<Product>> {
        self.collect_products(
            "SELECT data_json FROM products
             WHERE category_lower = ?1 AND quantity > ?2 ORDER BY id",
            rusqlite::params![category.to_lowercase(), min_quantity],
        )
    }

    /// Every record, in insertion order.
    pub fn find_all(&self) -> Result<Vec<Product>> {
        self.collect_products("SELECT data_json FROM products ORDER BY id", [])
    }

    pub fn exists_by_id(&self, id: i64) -> Result<bool> {
        let exists: bool = self.db.query_row(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = ?1)",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn exists_by_name(&self, name: &str) -> Result<bool> {
        let exists: bool = self.db.query_row(
            "SELECT EXISTS(SELECT 1 FROM products WHERE name_lower = ?1)",
            [name.to_lowercase()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn delete(&mut self, product: &Product) -> Result<()> {
        self.db
            .execute("DELETE FROM products WHERE id = ?1", [product.id])?;
        debug!(id = product.id, "Deleted product");
        Ok(())
    }

    pub fn delete_all(&mut self) -> Result<()> {
        let removed = self.db.execute("DELETE FROM products", [])?;
        info!(removed, "Cleared product store");
        Ok(())
    }

    fn collect_products<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<Product>> {
        let mut stmt = self.db.prepare(sql)?;
        let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;

        let mut results = Vec::new();
        for row_result in rows {
            let data_json = row_result?;
            let product: Product = serde_json::from_str(&data_json)?;
            results.push(product);
        }
        Ok(results)
    }
}

/// Translate a UNIQUE violation on `name_lower` into the domain error; pass
/// everything else through as a storage failure.
fn map_name_conflict(err: rusqlite::Error, name: &str) -> CatalogError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            CatalogError::already_exists("productName", name)
        }
        _ => CatalogError::Storage(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn candidate(name: &str, category: &str) -> NewProduct {
        NewProduct {
            product_name: name.to_string(),
            category: category.to_string(),
            price: 99.99,
            quantity: 5,
            description: None,
        }
    }

    #[test]
    fn test_store_open_creates_directory() {
        let temp = TempDir::new().unwrap();

        let store = ProductStore::open(temp.path()).unwrap();
        let store_path = temp.path().join(".retailstore");
        assert_eq!(store.base_path(), store_path);
        assert!(store_path.exists());
        assert!(store_path.join("retail.db").exists());
        assert!(store_path.join(".gitignore").exists());
    }

    #[test]
    fn test_insert_assigns_id_and_timestamps() {
        let mut store = ProductStore::in_memory().unwrap();

        let product = store.insert(candidate("Laptop", "Electronics")).unwrap();
        assert_eq!(product.id, 1);
        assert!(product.created_at > 0);
        assert_eq!(product.created_at, product.updated_at);

        let retrieved = store.find_by_id(product.id).unwrap().unwrap();
        assert_eq!(retrieved, product);
    }

    #[test]
    fn test_insert_ids_are_not_reused() {
        let mut store = ProductStore::in_memory().unwrap();

        let first = store.insert(candidate("Laptop", "Electronics")).unwrap();
        store.delete(&first).unwrap();
        let second = store.insert(candidate("Tablet", "Electronics")).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_insert_duplicate_name_is_conflict() {
        let mut store = ProductStore::in_memory().unwrap();
        store.insert(candidate("Laptop", "Electronics")).unwrap();

        let err = store.insert(candidate("LAPTOP", "Electronics")).unwrap_err();
        assert!(matches!(err, CatalogError::AlreadyExists { .. }));
        assert!(err.to_string().contains("LAPTOP"));
    }

    #[test]
    fn test_find_by_name_ignores_case() {
        let mut store = ProductStore::in_memory().unwrap();
        let product = store.insert(candidate("Laptop", "Electronics")).unwrap();

        let found = store.find_by_name("lApToP").unwrap().unwrap();
        assert_eq!(found, product);
        assert!(store.find_by_name("Desktop").unwrap().is_none());
    }

    #[test]
    fn test_find_by_category_ignores_case_and_keeps_order() {
        let mut store = ProductStore::in_memory().unwrap();
        store.insert(candidate("Laptop", "Electronics")).unwrap();
        store.insert(candidate("Desk", "Furniture")).unwrap();
        store.insert(candidate("Phone", "ELECTRONICS")).unwrap();

        let electronics = store.find_by_category("electronics").unwrap();
        assert_eq!(electronics.len(), 2);
        assert_eq!(electronics[0].product_name, "Laptop");
        assert_eq!(electronics[1].product_name, "Phone");

        assert!(store.find_by_category("toys").unwrap().is_empty());
    }

    #[test]
    fn test_find_by_category_with_min_quantity() {
        let mut store = ProductStore::in_memory().unwrap();
        let mut low = candidate("Laptop", "Electronics");
        low.quantity = 2;
        let mut high = candidate("Phone", "Electronics");
        high.quantity = 20;
        store.insert(low).unwrap();
        store.insert(high).unwrap();

        let stocked = store
            .find_by_category_with_min_quantity("Electronics", 5)
            .unwrap();
        assert_eq!(stocked.len(), 1);
        assert_eq!(stocked[0].product_name, "Phone");

        // Strictly greater-than: a quantity equal to the bound is excluded.
        assert!(
            store
                .find_by_category_with_min_quantity("Electronics", 20)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_save_refreshes_updated_at_and_keeps_created_at() {
        let mut store = ProductStore::in_memory().unwrap();
        let mut product = store.insert(candidate("Laptop", "Electronics")).unwrap();
        let created_at = product.created_at;

        product.updated_at = 0; // stale value; save must refresh it
        product.price = 899.99;
        let saved = store.save(product).unwrap();
        assert!(saved.updated_at >= created_at);
        assert_eq!(saved.created_at, created_at);

        let retrieved = store.find_by_id(saved.id).unwrap().unwrap();
        assert_eq!(retrieved.price, 899.99);
        assert_eq!(retrieved.updated_at, saved.updated_at);
    }

    #[test]
    fn test_save_rename_collision_is_conflict() {
        let mut store = ProductStore::in_memory().unwrap();
        store.insert(candidate("Laptop", "Electronics")).unwrap();
        let mut phone = store.insert(candidate("Phone", "Electronics")).unwrap();

        phone.product_name = "laptop".to_string();
        let err = store.save(phone).unwrap_err();
        assert!(matches!(err, CatalogError::AlreadyExists { .. }));
    }

    #[test]
    fn test_save_keeps_shadow_columns_in_sync() {
        let mut store = ProductStore::in_memory().unwrap();
        let mut product = store.insert(candidate("Laptop", "Electronics")).unwrap();

        product.product_name = "Notebook".to_string();
        product.category = "Computers".to_string();
        store.save(product).unwrap();

        assert!(store.find_by_name("Laptop").unwrap().is_none());
        assert!(store.find_by_name("NOTEBOOK").unwrap().is_some());
        assert_eq!(store.find_by_category("computers").unwrap().len(), 1);
    }

    #[test]
    fn test_exists_checks() {
        let mut store = ProductStore::in_memory().unwrap();
        let product = store.insert(candidate("Laptop", "Electronics")).unwrap();

        assert!(store.exists_by_id(product.id).unwrap());
        assert!(!store.exists_by_id(999).unwrap());
        assert!(store.exists_by_name("laptop").unwrap());
        assert!(!store.exists_by_name("desktop").unwrap());
    }

    #[test]
    fn test_delete_and_delete_all() {
        let mut store = ProductStore::in_memory().unwrap();
        let product = store.insert(candidate("Laptop", "Electronics")).unwrap();
        store.insert(candidate("Phone", "Electronics")).unwrap();

        store.delete(&product).unwrap();
        assert!(store.find_by_id(product.id).unwrap().is_none());
        assert_eq!(store.find_all().unwrap().len(), 1);

        store.delete_all().unwrap();
        assert!(store.find_all().unwrap().is_empty());
    }

    #[test]
    fn test_store_persists_across_reopen() {
        let temp = TempDir::new().unwrap();

        let id = {
            let mut store = ProductStore::open(temp.path()).unwrap();
            store.insert(candidate("Laptop", "Electronics")).unwrap().id
        };

        let store = ProductStore::open(temp.path()).unwrap();
        let product = store.find_by_id(id).unwrap().unwrap();
        assert_eq!(product.product_name, "Laptop");
    }
}
