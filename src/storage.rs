//! Sled-backed product store.
//!
//! Products live in a single `products` tree keyed by big-endian id, so tree
//! order is id order. Values are JSON-encoded [`Product`] records.

use std::path::Path;

use sled::{Db, Tree};

use crate::error::StorageError;
use crate::models::{Product, ProductCreate, ProductUpdate};

#[derive(Clone)]
pub struct Storage {
    db: Db,
    products: Tree,
}

impl Storage {
    /// Open or create the Sled database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::from_db(sled::open(path)?)
    }

    /// In-memory database removed on drop. Used by tests.
    pub fn temporary() -> Result<Self, StorageError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> Result<Self, StorageError> {
        let products = db.open_tree("products")?;
        Ok(Self { db, products })
    }

    /// Acquires a session for one unit of work. It is released when dropped.
    pub fn session(&self) -> ProductSession {
        ProductSession {
            db: self.db.clone(),
            products: self.products.clone(),
        }
    }
}

/// Scoped handle onto the product tree. Every write is flushed before returning.
pub struct ProductSession {
    db: Db,
    products: Tree,
}

impl ProductSession {
    pub fn list(&self, skip: usize, limit: usize) -> Result<Vec<Product>, StorageError> {
        self.products
            .iter()
            .values()
            .skip(skip)
            .take(limit)
            .map(|value| -> Result<Product, StorageError> { Ok(serde_json::from_slice(&value?)?) })
            .collect()
    }

    pub fn get(&self, id: u64) -> Result<Option<Product>, StorageError> {
        match self.products.get(id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn create(&self, fields: ProductCreate) -> Result<Product, StorageError> {
        // generate_id starts at 0; product ids start at 1
        let id = self.db.generate_id()? + 1;
        let product = fields.into_product(id);
        self.products.insert(id.to_be_bytes(), serde_json::to_vec(&product)?)?;
        self.products.flush()?;
        Ok(product)
    }

    /// Replaces every field of product `id`. Returns `None` if it does not exist,
    /// including when it is deleted concurrently.
    pub fn update(&self, id: u64, fields: &ProductUpdate) -> Result<Option<Product>, StorageError> {
        let key = id.to_be_bytes();
        loop {
            let Some(current) = self.products.get(key)? else {
                return Ok(None);
            };
            let mut product: Product = serde_json::from_slice(&current)?;
            fields.apply_to(&mut product);
            let encoded = serde_json::to_vec(&product)?;

            if self
                .products
                .compare_and_swap(key, Some(current), Some(encoded))?
                .is_ok()
            {
                self.products.flush()?;
                return Ok(Some(product));
            }
        }
    }

    /// Returns `false` if there was nothing to delete.
    pub fn delete(&self, id: u64) -> Result<bool, StorageError> {
        let removed = self.products.remove(id.to_be_bytes())?.is_some();
        if removed {
            self.products.flush()?;
        }
        Ok(removed)
    }
}

impl Drop for ProductSession {
    fn drop(&mut self) {
        tracing::trace!("product session released");
    }
}
