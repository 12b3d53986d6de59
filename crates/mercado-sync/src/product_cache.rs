//! # POS Product Cache
//!
//! Keeps a local copy of the catalog so the register can price sales while
//! disconnected. `refresh` pulls through the catalog source and rewrites
//! the cache; when the source is unreachable the cached copy (or the
//! supplied fallback) serves instead.

use std::sync::Arc;

use tracing::{info, warn};

use mercado_core::Product;

use crate::error::SyncResult;
use crate::ports::{CatalogSource, ProductCacheStore};
use crate::queue::SyncStatus;

/// The POS-side catalog cache.
#[derive(Clone)]
pub struct ProductCache {
    store: Arc<dyn ProductCacheStore>,
    source: Arc<dyn CatalogSource>,
}

impl ProductCache {
    /// Creates a cache over a local store and a catalog source.
    pub fn new(store: Arc<dyn ProductCacheStore>, source: Arc<dyn CatalogSource>) -> Self {
        ProductCache { store, source }
    }

    /// Refreshes the cache from the catalog source.
    ///
    /// On success the cache is rewritten and the fresh catalog returned with
    /// `Synced`. When the source is unreachable, the locally cached catalog
    /// (or `fallback` if the cache is empty) is returned with `Offline`.
    pub async fn refresh(&self, fallback: &[Product]) -> SyncResult<(Vec<Product>, SyncStatus)> {
        match self.source.fetch_products().await {
            Ok(products) => {
                self.store.put_all(&products).await?;
                info!(count = products.len(), "Product catalog cached");
                Ok((products, SyncStatus::Synced))
            }
            Err(err) => {
                warn!(error = %err, "Catalog fetch failed, serving local products");
                let local = self.local(fallback).await?;
                Ok((local, SyncStatus::Offline))
            }
        }
    }

    /// The locally cached catalog, or `fallback` when the cache is empty.
    pub async fn local(&self, fallback: &[Product]) -> SyncResult<Vec<Product>> {
        let cached = self.store.get_all().await?;
        if cached.is_empty() {
            Ok(fallback.to_vec())
        } else {
            Ok(cached)
        }
    }

    /// Drops the cached catalog.
    pub async fn clear(&self) -> SyncResult<()> {
        self.store.clear().await
    }
}
