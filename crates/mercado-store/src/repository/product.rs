//! # Product Repository
//!
//! Catalog reads and writes. The commerce core treats catalog data as
//! read-only input; writes here serve back-office product management and
//! the development seeder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use mercado_core::{BundleOffer, Category, Product};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: Option<String>,
    category: String,
    weight: Option<String>,
    image_url: Option<String>,
    tags: String,
    price_cents: i64,
    cost_cents: Option<i64>,
    discount_bps: Option<u32>,
    bundle_offers: String,
    stock: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let tags: Vec<String> = serde_json::from_str(&row.tags)?;
        let bundle_offers: Vec<BundleOffer> = serde_json::from_str(&row.bundle_offers)?;

        Ok(Product {
            id: row.id,
            name: row.name,
            description: row.description,
            category: row.category,
            weight: row.weight,
            image_url: row.image_url,
            tags,
            price_cents: row.price_cents,
            cost_cents: row.cost_cents,
            discount_bps: row.discount_bps,
            bundle_offers,
            stock: row.stock,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, category, weight, image_url, tags, \
     price_cents, cost_cents, discount_bps, bundle_offers, stock, is_active, \
     created_at, updated_at";

// =============================================================================
// Paged Result
// =============================================================================

/// One page of catalog products plus the total count, matching the
/// storefront's `fetchProducts() → {items, total}` contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product catalog operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product.
    pub async fn insert(&self, product: &Product) -> StoreResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, category, weight, image_url, tags,
                price_cents, cost_cents, discount_bps, bundle_offers,
                stock, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.weight)
        .bind(&product.image_url)
        .bind(serde_json::to_string(&product.tags)?)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.discount_bps)
        .bind(serde_json::to_string(&product.bundle_offers)?)
        .bind(product.stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a product's catalog fields.
    ///
    /// `stock` is deliberately not written here — it belongs to the ledger
    /// write path, which keeps it in lockstep with the movements.
    pub async fn update(&self, product: &Product) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2, description = ?3, category = ?4, weight = ?5,
                image_url = ?6, tags = ?7, price_cents = ?8, cost_cents = ?9,
                discount_bps = ?10, bundle_offers = ?11, is_active = ?12,
                updated_at = ?13
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.weight)
        .bind(&product.image_url)
        .bind(serde_json::to_string(&product.tags)?)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.discount_bps)
        .bind(serde_json::to_string(&product.bundle_offers)?)
        .bind(product.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// One page of active products plus the total active count.
    /// Pages are 1-based.
    pub async fn fetch_page(&self, page: u32, limit: u32) -> StoreResult<ProductPage> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;

        let offset = (page.max(1) - 1) as i64 * limit as i64;
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 \
             ORDER BY name LIMIT ?1 OFFSET ?2"
        ))
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(ProductPage { items, total })
    }

    /// Every product, active or not. Spoilage reporting joins historical
    /// movements against products that may have been deactivated since.
    pub async fn list_all(&self) -> StoreResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// All active products (the POS cache refresh path).
    pub async fn list_active(&self) -> StoreResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Inserts a category.
    pub async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, subcategories) VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(serde_json::to_string(&category.subcategories)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All categories.
    pub async fn fetch_categories(&self) -> StoreResult<Vec<Category>> {
        #[derive(sqlx::FromRow)]
        struct CategoryRow {
            id: String,
            name: String,
            subcategories: String,
        }

        let rows: Vec<CategoryRow> =
            sqlx::query_as("SELECT id, name, subcategories FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Category {
                    id: row.id,
                    name: row.name,
                    subcategories: serde_json::from_str(&row.subcategories)?,
                })
            })
            .collect()
    }
}
