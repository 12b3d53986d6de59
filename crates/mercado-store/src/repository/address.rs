//! # Address Repository
//!
//! Delivery address CRUD, keyed by owning user. Mutations return the
//! updated full list so callers always render a consistent view.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use mercado_core::Address;

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: String,
    user_id: String,
    street: String,
    city: String,
    reference: String,
    lat: Option<f64>,
    lng: Option<f64>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Address {
            id: row.id,
            user_id: row.user_id,
            street: row.street,
            city: row.city,
            reference: row.reference,
            lat: row.lat,
            lng: row.lng,
        }
    }
}

/// Repository for delivery address operations.
#[derive(Debug, Clone)]
pub struct AddressRepository {
    pool: SqlitePool,
}

impl AddressRepository {
    /// Creates a new AddressRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AddressRepository { pool }
    }

    /// All addresses for a user.
    pub async fn list_for_user(&self, user_id: &str) -> StoreResult<Vec<Address>> {
        let rows: Vec<AddressRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, street, city, reference, lat, lng
            FROM addresses WHERE user_id = ?1 ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Adds an address for a user. The id is assigned here.
    /// Returns the updated full list.
    pub async fn add(
        &self,
        user_id: &str,
        street: &str,
        city: &str,
        reference: &str,
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> StoreResult<Vec<Address>> {
        let id = Uuid::new_v4().to_string();
        debug!(user_id, id = %id, "Adding address");

        sqlx::query(
            r#"
            INSERT INTO addresses (id, user_id, street, city, reference, lat, lng)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(street)
        .bind(city)
        .bind(reference)
        .bind(lat)
        .bind(lng)
        .execute(&self.pool)
        .await?;

        self.list_for_user(user_id).await
    }

    /// Deletes one of a user's addresses. Returns the updated full list.
    pub async fn delete(&self, address_id: &str, user_id: &str) -> StoreResult<Vec<Address>> {
        let result = sqlx::query(
            r#"
            DELETE FROM addresses WHERE id = ?1 AND user_id = ?2
            "#,
        )
        .bind(address_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Address", address_id));
        }

        self.list_for_user(user_id).await
    }
}
