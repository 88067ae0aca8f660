//! Wishlist rows for signed-in accounts.

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;
use valiero_core::{ProductId, UserId, WishlistEntry};

use super::RepositoryError;
use crate::bag::{RemoteError, RemoteStore};

#[derive(sqlx::FromRow)]
struct WishlistItemRow {
    product_id: String,
    name: String,
    price: Decimal,
    original_price: Option<Decimal>,
    image: String,
    secondary_image: Option<String>,
}

impl From<WishlistItemRow> for WishlistEntry {
    fn from(row: WishlistItemRow) -> Self {
        Self {
            id: ProductId::new(row.product_id),
            name: row.name,
            price: row.price,
            original_price: row.original_price,
            image: row.image,
            secondary_image: row.secondary_image,
        }
    }
}

/// Repository for `storefront.wishlist_item`.
#[derive(Clone)]
pub struct WishlistRepository {
    pool: Arc<PgPool>,
}

impl WishlistRepository {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// All entries for an account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(account = %account))]
    pub async fn list(&self, account: UserId) -> Result<Vec<WishlistEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, WishlistItemRow>(
            r"
            SELECT product_id, name, price, original_price, image, secondary_image
            FROM storefront.wishlist_item
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(account.as_i32())
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.into_iter().map(WishlistEntry::from).collect())
    }

    /// Insert an entry or refresh the stored copy of the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, entry), fields(account = %account, product = %entry.id))]
    pub async fn save(&self, account: UserId, entry: &WishlistEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.wishlist_item
                (user_id, product_id, name, price, original_price, image, secondary_image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, product_id) DO UPDATE SET
                name = EXCLUDED.name,
                price = EXCLUDED.price,
                original_price = EXCLUDED.original_price,
                image = EXCLUDED.image,
                secondary_image = EXCLUDED.secondary_image,
                updated_at = NOW()
            ",
        )
        .bind(account.as_i32())
        .bind(entry.id.as_str())
        .bind(&entry.name)
        .bind(entry.price)
        .bind(entry.original_price)
        .bind(&entry.image)
        .bind(entry.secondary_image.as_deref())
        .execute(&*self.pool)
        .await?;

        Ok(())
    }

    /// Delete one entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(account = %account, product = %product))]
    pub async fn remove(&self, account: UserId, product: &ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.wishlist_item WHERE user_id = $1 AND product_id = $2")
            .bind(account.as_i32())
            .bind(product.as_str())
            .execute(&*self.pool)
            .await?;

        Ok(())
    }

    /// Delete every entry for an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(account = %account))]
    pub async fn remove_all(&self, account: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.wishlist_item WHERE user_id = $1")
            .bind(account.as_i32())
            .execute(&*self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

impl RemoteStore<WishlistEntry> for WishlistRepository {
    async fn fetch_all(&self, account: UserId) -> Result<Vec<WishlistEntry>, RemoteError> {
        Ok(self.list(account).await?)
    }

    async fn upsert(&self, account: UserId, item: WishlistEntry) -> Result<(), RemoteError> {
        Ok(self.save(account, &item).await?)
    }

    async fn delete(&self, account: UserId, key: ProductId) -> Result<(), RemoteError> {
        Ok(self.remove(account, &key).await?)
    }

    async fn delete_all(&self, account: UserId) -> Result<(), RemoteError> {
        self.remove_all(account).await?;
        Ok(())
    }
}
