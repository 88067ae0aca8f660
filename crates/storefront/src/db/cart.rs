//! Cart rows for signed-in accounts.

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;
use valiero_core::{LineItem, LineKey, ProductId, UserId};

use super::RepositoryError;
use crate::bag::{RemoteError, RemoteStore};

#[derive(sqlx::FromRow)]
struct CartItemRow {
    product_id: String,
    name: String,
    price: Decimal,
    original_price: Option<Decimal>,
    image: String,
    size: String,
    color: String,
    quantity: i32,
}

impl TryFrom<CartItemRow> for LineItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "cart item {} has quantity {}",
                    row.product_id, row.quantity
                ))
            })?;

        Ok(Self {
            id: ProductId::new(row.product_id),
            name: row.name,
            price: row.price,
            original_price: row.original_price,
            image: row.image,
            size: row.size,
            color: row.color,
            quantity,
        })
    }
}

/// Repository for `storefront.cart_item`.
#[derive(Clone)]
pub struct CartRepository {
    pool: Arc<PgPool>,
}

impl CartRepository {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// All lines for an account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored quantity is not positive.
    #[instrument(skip(self), fields(account = %account))]
    pub async fn list(&self, account: UserId) -> Result<Vec<LineItem>, RepositoryError> {
        sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT product_id, name, price, original_price, image, size, color, quantity
            FROM storefront.cart_item
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(account.as_i32())
        .fetch_all(&*self.pool)
        .await?
        .into_iter()
        .map(LineItem::try_from)
        .collect()
    }

    /// Insert a line or overwrite the line with the same product, size and color.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the quantity does not fit the column.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, item), fields(account = %account, product = %item.id))]
    pub async fn save(&self, account: UserId, item: &LineItem) -> Result<(), RepositoryError> {
        let quantity = i32::try_from(item.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("quantity {} out of range", item.quantity))
        })?;

        sqlx::query(
            r"
            INSERT INTO storefront.cart_item
                (user_id, product_id, size, color, name, price, original_price, image, quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id, product_id, size, color) DO UPDATE SET
                name = EXCLUDED.name,
                price = EXCLUDED.price,
                original_price = EXCLUDED.original_price,
                image = EXCLUDED.image,
                quantity = EXCLUDED.quantity,
                updated_at = NOW()
            ",
        )
        .bind(account.as_i32())
        .bind(item.id.as_str())
        .bind(&item.size)
        .bind(&item.color)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.original_price)
        .bind(&item.image)
        .bind(quantity)
        .execute(&*self.pool)
        .await?;

        Ok(())
    }

    /// Delete one line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, key), fields(account = %account, product = %key.id))]
    pub async fn remove(&self, account: UserId, key: &LineKey) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            DELETE FROM storefront.cart_item
            WHERE user_id = $1 AND product_id = $2 AND size = $3 AND color = $4
            ",
        )
        .bind(account.as_i32())
        .bind(key.id.as_str())
        .bind(&key.size)
        .bind(&key.color)
        .execute(&*self.pool)
        .await?;

        Ok(())
    }

    /// Delete every line for an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(account = %account))]
    pub async fn remove_all(&self, account: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1")
            .bind(account.as_i32())
            .execute(&*self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

impl RemoteStore<LineItem> for CartRepository {
    async fn fetch_all(&self, account: UserId) -> Result<Vec<LineItem>, RemoteError> {
        Ok(self.list(account).await?)
    }

    async fn upsert(&self, account: UserId, item: LineItem) -> Result<(), RemoteError> {
        Ok(self.save(account, &item).await?)
    }

    async fn delete(&self, account: UserId, key: LineKey) -> Result<(), RemoteError> {
        Ok(self.remove(account, &key).await?)
    }

    async fn delete_all(&self, account: UserId) -> Result<(), RemoteError> {
        self.remove_all(account).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(quantity: i32) -> CartItemRow {
        CartItemRow {
            product_id: "gid://shopify/Product/1".to_string(),
            name: "Merino Crew".to_string(),
            price: Decimal::new(9500, 2),
            original_price: Some(Decimal::new(12000, 2)),
            image: "/crew.jpg".to_string(),
            size: "L".to_string(),
            color: "Navy".to_string(),
            quantity,
        }
    }

    #[test]
    fn test_row_converts_to_line_item() {
        let item = LineItem::try_from(row(2)).unwrap();
        assert_eq!(item.id.as_str(), "gid://shopify/Product/1");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.original_price, Some(Decimal::new(12000, 2)));
    }

    #[test]
    fn test_non_positive_quantity_is_corruption() {
        assert!(matches!(
            LineItem::try_from(row(0)),
            Err(RepositoryError::DataCorruption(_))
        ));
        assert!(matches!(
            LineItem::try_from(row(-4)),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
