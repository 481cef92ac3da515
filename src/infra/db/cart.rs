use async_trait::async_trait;

use crate::application::repos::{CartRepo, RepoError};
use crate::domain::entities::CartLine;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    item_id: i64,
    user_id: i64,
    quantity: i64,
}

impl From<CartRow> for CartLine {
    fn from(row: CartRow) -> Self {
        Self {
            item_id: row.item_id,
            user_id: row.user_id,
            quantity: row.quantity,
        }
    }
}

#[async_trait]
impl CartRepo for PostgresRepositories {
    async fn cart_line(&self, item_id: i64, user_id: i64) -> Result<Option<CartLine>, RepoError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT item_id, user_id, quantity FROM carts WHERE item_id = $1 AND user_id = $2",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(CartLine::from))
    }

    async fn upsert_cart_line(&self, line: CartLine) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO carts (item_id, user_id, quantity) VALUES ($1, $2, $3) \
             ON CONFLICT (item_id, user_id) DO UPDATE SET quantity = EXCLUDED.quantity",
        )
        .bind(line.item_id)
        .bind(line.user_id)
        .bind(line.quantity)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete_cart_line(&self, item_id: i64, user_id: i64) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM carts WHERE item_id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
