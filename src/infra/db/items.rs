use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};

use crate::application::repos::{ItemQuery, ItemsRepo, RepoError};
use crate::domain::entities::ItemRecord;
use crate::domain::types::SortOrder;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i64,
    title: String,
    description: String,
    price: Decimal,
    image_path: String,
}

impl From<ItemRow> for ItemRecord {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            image_path: row.image_path,
        }
    }
}

#[async_trait]
impl ItemsRepo for PostgresRepositories {
    async fn item_by_id(&self, id: i64) -> Result<Option<ItemRecord>, RepoError> {
        let row = sqlx::query_as::<_, ItemRow>(
            "SELECT id, title, description, price, image_path FROM items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(ItemRecord::from))
    }

    async fn list_items(&self, query: &ItemQuery) -> Result<Vec<ItemRecord>, RepoError> {
        let (limit, offset) = page_limits(query.page, query.size);

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, title, description, price, image_path FROM items WHERE 1=1 ",
        );

        let search = query.search.trim();
        if !search.is_empty() {
            let pattern = format!("%{search}%");
            qb.push(" AND (title ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR description ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        match query.sort {
            SortOrder::Unsorted => {
                qb.push(" ORDER BY id ");
            }
            SortOrder::Price => {
                qb.push(" ORDER BY price, id ");
            }
            SortOrder::Title => {
                qb.push(" ORDER BY title, id ");
            }
        }

        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<ItemRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(ItemRecord::from).collect())
    }

    async fn count_items(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(count.max(0) as u64)
    }
}

/// The cold-path LIMIT/OFFSET must mirror the warm index range exactly: the
/// requested size passes through unmodified, including zero.
fn page_limits(page: u32, size: u32) -> (i64, i64) {
    let limit = i64::from(size);
    (limit, i64::from(page) * limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_passes_through_unmodified() {
        assert_eq!(page_limits(0, 250), (250, 0));
        assert_eq!(page_limits(2, 250), (250, 500));
    }

    #[test]
    fn zero_size_page_yields_limit_zero() {
        assert_eq!(page_limits(0, 0), (0, 0));
        assert_eq!(page_limits(3, 0), (0, 0));
    }
}
