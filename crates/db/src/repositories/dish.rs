//! Dish repository.

use std::sync::Arc;

use crate::entities::{Dish, dish};
use chrono::Utc;
use platerank_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, sea_query::Expr,
};

/// Dish repository for database operations.
#[derive(Clone)]
pub struct DishRepository {
    db: Arc<DatabaseConnection>,
}

impl DishRepository {
    /// Create a new dish repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a dish by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<dish::Model>> {
        Dish::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a dish by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<dish::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(id.to_string()))
    }

    /// Fold a newly created review into the rating aggregate.
    ///
    /// Single UPDATE with column arithmetic; must run on the transaction
    /// that inserts the review.
    pub async fn apply_rating_create<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        rating: i32,
    ) -> AppResult<()> {
        Dish::update_many()
            .col_expr(
                dish::Column::RatingCount,
                Expr::col(dish::Column::RatingCount).add(1),
            )
            .col_expr(
                dish::Column::RatingSum,
                Expr::col(dish::Column::RatingSum).add(rating),
            )
            .col_expr(dish::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(dish::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove a deleted review from the rating aggregate.
    pub async fn apply_rating_delete<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        rating: i32,
    ) -> AppResult<()> {
        Dish::update_many()
            .col_expr(
                dish::Column::RatingCount,
                Expr::cust("GREATEST(rating_count - 1, 0)"),
            )
            .col_expr(
                dish::Column::RatingSum,
                Expr::col(dish::Column::RatingSum).sub(rating),
            )
            .col_expr(dish::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(dish::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Apply a rating edit to the aggregate (count unchanged).
    pub async fn apply_rating_edit<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        delta: i32,
    ) -> AppResult<()> {
        Dish::update_many()
            .col_expr(
                dish::Column::RatingSum,
                Expr::col(dish::Column::RatingSum).add(delta),
            )
            .col_expr(dish::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(dish::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_dish(id: &str, restaurant_id: &str) -> dish::Model {
        dish::Model {
            id: id.to_string(),
            restaurant_id: restaurant_id.to_string(),
            name: "Carbonara".to_string(),
            description: String::new(),
            price: 12.5,
            created_by: "user1".to_string(),
            rating_count: 0,
            rating_sum: 0,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let dish = create_test_dish("dish1", "rest1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[dish.clone()]])
                .into_connection(),
        );

        let repo = DishRepository::new(db);
        let result = repo.find_by_id("dish1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().name, "Carbonara");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<dish::Model>::new()])
                .into_connection(),
        );

        let repo = DishRepository::new(db);
        let result = repo.get_by_id("nonexistent").await;

        assert!(matches!(result, Err(AppError::ResourceNotFound(_))));
    }

    #[tokio::test]
    async fn test_apply_rating_edit_executes_single_update() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = DishRepository::new(db.clone());
        repo.apply_rating_edit(db.as_ref(), "dish1", -2).await.unwrap();
    }
}
