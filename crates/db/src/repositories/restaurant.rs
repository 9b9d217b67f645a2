//! Restaurant repository.

use std::sync::Arc;

use crate::entities::{Restaurant, restaurant};
use chrono::Utc;
use platerank_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::Expr,
};

/// Restaurant repository for database operations.
#[derive(Clone)]
pub struct RestaurantRepository {
    db: Arc<DatabaseConnection>,
}

impl RestaurantRepository {
    /// Create a new restaurant repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a restaurant by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<restaurant::Model>> {
        Restaurant::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a restaurant by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<restaurant::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(id.to_string()))
    }

    /// Find an approved restaurant by ID.
    ///
    /// Unapproved proposals are invisible to the review flow.
    pub async fn find_approved_by_id(&self, id: &str) -> AppResult<Option<restaurant::Model>> {
        Restaurant::find_by_id(id)
            .filter(restaurant::Column::Approved.eq(true))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a restaurant by ID on the given connection.
    ///
    /// Used inside transactions to read the post-increment aggregate.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<restaurant::Model>> {
        Restaurant::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List approved restaurants ordered by ranking score (best first).
    pub async fn list_ranked(&self, limit: u64) -> AppResult<Vec<restaurant::Model>> {
        Restaurant::find()
            .filter(restaurant::Column::Approved.eq(true))
            .order_by_desc(restaurant::Column::RankingScore)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
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
        Restaurant::update_many()
            .col_expr(
                restaurant::Column::RatingCount,
                Expr::col(restaurant::Column::RatingCount).add(1),
            )
            .col_expr(
                restaurant::Column::RatingSum,
                Expr::col(restaurant::Column::RatingSum).add(rating),
            )
            .col_expr(
                restaurant::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(restaurant::Column::Id.eq(id))
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
        Restaurant::update_many()
            .col_expr(
                restaurant::Column::RatingCount,
                Expr::cust("GREATEST(rating_count - 1, 0)"),
            )
            .col_expr(
                restaurant::Column::RatingSum,
                Expr::col(restaurant::Column::RatingSum).sub(rating),
            )
            .col_expr(
                restaurant::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(restaurant::Column::Id.eq(id))
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
        Restaurant::update_many()
            .col_expr(
                restaurant::Column::RatingSum,
                Expr::col(restaurant::Column::RatingSum).add(delta),
            )
            .col_expr(
                restaurant::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(restaurant::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Persist a freshly computed ranking score.
    pub async fn set_ranking_score<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        score: f64,
    ) -> AppResult<()> {
        Restaurant::update_many()
            .col_expr(restaurant::Column::RankingScore, Expr::value(score))
            .filter(restaurant::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
