//! Review repository.

use std::sync::Arc;

use crate::entities::{
    Review,
    review::{self, ResourceKind},
};
use platerank_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

/// Review repository for database operations.
#[derive(Clone)]
pub struct ReviewRepository {
    db: Arc<DatabaseConnection>,
}

impl ReviewRepository {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a review by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<review::Model>> {
        Review::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a review by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<review::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ReviewNotFound(id.to_string()))
    }

    /// Find the author's review of a resource, if any.
    pub async fn find_by_author_and_resource(
        &self,
        author_id: &str,
        resource_type: ResourceKind,
        resource_id: &str,
    ) -> AppResult<Option<review::Model>> {
        Review::find()
            .filter(review::Column::AuthorId.eq(author_id))
            .filter(review::Column::ResourceType.eq(resource_type))
            .filter(review::Column::ResourceId.eq(resource_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the author's review of a resource on the given connection.
    ///
    /// The in-transaction re-check behind the one-review-per-author
    /// invariant; the pre-transaction check is only an optimization.
    pub async fn find_by_author_and_resource_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        author_id: &str,
        resource_type: ResourceKind,
        resource_id: &str,
    ) -> AppResult<Option<review::Model>> {
        Review::find()
            .filter(review::Column::AuthorId.eq(author_id))
            .filter(review::Column::ResourceType.eq(resource_type))
            .filter(review::Column::ResourceId.eq(resource_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new review.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: review::ActiveModel,
    ) -> AppResult<review::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a review.
    pub async fn update<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: review::ActiveModel,
    ) -> AppResult<review::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a review.
    pub async fn delete<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<()> {
        Review::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get reviews for a resource, newest first (keyset paginated).
    pub async fn find_by_resource(
        &self,
        resource_type: ResourceKind,
        resource_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<review::Model>> {
        let mut query = Review::find()
            .filter(review::Column::ResourceType.eq(resource_type))
            .filter(review::Column::ResourceId.eq(resource_id))
            .order_by_desc(review::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(review::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count live reviews for a resource.
    pub async fn count_by_resource(
        &self,
        resource_type: ResourceKind,
        resource_id: &str,
    ) -> AppResult<u64> {
        Review::find()
            .filter(review::Column::ResourceType.eq(resource_type))
            .filter(review::Column::ResourceId.eq(resource_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Adjust the denormalized like/dislike counters.
    ///
    /// Both deltas land in one UPDATE with column arithmetic, so concurrent
    /// reactions from different users cannot lose increments.
    pub async fn adjust_reaction_counts<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        likes_delta: i32,
        dislikes_delta: i32,
    ) -> AppResult<()> {
        Review::update_many()
            .col_expr(
                review::Column::Likes,
                Expr::col(review::Column::Likes).add(likes_delta),
            )
            .col_expr(
                review::Column::Dislikes,
                Expr::col(review::Column::Dislikes).add(dislikes_delta),
            )
            .filter(review::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
