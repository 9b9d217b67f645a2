//! Reaction repository.

use std::sync::Arc;

use crate::entities::{
    Reaction,
    reaction::{self, ReactionKind},
};
use chrono::Utc;
use platerank_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

/// Reaction repository for database operations.
#[derive(Clone)]
pub struct ReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl ReactionRepository {
    /// Create a new reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's reaction to a review on the given connection.
    ///
    /// Always read on the transaction that will write: the read-then-write
    /// pair is what keeps rapid repeated reactions from the same user from
    /// double-counting.
    pub async fn find_by_user_and_review<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        review_id: &str,
    ) -> AppResult<Option<reaction::Model>> {
        Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::ReviewId.eq(review_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new reaction.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: reaction::ActiveModel,
    ) -> AppResult<reaction::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Flip a reaction between like and dislike.
    pub async fn set_kind<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        kind: ReactionKind,
    ) -> AppResult<()> {
        Reaction::update_many()
            .col_expr(reaction::Column::Kind, Expr::value(kind))
            .col_expr(reaction::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(reaction::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a reaction.
    pub async fn delete<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<()> {
        Reaction::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete all reactions referencing a review.
    ///
    /// Runs on the transaction that deletes the review itself.
    pub async fn delete_by_review<C: ConnectionTrait>(
        &self,
        conn: &C,
        review_id: &str,
    ) -> AppResult<u64> {
        let result = Reaction::delete_many()
            .filter(reaction::Column::ReviewId.eq(review_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Get reactions for a review (paginated).
    pub async fn find_by_review(
        &self,
        review_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<reaction::Model>> {
        let mut query = Reaction::find()
            .filter(reaction::Column::ReviewId.eq(review_id))
            .order_by_desc(reaction::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(reaction::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reactions of one kind on a review.
    pub async fn count_by_review_and_kind(
        &self,
        review_id: &str,
        kind: ReactionKind,
    ) -> AppResult<u64> {
        Reaction::find()
            .filter(reaction::Column::ReviewId.eq(review_id))
            .filter(reaction::Column::Kind.eq(kind))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_reaction(
        id: &str,
        user_id: &str,
        review_id: &str,
        kind: ReactionKind,
    ) -> reaction::Model {
        reaction::Model {
            id: id.to_string(),
            review_id: review_id.to_string(),
            user_id: user_id.to_string(),
            kind,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_user_and_review_found() {
        let reaction = create_test_reaction("r1", "user1", "rev1", ReactionKind::Like);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[reaction.clone()]])
                .into_connection(),
        );

        let repo = ReactionRepository::new(db.clone());
        let result = repo
            .find_by_user_and_review(db.as_ref(), "user1", "rev1")
            .await
            .unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().kind, ReactionKind::Like);
    }

    #[tokio::test]
    async fn test_find_by_user_and_review_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<reaction::Model>::new()])
                .into_connection(),
        );

        let repo = ReactionRepository::new(db.clone());
        let result = repo
            .find_by_user_and_review(db.as_ref(), "user1", "rev2")
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_by_review() {
        let r1 = create_test_reaction("r1", "user1", "rev1", ReactionKind::Like);
        let r2 = create_test_reaction("r2", "user2", "rev1", ReactionKind::Dislike);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r1, r2]])
                .into_connection(),
        );

        let repo = ReactionRepository::new(db);
        let result = repo.find_by_review("rev1", 10, None).await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_by_review() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .into_connection(),
        );

        let repo = ReactionRepository::new(db.clone());
        let removed = repo.delete_by_review(db.as_ref(), "rev1").await.unwrap();

        assert_eq!(removed, 3);
    }
}
