//! Review service.
//!
//! Coordinates the multi-table writes behind a review's lifecycle: the
//! review row, the target resource's rating aggregate, and (for
//! restaurants) the derived ranking score all move together in one
//! transaction, or not at all.

use std::sync::Arc;

use chrono::Utc;
use platerank_common::{AppError, AppResult, IdGenerator};
use platerank_db::{
    entities::review::{self, ResourceKind},
    repositories::{DishRepository, ReactionRepository, RestaurantRepository, ReviewRepository},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use serde::Deserialize;
use validator::Validate;

use crate::services::ranking::{self, RatingAggregate};
use crate::services::unwrap_txn_err;

/// Caller role, supplied by the authentication collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular user.
    User,
    /// Administrator; may edit or remove any review.
    Admin,
}

/// Authenticated caller identity. Trusted as-is; the engine only applies
/// author/admin authorization on top of it.
#[derive(Debug, Clone)]
pub struct Actor {
    /// User ID.
    pub id: String,
    /// Role granted by the authentication layer.
    pub role: Role,
}

impl Actor {
    fn can_mutate(&self, author_id: &str) -> bool {
        self.role == Role::Admin || self.id == author_id
    }
}

/// Input for creating a new review.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewInput {
    /// Whether the target is a restaurant or a dish.
    pub resource_type: ResourceKind,

    /// The reviewed restaurant or dish.
    pub resource_id: String,

    /// Star rating.
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,

    /// Optional comment.
    pub comment: Option<String>,
}

/// Input for updating a review. Rating and comment are the only mutable
/// fields; everything else on the document is off limits to callers.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewInput {
    /// New star rating (None = unchanged).
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i32>,

    /// New comment (None = unchanged).
    pub comment: Option<String>,
}

/// Review service for business logic.
#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
    review_repo: ReviewRepository,
    restaurant_repo: RestaurantRepository,
    dish_repo: DishRepository,
    reaction_repo: ReactionRepository,
    id_gen: IdGenerator,
}

impl ReviewService {
    /// Create a new review service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        review_repo: ReviewRepository,
        restaurant_repo: RestaurantRepository,
        dish_repo: DishRepository,
        reaction_repo: ReactionRepository,
    ) -> Self {
        Self {
            db,
            review_repo,
            restaurant_repo,
            dish_repo,
            reaction_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a review for a restaurant or dish.
    ///
    /// The review insert, the aggregate increment and (for restaurants)
    /// the score recomputation commit as one unit. The duplicate-review
    /// check runs again inside the transaction; the outer check only
    /// exists to reject cheaply.
    pub async fn create(
        &self,
        author_id: &str,
        input: CreateReviewInput,
    ) -> AppResult<review::Model> {
        input.validate()?;

        // Resource must exist; restaurants must also be approved
        match input.resource_type {
            ResourceKind::Restaurant => {
                self.restaurant_repo
                    .find_approved_by_id(&input.resource_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::ResourceNotFound(format!(
                            "restaurant {} not found or not approved",
                            input.resource_id
                        ))
                    })?;
            }
            ResourceKind::Dish => {
                self.dish_repo.get_by_id(&input.resource_id).await?;
            }
        }

        if self
            .review_repo
            .find_by_author_and_resource(author_id, input.resource_type, &input.resource_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "You already reviewed this resource".to_string(),
            ));
        }

        let review_repo = self.review_repo.clone();
        let restaurant_repo = self.restaurant_repo.clone();
        let dish_repo = self.dish_repo.clone();
        let author = author_id.to_string();
        let id = self.id_gen.generate();
        let now = Utc::now();

        let created = self
            .db
            .transaction::<_, review::Model, AppError>(move |txn| {
                Box::pin(async move {
                    if review_repo
                        .find_by_author_and_resource_in(
                            txn,
                            &author,
                            input.resource_type,
                            &input.resource_id,
                        )
                        .await?
                        .is_some()
                    {
                        return Err(AppError::Conflict(
                            "You already reviewed this resource".to_string(),
                        ));
                    }

                    let model = review::ActiveModel {
                        id: Set(id),
                        resource_type: Set(input.resource_type),
                        resource_id: Set(input.resource_id.clone()),
                        author_id: Set(author),
                        rating: Set(input.rating),
                        comment: Set(input
                            .comment
                            .map(|c| c.trim().to_string())
                            .filter(|c| !c.is_empty())),
                        likes: Set(0),
                        dislikes: Set(0),
                        created_at: Set(now.into()),
                        updated_at: Set(now.into()),
                    };
                    let created = review_repo.create(txn, model).await?;

                    match input.resource_type {
                        ResourceKind::Restaurant => {
                            restaurant_repo
                                .apply_rating_create(txn, &input.resource_id, input.rating)
                                .await?;
                            refresh_ranking_score(txn, &restaurant_repo, &input.resource_id)
                                .await?;
                        }
                        ResourceKind::Dish => {
                            dish_repo
                                .apply_rating_create(txn, &input.resource_id, input.rating)
                                .await?;
                        }
                    }

                    Ok(created)
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        tracing::debug!(review_id = %created.id, resource_id = %created.resource_id, "Review created");
        Ok(created)
    }

    /// Update a review's rating and/or comment.
    ///
    /// Only the author or an admin may edit. A rating change carries its
    /// delta into the aggregate and, for restaurants, recomputes the
    /// ranking score in the same transaction.
    pub async fn update(
        &self,
        review_id: &str,
        actor: &Actor,
        input: UpdateReviewInput,
    ) -> AppResult<review::Model> {
        input.validate()?;

        let existing = self.review_repo.get_by_id(review_id).await?;
        if !actor.can_mutate(&existing.author_id) {
            return Err(AppError::Forbidden(
                "Only the author or an admin may edit a review".to_string(),
            ));
        }

        let delta = input.rating.map_or(0, |r| r - existing.rating);

        let review_repo = self.review_repo.clone();
        let restaurant_repo = self.restaurant_repo.clone();
        let dish_repo = self.dish_repo.clone();

        let updated = self
            .db
            .transaction::<_, review::Model, AppError>(move |txn| {
                Box::pin(async move {
                    let mut model = review::ActiveModel {
                        id: Set(existing.id.clone()),
                        updated_at: Set(Utc::now().into()),
                        ..Default::default()
                    };
                    if let Some(rating) = input.rating {
                        model.rating = Set(rating);
                    }
                    if let Some(comment) = input.comment {
                        let trimmed = comment.trim().to_string();
                        model.comment = Set(Some(trimmed).filter(|c| !c.is_empty()));
                    }
                    let updated = review_repo.update(txn, model).await?;

                    if delta != 0 {
                        match existing.resource_type {
                            ResourceKind::Restaurant => {
                                restaurant_repo
                                    .apply_rating_edit(txn, &existing.resource_id, delta)
                                    .await?;
                                refresh_ranking_score(txn, &restaurant_repo, &existing.resource_id)
                                    .await?;
                            }
                            ResourceKind::Dish => {
                                dish_repo
                                    .apply_rating_edit(txn, &existing.resource_id, delta)
                                    .await?;
                            }
                        }
                    }

                    Ok(updated)
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        tracing::debug!(review_id = %updated.id, delta, "Review updated");
        Ok(updated)
    }

    /// Remove a review.
    ///
    /// Deletes the review and its reactions, rolls the rating back out of
    /// the aggregate, and refreshes the restaurant score, all in one
    /// transaction.
    pub async fn remove(&self, review_id: &str, actor: &Actor) -> AppResult<()> {
        let existing = self.review_repo.get_by_id(review_id).await?;
        if !actor.can_mutate(&existing.author_id) {
            return Err(AppError::Forbidden(
                "Only the author or an admin may remove a review".to_string(),
            ));
        }

        let review_repo = self.review_repo.clone();
        let restaurant_repo = self.restaurant_repo.clone();
        let dish_repo = self.dish_repo.clone();
        let reaction_repo = self.reaction_repo.clone();

        self.db
            .transaction::<_, (), AppError>(move |txn| {
                Box::pin(async move {
                    let removed_reactions =
                        reaction_repo.delete_by_review(txn, &existing.id).await?;
                    review_repo.delete(txn, &existing.id).await?;

                    match existing.resource_type {
                        ResourceKind::Restaurant => {
                            restaurant_repo
                                .apply_rating_delete(txn, &existing.resource_id, existing.rating)
                                .await?;
                            refresh_ranking_score(txn, &restaurant_repo, &existing.resource_id)
                                .await?;
                        }
                        ResourceKind::Dish => {
                            dish_repo
                                .apply_rating_delete(txn, &existing.resource_id, existing.rating)
                                .await?;
                        }
                    }

                    tracing::debug!(
                        review_id = %existing.id,
                        removed_reactions,
                        "Review removed"
                    );
                    Ok(())
                })
            })
            .await
            .map_err(unwrap_txn_err)
    }

    /// Get reviews for a resource, newest first.
    pub async fn list_by_resource(
        &self,
        resource_type: ResourceKind,
        resource_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<review::Model>> {
        self.review_repo
            .find_by_resource(resource_type, resource_id, limit, until_id)
            .await
    }

    /// Count live reviews for a resource.
    pub async fn count_by_resource(
        &self,
        resource_type: ResourceKind,
        resource_id: &str,
    ) -> AppResult<u64> {
        self.review_repo
            .count_by_resource(resource_type, resource_id)
            .await
    }
}

/// Recompute and persist a restaurant's ranking score from its current
/// aggregate. Reads on the caller's transaction so the post-increment
/// counters are visible.
async fn refresh_ranking_score<C: ConnectionTrait>(
    conn: &C,
    restaurant_repo: &RestaurantRepository,
    restaurant_id: &str,
) -> AppResult<()> {
    let restaurant = restaurant_repo
        .find_by_id_in(conn, restaurant_id)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound(restaurant_id.to_string()))?;

    let score = ranking::compute_score(&RatingAggregate::new(
        restaurant.rating_count,
        restaurant.rating_sum,
    ));
    restaurant_repo
        .set_ranking_score(conn, restaurant_id, score)
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platerank_db::entities::restaurant;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_restaurant(id: &str, count: i32, sum: i32) -> restaurant::Model {
        restaurant::Model {
            id: id.to_string(),
            name: "La Tagliatella".to_string(),
            description: "Pasta place".to_string(),
            category_id: None,
            location: Some("Madrid".to_string()),
            proposed_by: "owner1".to_string(),
            approved: true,
            rating_count: count,
            rating_sum: sum,
            ranking_score: 0.0,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn create_test_review(id: &str, author_id: &str, rating: i32) -> review::Model {
        review::Model {
            id: id.to_string(),
            resource_type: ResourceKind::Restaurant,
            resource_id: "rest1".to_string(),
            author_id: author_id.to_string(),
            rating,
            comment: Some("Great pasta".to_string()),
            likes: 0,
            dislikes: 0,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn service_over(db: Arc<DatabaseConnection>) -> ReviewService {
        ReviewService::new(
            db.clone(),
            ReviewRepository::new(db.clone()),
            RestaurantRepository::new(db.clone()),
            DishRepository::new(db.clone()),
            ReactionRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_create_rejects_out_of_range_rating() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service_over(db);

        let result = service
            .create(
                "user1",
                CreateReviewInput {
                    resource_type: ResourceKind::Restaurant,
                    resource_id: "rest1".to_string(),
                    rating: 6,
                    comment: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_restaurant_not_approved() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<restaurant::Model>::new()])
                .into_connection(),
        );
        let service = service_over(db);

        let result = service
            .create(
                "user1",
                CreateReviewInput {
                    resource_type: ResourceKind::Restaurant,
                    resource_id: "rest1".to_string(),
                    rating: 4,
                    comment: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::ResourceNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_conflict_on_duplicate_review() {
        let restaurant = create_test_restaurant("rest1", 1, 4);
        let existing = create_test_review("rev1", "user1", 4);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[restaurant]])
                .append_query_results([[existing]])
                .into_connection(),
        );
        let service = service_over(db);

        let result = service
            .create(
                "user1",
                CreateReviewInput {
                    resource_type: ResourceKind::Restaurant,
                    resource_id: "rest1".to_string(),
                    rating: 2,
                    comment: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_commits_review_aggregate_and_score() {
        let restaurant = create_test_restaurant("rest1", 0, 0);
        let created = create_test_review("rev1", "user1", 4);
        let post_increment = create_test_restaurant("rest1", 1, 4);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[restaurant]])
                .append_query_results([Vec::<review::Model>::new()])
                .append_query_results([Vec::<review::Model>::new()])
                .append_query_results([[created]])
                .append_query_results([[post_increment]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );
        let service = service_over(db);

        let result = service
            .create(
                "user1",
                CreateReviewInput {
                    resource_type: ResourceKind::Restaurant,
                    resource_id: "rest1".to_string(),
                    rating: 4,
                    comment: Some("Great pasta".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(result.rating, 4);
        assert_eq!(result.likes, 0);
        assert_eq!(result.dislikes, 0);
    }

    #[tokio::test]
    async fn test_update_review_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<review::Model>::new()])
                .into_connection(),
        );
        let service = service_over(db);

        let actor = Actor {
            id: "user1".to_string(),
            role: Role::User,
        };
        let result = service
            .update(
                "nonexistent",
                &actor,
                UpdateReviewInput {
                    rating: Some(3),
                    comment: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::ReviewNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_forbidden_for_non_author() {
        let review = create_test_review("rev1", "user1", 4);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[review]])
                .into_connection(),
        );
        let service = service_over(db);

        let actor = Actor {
            id: "user2".to_string(),
            role: Role::User,
        };
        let result = service
            .update(
                "rev1",
                &actor,
                UpdateReviewInput {
                    rating: Some(1),
                    comment: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_rating_applies_delta_and_refreshes_score() {
        let existing = create_test_review("rev1", "user1", 4);
        let mut updated = create_test_review("rev1", "user1", 2);
        updated.updated_at = Utc::now().into();
        let post_edit = create_test_restaurant("rest1", 1, 2);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_query_results([[updated]])
                .append_query_results([[post_edit]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );
        let service = service_over(db);

        // Admin edits someone else's review
        let actor = Actor {
            id: "admin1".to_string(),
            role: Role::Admin,
        };
        let result = service
            .update(
                "rev1",
                &actor,
                UpdateReviewInput {
                    rating: Some(2),
                    comment: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(result.rating, 2);
    }

    #[tokio::test]
    async fn test_remove_forbidden_for_non_author() {
        let review = create_test_review("rev1", "user1", 4);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[review]])
                .into_connection(),
        );
        let service = service_over(db);

        let actor = Actor {
            id: "user2".to_string(),
            role: Role::User,
        };
        let result = service.remove("rev1", &actor).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_remove_cascades_reactions_and_rolls_back_aggregate() {
        let review = create_test_review("rev1", "user1", 4);
        let post_delete = create_test_restaurant("rest1", 0, 0);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[review]])
                .append_query_results([[post_delete]])
                .append_exec_results([
                    // reaction cascade
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 2,
                    },
                    // review delete
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    // aggregate rollback
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    // score refresh
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );
        let service = service_over(db);

        let actor = Actor {
            id: "user1".to_string(),
            role: Role::User,
        };
        service.remove("rev1", &actor).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_by_resource() {
        let r1 = create_test_review("rev1", "user1", 4);
        let r2 = create_test_review("rev2", "user2", 2);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r1, r2]])
                .into_connection(),
        );
        let service = service_over(db);

        let result = service
            .list_by_resource(ResourceKind::Restaurant, "rest1", 10, None)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
    }
}
