//! Reaction service.
//!
//! Maintains each user's like/dislike state per review and the
//! denormalized counters on the review. The existing-reaction read and
//! every write share one transaction, so a rapid double-click from the
//! same user cannot double-count.

use std::sync::Arc;

use chrono::Utc;
use platerank_common::{AppError, AppResult, IdGenerator};
use platerank_db::{
    entities::reaction::{self, ReactionKind},
    repositories::{ReactionRepository, ReviewRepository},
};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};

use crate::services::unwrap_txn_err;

/// A requested reaction change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionRequest {
    /// Like the review.
    Like,
    /// Dislike the review.
    Dislike,
    /// Withdraw any existing reaction.
    Remove,
}

impl ReactionRequest {
    const fn as_kind(self) -> Option<ReactionKind> {
        match self {
            Self::Like => Some(ReactionKind::Like),
            Self::Dislike => Some(ReactionKind::Dislike),
            Self::Remove => None,
        }
    }
}

/// How a reaction request landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionOutcome {
    /// A new reaction was recorded.
    Added,
    /// An existing reaction flipped between like and dislike.
    Switched,
    /// An existing reaction was withdrawn.
    Removed,
    /// The request matched the current state; nothing changed.
    Unchanged,
}

/// Reaction service for business logic.
#[derive(Clone)]
pub struct ReactionService {
    db: Arc<DatabaseConnection>,
    reaction_repo: ReactionRepository,
    review_repo: ReviewRepository,
    id_gen: IdGenerator,
}

impl ReactionService {
    /// Create a new reaction service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        reaction_repo: ReactionRepository,
        review_repo: ReviewRepository,
    ) -> Self {
        Self {
            db,
            reaction_repo,
            review_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Apply a like/dislike/remove request to a review.
    ///
    /// Idempotent: repeating the current state is a no-op. A user holds at
    /// most one reaction per review; switching adjusts both counters in a
    /// single UPDATE.
    pub async fn react(
        &self,
        user_id: &str,
        review_id: &str,
        request: ReactionRequest,
    ) -> AppResult<ReactionOutcome> {
        let review = self.review_repo.get_by_id(review_id).await?;
        if review.author_id == user_id {
            return Err(AppError::Forbidden(
                "Cannot react to your own review".to_string(),
            ));
        }

        let reaction_repo = self.reaction_repo.clone();
        let review_repo = self.review_repo.clone();
        let user = user_id.to_string();
        let review_id = review.id.clone();
        let id = self.id_gen.generate();

        let outcome = self
            .db
            .transaction::<_, ReactionOutcome, AppError>(move |txn| {
                Box::pin(async move {
                    let existing = reaction_repo
                        .find_by_user_and_review(txn, &user, &review_id)
                        .await?;

                    let outcome = match (existing, request.as_kind()) {
                        // Nothing to withdraw
                        (None, None) => ReactionOutcome::Unchanged,

                        (None, Some(kind)) => {
                            let model = reaction::ActiveModel {
                                id: Set(id),
                                review_id: Set(review_id.clone()),
                                user_id: Set(user),
                                kind: Set(kind),
                                created_at: Set(Utc::now().into()),
                                updated_at: Set(None),
                            };
                            reaction_repo.create(txn, model).await?;

                            let (likes, dislikes) = unit_deltas(kind);
                            review_repo
                                .adjust_reaction_counts(txn, &review_id, likes, dislikes)
                                .await?;
                            ReactionOutcome::Added
                        }

                        (Some(current), None) => {
                            reaction_repo.delete(txn, &current.id).await?;

                            let (likes, dislikes) = unit_deltas(current.kind);
                            review_repo
                                .adjust_reaction_counts(txn, &review_id, -likes, -dislikes)
                                .await?;
                            ReactionOutcome::Removed
                        }

                        (Some(current), Some(kind)) if current.kind == kind => {
                            ReactionOutcome::Unchanged
                        }

                        (Some(current), Some(kind)) => {
                            reaction_repo.set_kind(txn, &current.id, kind).await?;

                            let (new_likes, new_dislikes) = unit_deltas(kind);
                            let (old_likes, old_dislikes) = unit_deltas(current.kind);
                            review_repo
                                .adjust_reaction_counts(
                                    txn,
                                    &review_id,
                                    new_likes - old_likes,
                                    new_dislikes - old_dislikes,
                                )
                                .await?;
                            ReactionOutcome::Switched
                        }
                    };

                    Ok(outcome)
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        tracing::debug!(review_id = %review.id, outcome = ?outcome, "Reaction processed");
        Ok(outcome)
    }

    /// Get reactions on a review (paginated).
    pub async fn list_for_review(
        &self,
        review_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<reaction::Model>> {
        self.reaction_repo
            .find_by_review(review_id, limit, until_id)
            .await
    }

    /// Count reactions of one kind on a review.
    pub async fn count_for_review(
        &self,
        review_id: &str,
        kind: ReactionKind,
    ) -> AppResult<u64> {
        self.reaction_repo
            .count_by_review_and_kind(review_id, kind)
            .await
    }
}

/// Counter contribution of one reaction: (likes, dislikes).
const fn unit_deltas(kind: ReactionKind) -> (i32, i32) {
    match kind {
        ReactionKind::Like => (1, 0),
        ReactionKind::Dislike => (0, 1),
    }
}
