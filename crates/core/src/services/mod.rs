//! Business logic services.

#![allow(missing_docs)]

pub mod ranking;
pub mod reaction;
pub mod review;

pub use ranking::{RatingAggregate, compute_score};
pub use reaction::{ReactionOutcome, ReactionRequest, ReactionService};
pub use review::{Actor, CreateReviewInput, ReviewService, Role, UpdateReviewInput};

use platerank_common::AppError;
use sea_orm::TransactionError;

/// Map a sea-orm transaction error back into the application error space.
/// An inner application error passes through; a connection-level failure
/// means the unit of work rolled back and surfaces as `TransactionAborted`,
/// left to the caller to retry.
pub(crate) fn unwrap_txn_err(err: TransactionError<AppError>) -> AppError {
    match err {
        TransactionError::Connection(db) => AppError::TransactionAborted(db.to_string()),
        TransactionError::Transaction(app) => app,
    }
}
