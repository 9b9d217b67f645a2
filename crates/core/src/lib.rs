//! Core business logic for platerank.

pub mod services;

pub use services::*;
