//! Engine for a timed two-player word search: a shared letter board, a
//! sorted word list indexed by line offsets, and one [`MatchSession`] per
//! player that validates dragged paths and keeps score.
//!
//! [`MatchSession`]: models::MatchSession

pub mod config;
pub mod handlers;
pub mod models;
