//! Core data models for the online leaderboard.

mod games;
mod ids;
mod opponent;

pub use games::*;
pub use ids::*;
pub use opponent::*;
