//! liftplan - Personal strength training tracker
//!
//! A 52-week periodized program: the engine turns a calendar date into a
//! prescription per exercise, nudged by what was actually lifted recently.

pub mod analytics;
pub mod bot;
pub mod config;
pub mod db;
pub mod engine;
pub mod exercises;
pub mod schedule;
pub mod session;
pub mod timer;
pub mod tui;

pub use db::Database;
pub use engine::Program;
pub use session::WorkoutSession;
