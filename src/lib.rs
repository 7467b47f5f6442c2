//! Taleweaver: long-form campaign stories from session notes
//!
//! A plan generator outlines the story, main-body chapters are written in parallel,
//! prologue and epilogue are written in a second parallel wave from the finished body,
//! and the sections are compiled back in plan order.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod run;
pub mod sources;
pub mod story;

pub use error::ApiError;
pub use story::{StoryOrchestrator, StoryOutcome, StoryRequest};
