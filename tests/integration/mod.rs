//! Integration tests for the taleweaver story pipeline

mod config_integration;
mod retrieval;
pub mod test_utils;
