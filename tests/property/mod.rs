//! Property-based tests for ordering and partition guarantees

mod ordering;
