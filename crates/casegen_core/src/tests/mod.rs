//! Behavioural tests for the sweep engine
//!
//! Tests are organized by topic:
//! - `variables` - Value generation for range and discrete fields
//! - `batch` - Batch size, ordering and indexing
//! - `manifest` - Manifest layout and determinism

mod batch;
