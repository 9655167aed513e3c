//! Integration tests for pyrblend crates.
//!
//! These tests run the full file pipeline: encode inputs to disk, load them
//! through `pyrblend-io`, blend with `pyrblend-ops` and write the result back.
