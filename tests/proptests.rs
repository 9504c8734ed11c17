//! Property-based tests for sharevault
//!
//! This test suite uses quickcheck to verify correctness across random inputs,
//! including random secrets, node counts, and share selections.
//!
//! Run with: cargo test --test proptests

#[path = "proptests/codec.rs"]
mod codec;

#[path = "proptests/envelope.rs"]
mod envelope;
