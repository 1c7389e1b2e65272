//! Test support shared by the glaze crates.
//!
//! The [`Fuzzer`] produces reproducible random lists and list edits so
//! randomized tests can be replayed from a printed seed.

pub mod fuzzer;

pub use fuzzer::{Edit, Fuzzer};
