//! # PAN Pipeline Test Suite
//!
//! Cross-crate tests driven through the public bus adapters.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Fixtures and the step-bounded driver
//! ├── integration/      # Scenarios, control flows, narrow vs wide
//! └── properties/       # proptest properties over arbitrary digit streams
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p pan-tests
//!
//! # By category
//! cargo test -p pan-tests integration::
//! cargo test -p pan-tests properties::
//!
//! # Benchmarks
//! cargo bench -p pan-tests
//! ```

#[cfg(test)]
pub mod harness;
pub mod integration;
pub mod properties;
