//! # Integration Tests
//!
//! Whole records driven through `WideBus` and `NarrowBus` over the bundled
//! classification table.

pub mod flows;
pub mod scenarios;
