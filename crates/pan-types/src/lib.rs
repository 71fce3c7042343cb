//! # PAN Types Crate
//!
//! Record, event and result types shared by every stage of the PAN pipeline.
//!
//! ## Design Principles
//!
//! - **Fixed-size state**: a `PanRecord` never allocates; digits live in a
//!   19-slot array and the IIN prefix is a packed 24-bit register.
//! - **Stable IDs**: `Brand`, `CardType` and `Issuer` carry fixed numeric
//!   discriminants that appear on the wire.
//! - **Faults are values**: per-record failures are reported as
//!   `RecordFault`, never as a pipeline-level error.

pub mod entities;
pub mod errors;
pub mod results;

pub use entities::*;
pub use errors::*;
pub use results::*;
