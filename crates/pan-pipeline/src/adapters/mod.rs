//! Adapters Layer
//!
//! Wire encodings that drive the pipeline, and the table sources it loads
//! from.
//!
//! ## Adapters
//!
//! - `WideBus` - one field per signal, one word per cycle
//! - `NarrowBus` - byte-multiplexed pins with an 8-cycle token drain
//! - `TokenReassembler` - rebuilds the drained token by byte index
//! - `FileTableSource` / `BundledTableSource` - classification table sources

pub mod narrow;
pub mod table_file;
pub mod wide;

pub use narrow::{encode_digit, NarrowBus, NarrowOutput, ReassemblyEvent, TokenReassembler};
pub use table_file::{load_configured_table, BundledTableSource, FileTableSource};
pub use wide::{WideBus, WideInput, WideOutput};
