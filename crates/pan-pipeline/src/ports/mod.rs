//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - the step API the bus adapters call
//! - Driven Ports (outbound) - table sources and token consumers

pub mod inbound;
pub mod outbound;

pub use inbound::{PanIngestApi, PipelineInput, PipelineSnapshot};
pub use outbound::{BinTableSource, NullSink, TokenSink};
