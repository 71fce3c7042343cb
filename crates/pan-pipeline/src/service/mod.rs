//! Service Layer
//!
//! Wires the domain stages onto one step timeline.

mod pipeline_service;

pub use pipeline_service::PanPipeline;
