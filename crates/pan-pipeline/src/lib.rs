//! # PAN Pipeline
//!
//! Digit-serial PAN ingestion: framing, Luhn validation, BIN classification
//! and nonce-bound tokenization, driven through a wide or a byte-multiplexed
//! bus.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `DigitFramer`: capture state machine
//!   - `luhn`: mod-10 checksum
//!   - `BinTable` / `BinClassifier`: prefix lookup with 6-over-4 precedence
//!   - `Tokenizer`: nonce latch and fire-once gate
//!   - `PipelineConfig`: configuration with validation
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `PanIngestApi`: Driving port (one step per cycle)
//!   - `TokenSink`, `BinTableSource`: Driven ports
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `PanPipeline`: Implements `PanIngestApi`
//!
//! - **Adapters Layer** (`adapters/`): Wire encodings and table sources
//!
//! ## Invariants
//!
//! - Classification and tokenization run only for Luhn-valid records.
//! - A latched nonce is consumed by exactly one tokenization.
//! - Derived results never outlive their record.
//!
//! ## Usage Example
//!
//! ```ignore
//! use pan_pipeline::{load_configured_table, PanPipeline, PipelineConfig, WideBus};
//! use pan_crypto::TokenNonce;
//!
//! let config = PipelineConfig::from_env()?;
//! let (table, _) = load_configured_table(&config)?;
//! let mut bus = WideBus::new(PanPipeline::new(config, table)?);
//!
//! let out = bus.send_pan(&[4, 0, 2, 9, 1, 6, 3, 7, 7, 8, 2, 6, 5, 4, 1, 8],
//!                        Some(&TokenNonce::generate()));
//! assert!(out.luhn_valid && out.token_valid);
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{
    encode_digit, load_configured_table, BundledTableSource, FileTableSource, NarrowBus,
    NarrowOutput, ReassemblyEvent, TokenReassembler, WideBus, WideInput, WideOutput,
};
pub use domain::{
    check_digit, luhn_valid, tokenize, BinClassifier, BinEntry, BinTable, DigitFramer,
    DrainOrder, FramerState, KeyWidth, LoadReport, PipelineConfig, PipelineConfigBuilder,
    Tokenizer,
};
pub use error::{ConfigError, PipelineError, TableError};
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{
    BinTableSource, NullSink, PanIngestApi, PipelineInput, PipelineSnapshot, TokenSink,
};
pub use service::PanPipeline;
