//! Domain layer: pure pipeline stages with no I/O.

pub mod classifier;
pub mod config;
pub mod framer;
pub mod luhn;
pub mod table;
pub mod tokenizer;

pub use classifier::BinClassifier;
pub use config::{
    DrainOrder, KeyWidth, PipelineConfig, PipelineConfigBuilder, DEFAULT_TOKEN_TIMEOUT_STEPS,
};
pub use framer::{DigitFramer, FramerState, FramerTransition};
pub use luhn::{check_digit, luhn_valid};
pub use table::{BinEntry, BinTable, LoadReport};
pub use tokenizer::{tokenize, Tokenizer};
