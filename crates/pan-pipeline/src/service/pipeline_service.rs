//! PAN Pipeline Service
//!
//! Orchestrates the framer, Luhn validator, classifier and tokenizer on a
//! single step timeline and implements the `PanIngestApi` port.
//!
//! Order within one step:
//! 1. abort
//! 2. nonce latch
//! 3. framer event (clears results on `start` or a protocol violation)
//! 4. Luhn and classification, if the record completed this step
//! 5. tokenization, if a Luhn-valid record and a nonce are both present

use std::sync::Arc;
use std::time::Instant;

use pan_types::{ClassificationResult, RecordFault, TokenResult};

use crate::domain::{
    luhn, BinClassifier, BinTable, DigitFramer, FramerState, PipelineConfig, Tokenizer,
};
use crate::error::PipelineError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{NullSink, PanIngestApi, PipelineInput, PipelineSnapshot, TokenSink};

/// PAN pipeline implementation
///
/// Owns the single in-flight record. All derived results are registered
/// here and read back through `snapshot()`.
pub struct PanPipeline {
    config: PipelineConfig,
    framer: DigitFramer,
    classifier: BinClassifier,
    tokenizer: Tokenizer,
    luhn_valid: bool,
    classification: ClassificationResult,
    token: Option<TokenResult>,
    fault: Option<RecordFault>,
    sink: Arc<dyn TokenSink>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl PanPipeline {
    /// Create a pipeline over a loaded table.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the configuration does not validate.
    pub fn new(config: PipelineConfig, table: Arc<BinTable>) -> Result<Self, PipelineError> {
        config.validate()?;

        let key = config.token_key();
        if key.is_insecure_default() {
            tracing::warn!("Token key is the all-zero development key; set PAN_TOKEN_SECRET");
        }

        tracing::info!(
            key_width = ?config.key_width,
            table_entries = table.len(),
            "PAN pipeline created"
        );

        Ok(Self {
            classifier: BinClassifier::new(table, config.key_width),
            tokenizer: Tokenizer::new(key),
            config,
            framer: DigitFramer::new(),
            luhn_valid: false,
            classification: ClassificationResult::SUPPRESSED,
            token: None,
            fault: None,
            sink: Arc::new(NullSink),
            metrics: Arc::new(NoOpMetrics),
        })
    }

    /// Deliver issued tokens to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn TokenSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Report stage events to `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &BinClassifier {
        &self.classifier
    }

    /// The recorder adapters report bus-level events to.
    pub fn metrics(&self) -> &Arc<dyn MetricsRecorder> {
        &self.metrics
    }

    fn clear_results(&mut self) {
        self.luhn_valid = false;
        self.classification = ClassificationResult::SUPPRESSED;
        self.token = None;
        self.fault = None;
        self.tokenizer.cancel();
    }

    fn abort(&mut self) {
        tracing::debug!(state = ?self.framer.state(), "Record aborted");
        self.framer.abort();
        self.clear_results();
    }

    /// Run Luhn and classification on the record that just completed.
    fn evaluate_record(&mut self) {
        let record = self.framer.record();
        self.metrics.record_completed(record.length());

        let fault = if !record.length_ok() {
            Some(RecordFault::LengthInvalid {
                length: record.length(),
            })
        } else if !record.digit_ok() {
            Some(RecordFault::DigitInvalid)
        } else if !luhn::evaluate(record) {
            Some(RecordFault::ChecksumInvalid)
        } else {
            None
        };

        self.luhn_valid = fault.is_none();
        self.classification = self.classifier.classify(record, self.luhn_valid);
        self.fault = fault;

        match fault {
            None => {
                self.metrics.record_classification(self.classification.hit);
                self.tokenizer.arm();
                tracing::debug!(
                    length = record.length(),
                    iin = ?record.iin().and_then(|p| p.key6()),
                    hit = self.classification.hit,
                    brand = ?self.classification.brand,
                    issuer = ?self.classification.issuer,
                    "Record classified"
                );
            }
            Some(fault) => {
                self.metrics.record_fault(&fault);
                tracing::debug!(
                    length = record.length(),
                    fault = fault.label(),
                    "Record suppressed"
                );
            }
        }
    }

    fn try_tokenize(&mut self) {
        let started = Instant::now();
        match self.tokenizer.try_fire(self.framer.record()) {
            Ok(Some(token)) => {
                self.metrics.record_token(started.elapsed());
                self.sink.deliver(&token, &self.classification);
                self.token = Some(token);
                tracing::debug!(tag = token.tag, "Token issued");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "Token derivation failed");
            }
        }
    }
}

impl PanIngestApi for PanPipeline {
    fn step(&mut self, input: PipelineInput) -> PipelineSnapshot {
        if input.abort {
            self.abort();
        }

        if let Some(nonce) = input.nonce {
            self.tokenizer.latch_nonce(nonce);
        }

        let transition = self.framer.step(input.event);

        if transition.started {
            self.clear_results();
        }

        if let Some(violation) = transition.violation {
            self.clear_results();
            let fault = RecordFault::Protocol(violation);
            self.metrics.record_fault(&fault);
            self.fault = Some(fault);
        }

        if transition.completed {
            self.evaluate_record();
        }

        self.try_tokenize();

        self.snapshot()
    }

    fn reset(&mut self) {
        self.framer.reset();
        self.tokenizer.reset();
        self.clear_results();
        tracing::debug!("Pipeline reset");
    }

    fn snapshot(&self) -> PipelineSnapshot {
        let record = self.framer.record();
        let state = self.framer.state();
        let ready = state == FramerState::Done && record.is_ready();

        PipelineSnapshot {
            state,
            length: record.length(),
            length_ok: ready && record.length_ok(),
            digit_ok: record.digit_ok(),
            error: state == FramerState::Error,
            ready,
            iin: record.iin(),
            luhn_valid: self.luhn_valid,
            classification: self.classification,
            token: self.token,
            token_pending: self.tokenizer.is_pending(),
            fault: self.fault,
        }
    }
}
