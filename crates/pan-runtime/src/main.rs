//! # PAN Runtime
//!
//! Drives PANs through the tokenization pipeline and prints one JSON object
//! per PAN on stdout. Logs go to stderr.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logging + Prometheus registry)
//! 2. Load `PipelineConfig` from the environment, apply flag overrides
//! 3. Load the classification table
//! 4. Build the pipeline behind the chosen bus
//! 5. Drive each PAN, waiting at most `token_timeout_steps` for its token
//!
//! ```text
//! pan-runtime --bus narrow --nonce 000102030405060708090a0b 4029163778265418
//! ```

mod prometheus_metrics;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use pan_crypto::TokenNonce;
use pan_pipeline::{
    load_configured_table, KeyWidth, MetricsRecorder, NarrowBus, PanIngestApi, PanPipeline,
    PipelineConfig, WideBus,
};
use pan_telemetry::{encode_metrics, init_telemetry, log_event, TelemetryConfig};
use pan_types::{Brand, CardType, Issuer};

use crate::prometheus_metrics::PrometheusMetrics;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BusKind {
    /// One field per signal
    Wide,
    /// Byte-multiplexed pins with a streamed token
    Narrow,
}

/// PAN Runtime: frame, validate, classify and tokenize card numbers
#[derive(Parser, Debug)]
#[command(name = "pan-runtime")]
#[command(about = "Frame, validate, classify and tokenize PANs")]
struct Args {
    /// Bus encoding used to drive the pipeline
    #[arg(long, value_enum, default_value_t = BusKind::Wide)]
    bus: BusKind,

    /// Classification table CSV (overrides PAN_TABLE_PATH)
    #[arg(long)]
    table: Option<PathBuf>,

    /// 96-bit nonce as 24 hex characters, reused for every PAN (random per PAN if omitted)
    #[arg(long)]
    nonce: Option<String>,

    /// Table key width: 4, 6 or both (overrides PAN_KEY_WIDTH)
    #[arg(long)]
    key_width: Option<String>,

    /// Refuse to run on the development token key
    #[arg(long)]
    production: bool,

    /// Dump Prometheus metrics to stderr before exiting
    #[arg(long)]
    metrics: bool,

    /// PANs to process. Spaces and dashes are ignored; hex nibbles A-F are
    /// sent as out-of-range digits.
    #[arg(required = true)]
    pans: Vec<String>,
}

/// Per-PAN output line
#[derive(Debug, Serialize)]
struct PanReport {
    bus: &'static str,
    length: u8,
    length_ok: bool,
    digit_ok: bool,
    error_flag: bool,
    pan_ready: bool,
    luhn_valid: bool,
    meta_valid: bool,
    meta_hit: bool,
    brand: Brand,
    card_type: CardType,
    issuer: Issuer,
    token: Option<String>,
    tag: Option<String>,
    fault: Option<String>,
    timed_out: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let _telemetry =
        init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let mut config = PipelineConfig::from_env().context("Invalid pipeline configuration")?;
    if let Some(path) = &args.table {
        config.table_path = Some(path.clone());
    }
    if let Some(width) = &args.key_width {
        config.key_width = KeyWidth::parse(width)?;
    }
    if args.production {
        config
            .validate_for_production()
            .context("Configuration is not production ready")?;
    }

    let nonce = args.nonce.as_deref().map(parse_nonce).transpose()?;
    let pans = args
        .pans
        .iter()
        .map(|raw| parse_pan(raw))
        .collect::<Result<Vec<_>>>()?;

    let (table, _) =
        load_configured_table(&config).context("Failed to load classification table")?;

    let metrics: Arc<dyn MetricsRecorder> = Arc::new(PrometheusMetrics);
    let pipeline = PanPipeline::new(config, table)
        .context("Failed to create pipeline")?
        .with_metrics(metrics.clone());

    let timeout = pipeline.config().token_timeout_steps;
    let drain_order = pipeline.config().drain_order;
    let classifier = pipeline.classifier();
    log_event!(
        info,
        "runtime",
        "Pipeline ready",
        bus = ?args.bus,
        key_width = ?classifier.key_width(),
        table_entries = classifier.table().len(),
        pans = pans.len()
    );

    let reports: Vec<PanReport> = match args.bus {
        BusKind::Wide => {
            let mut bus = WideBus::new(pipeline);
            pans.iter()
                .map(|pan| run_wide(&mut bus, pan, nonce, timeout))
                .collect()
        }
        BusKind::Narrow => {
            let mut bus = NarrowBus::new(pipeline, drain_order).with_metrics(metrics);
            pans.iter()
                .map(|pan| run_narrow(&mut bus, pan, nonce, timeout))
                .collect()
        }
    };

    for report in &reports {
        println!("{}", serde_json::to_string(report)?);
    }

    if args.metrics {
        eprintln!("{}", encode_metrics()?);
    }

    Ok(())
}

fn run_wide(
    bus: &mut WideBus<PanPipeline>,
    pan: &[u8],
    nonce: Option<TokenNonce>,
    timeout: u32,
) -> PanReport {
    let nonce = nonce.unwrap_or_else(TokenNonce::generate);
    let mut out = bus.send_pan(pan, Some(&nonce));

    let mut timed_out = false;
    if out.luhn_valid && !out.token_valid {
        match bus.wait_for_token(timeout) {
            Some(done) => out = done,
            None => timed_out = true,
        }
    }

    let fault = bus.pipeline().snapshot().fault;
    PanReport {
        bus: "wide",
        length: out.len_final,
        length_ok: out.length_ok,
        digit_ok: out.digit_ok,
        error_flag: out.error_flag,
        pan_ready: out.pan_ready,
        luhn_valid: out.luhn_valid,
        meta_valid: out.meta_valid,
        meta_hit: out.meta_hit,
        brand: Brand::from_id(out.brand_id),
        card_type: CardType::from_id(out.type_id),
        issuer: Issuer::from_id(out.issuer_id),
        token: out.token_valid.then(|| format!("{:016x}", out.token64)),
        tag: out.token_valid.then(|| format!("{:04x}", out.token_tag16)),
        fault: fault.map(|f| f.to_string()),
        timed_out,
    }
}

fn run_narrow(
    bus: &mut NarrowBus<PanPipeline>,
    pan: &[u8],
    nonce: Option<TokenNonce>,
    timeout: u32,
) -> PanReport {
    let nonce = nonce.unwrap_or_else(TokenNonce::generate);
    let out = bus.send_pan(pan, Some(&nonce));

    // Length and fault are not on the pins; read them from the pipeline.
    let snapshot = bus.pipeline().snapshot();

    let (token, timed_out) = if out.luhn_valid() {
        match bus.collect_token(timeout) {
            Some(token) => (Some(token), false),
            None => (None, true),
        }
    } else {
        (None, false)
    };

    PanReport {
        bus: "narrow",
        length: snapshot.length,
        length_ok: out.length_ok(),
        digit_ok: out.digit_ok(),
        error_flag: out.error_flag(),
        pan_ready: out.pan_ready(),
        luhn_valid: out.luhn_valid(),
        meta_valid: out.meta_valid(),
        meta_hit: out.meta_hit(),
        brand: out.brand(),
        card_type: out.card_type(),
        issuer: out.issuer(),
        token: token.map(|t| format!("{t:016x}")),
        tag: None,
        fault: snapshot.fault.map(|f| f.to_string()),
        timed_out,
    }
}

/// Parse a PAN argument into nibble values.
fn parse_pan(raw: &str) -> Result<Vec<u8>> {
    let digits = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .map(|c| {
            c.to_digit(16)
                .map(|d| d as u8)
                .with_context(|| format!("Invalid character {c:?} in PAN argument"))
        })
        .collect::<Result<Vec<u8>>>()?;

    if digits.is_empty() {
        bail!("Empty PAN argument");
    }
    Ok(digits)
}

fn parse_nonce(raw: &str) -> Result<TokenNonce> {
    let bytes = hex::decode(raw.trim()).context("Nonce is not valid hex")?;
    Ok(TokenNonce::from_slice(&bytes)?)
}
