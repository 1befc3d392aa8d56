//! JSON log lines: one JSON object per line (ndjson) for ingestion and audit.

use chrono::Utc;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Envelope for one report line: timestamp, report kind, then the payload's own fields.
#[derive(Serialize)]
pub struct ReportLine<'a, T: Serialize> {
    pub ts: String,
    pub kind: &'a str,
    #[serde(flatten)]
    pub payload: &'a T,
}

impl<'a, T: Serialize> ReportLine<'a, T> {
    pub fn new(kind: &'a str, payload: &'a T) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            kind,
            payload,
        }
    }
}

/// Tracing setup for the CLI, plus the ndjson writer for report lines.
pub struct StructuredLogger;

impl StructuredLogger {
    /// Install the global subscriber on stderr; stdout is reserved for report lines.
    /// `RUST_LOG` overrides `default_level`. A second call is a no-op.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let base = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::NONE);
        let registry = tracing_subscriber::registry().with(filter);
        let _ = if json {
            registry.with(base.json().flatten_event(true)).try_init()
        } else {
            registry.with(base.with_target(false)).try_init()
        };
    }

    /// Emit a single structured line (e.g. for a risk result) without going through tracing
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) {
        if let Ok(line) = serde_json::to_string(event) {
            let _ = writeln!(w, "{}", line);
        }
    }
}
