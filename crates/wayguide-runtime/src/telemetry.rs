//! Subscriber setup for hosts that embed the guidance core.
//!
//! The core itself only emits `tracing` events: state transitions at `info`,
//! outlier and re-plan decisions at `debug`/`trace`, and one `trace` span per
//! [`FrameLoop::tick`][crate::FrameLoop::tick].  [`init_tracing`] decides
//! where they go:
//!
//! - `RUST_LOG` filters as usual (default `info`; `wayguide_runtime=trace`
//!   shows every frame).
//! - `WAYGUIDE_LOG_FORMAT=json` switches stdout to one JSON object per line.
//! - `OTEL_EXPORTER_OTLP_ENDPOINT` additionally ships spans over OTLP/HTTP,
//!   so a slow frame can be inspected in any OTLP-compatible trace viewer.
//!
//! ```rust,no_run
//! let _telemetry = wayguide_runtime::telemetry::init_tracing("wayguide");
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Console output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_setting(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Install the global subscriber.  Keep the returned guard alive until the
/// process exits; dropping it flushes exported spans.
///
/// Calling this twice leaves the first subscriber in place and reports the
/// conflict on stderr.
pub fn init_tracing(service_name: &str) -> TracerProviderGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format = LogFormat::from_setting(std::env::var("WAYGUIDE_LOG_FORMAT").ok().as_deref());
    let provider = otlp_provider(
        service_name,
        std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok().as_deref(),
    );

    let console = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer().compact().boxed(),
    };
    let spans = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("wayguide")));

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(spans)
        .try_init()
    {
        eprintln!("[wayguide] tracing already initialised: {e}");
    }

    TracerProviderGuard(provider)
}

/// Flushes and shuts down the span exporter on drop.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl TracerProviderGuard {
    /// Whether spans are being exported over OTLP.
    pub fn is_exporting(&self) -> bool {
        self.0.is_some()
    }
}

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        if let Some(Err(e)) = self.0.take().map(|p| p.shutdown()) {
            eprintln!("[wayguide] span exporter shutdown failed: {e}");
        }
    }
}

/// OTLP/HTTP provider for `endpoint`, or `None` when no endpoint is
/// configured or the exporter cannot be built.
fn otlp_provider(service_name: &str, endpoint: Option<&str>) -> Option<SdkTracerProvider> {
    let endpoint = endpoint.map(str::trim).filter(|e| !e.is_empty())?;

    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
    {
        Ok(exporter) => exporter,
        Err(e) => {
            eprintln!("[wayguide] OTLP exporter for {endpoint} unavailable: {e}");
            return None;
        }
    };

    // Frames are ticked on the host's thread with no async runtime, so spans
    // go out through the synchronous exporter.
    Some(
        SdkTracerProvider::builder()
            .with_resource(
                Resource::builder()
                    .with_service_name(service_name.to_string())
                    .build(),
            )
            .with_simple_exporter(exporter)
            .build(),
    )
}
