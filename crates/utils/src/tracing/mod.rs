use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// Directive used when `RUST_LOG` is not set
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Initialize the tracing system
///
/// Reads the filter from `RUST_LOG`, falling back to `info`, and writes
/// compact lines to stderr.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    init_with_default(DEFAULT_DIRECTIVE)
}

/// Initialize the tracing system with `directive` as the fallback filter
pub fn init_with_default(
    directive: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(directive))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Create a span for an authorization decision
pub fn decision_span(namespace: &str, resource: &str, operation: &str) -> Span {
    span!(
        Level::INFO,
        "decision",
        namespace = %namespace,
        resource = %resource,
        operation = %operation
    )
}

/// Emit a structured event for a decision outcome
pub fn decision_outcome(allowed: bool) {
    if allowed {
        info!("decision_allowed");
    } else {
        info!("decision_denied");
    }
}
