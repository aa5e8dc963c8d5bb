//! Tracing initialisation and the span/event vocabulary of a run

use rivet_core::RIVET_LOG_VAR;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// Default filter directive for a `-v` count
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize the tracing system
///
/// `RIVET_LOG` takes precedence over the verbosity-derived level. Output goes
/// to stderr so stdout stays reserved for plans, summaries and metadata.
pub fn init(verbosity: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_env(RIVET_LOG_VAR)
        .or_else(|_| EnvFilter::try_new(default_directive(verbosity)))?;

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

/// Check if stderr is attached to a terminal
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Create a span for the entire run
pub fn run_span(planned: usize) -> Span {
    span!(Level::INFO, "run", planned = %planned)
}

/// Create a span for one target
pub fn target_span(name: &str) -> Span {
    span!(Level::INFO, "target", target_name = %name)
}

/// Emit a structured event when a target body starts
pub fn target_started(target_name: &str) {
    info!(target_name = %target_name, "target_started");
}

/// Emit a structured event for target completion
pub fn target_completed(target_name: &str, duration_ms: u64, success: bool) {
    if success {
        info!(
            target_name = %target_name,
            duration_ms = %duration_ms,
            "target_completed"
        );
    } else {
        error!(
            target_name = %target_name,
            duration_ms = %duration_ms,
            "target_failed"
        );
    }
}

/// Emit a structured event for a skipped target
pub fn target_skipped(target_name: &str, reason: &str) {
    info!(target_name = %target_name, reason = %reason, "target_skipped");
}

/// Emit a structured event for an aborted target
pub fn target_aborted(target_name: &str, reason: &str) {
    warn!(target_name = %target_name, reason = %reason, "target_aborted");
}

/// Format duration for display
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs == 0 {
        format!("{millis}ms")
    } else if total_secs < 60 {
        format!("{}.{}s", total_secs, millis / 100)
    } else {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{mins}m{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_directive(0), "info");
        assert_eq!(default_directive(1), "debug");
        assert_eq!(default_directive(5), "trace");
    }

    #[test]
    fn durations_are_compact() {
        assert_eq!(format_duration(Duration::from_millis(42)), "42ms");
        assert_eq!(format_duration(Duration::from_millis(2_350)), "2.3s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m5s");
    }
}
