#![forbid(unsafe_code)]

//! Subscriber installation for applications embedding Cardfan.
//!
//! Library code only emits `tracing` events; nothing is printed until the
//! host installs a subscriber. These helpers build a `tracing-subscriber`
//! formatter filtered by `RUST_LOG` (falling back to `default_filter`) and
//! optionally install it globally.

use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// A global subscriber could not be installed.
#[derive(Debug, Error)]
#[error("failed to install tracing subscriber: {0}")]
pub struct LoggingError(String);

fn filter(default_filter: &str) -> EnvFilter {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_from(directives.as_deref(), default_filter)
}

/// `directives` when set and parsable, otherwise `default_filter`.
fn filter_from(directives: Option<&str>, default_filter: &str) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(default_filter))
}

fn json_with<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_thread_names(true)
        .finish()
}

fn pretty_with<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_thread_names(true)
        .finish()
}

/// JSON-lines subscriber writing to stderr.
#[must_use]
pub fn json_subscriber(default_filter: &str) -> impl Subscriber + Send + Sync + 'static {
    json_with(filter(default_filter), std::io::stderr)
}

/// Human-readable subscriber writing to stderr.
#[must_use]
pub fn pretty_subscriber(default_filter: &str) -> impl Subscriber + Send + Sync + 'static {
    pretty_with(filter(default_filter), std::io::stderr)
}

/// Install [`json_subscriber`] as the global default.
///
/// # Errors
///
/// Fails if a global subscriber is already set.
pub fn init_json_logging(default_filter: &str) -> Result<(), LoggingError> {
    tracing::subscriber::set_global_default(json_subscriber(default_filter))
        .map_err(|e| LoggingError(e.to_string()))
}

/// Install [`pretty_subscriber`] as the global default.
///
/// # Errors
///
/// Fails if a global subscriber is already set.
pub fn init_pretty_logging(default_filter: &str) -> Result<(), LoggingError> {
    tracing::subscriber::set_global_default(pretty_subscriber(default_filter))
        .map_err(|e| LoggingError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// In-memory writer shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn emit_debug_and_warn() {
        tracing::debug!("quiet detail");
        tracing::warn!("loud problem");
    }

    #[test]
    fn warn_default_drops_debug_events() {
        let out = Captured::default();
        let subscriber = pretty_with(filter_from(None, "warn"), out.clone());
        tracing::subscriber::with_default(subscriber, emit_debug_and_warn);
        let text = out.text();
        assert!(text.contains("loud problem"));
        assert!(!text.contains("quiet detail"));
    }

    #[test]
    fn env_directives_override_default() {
        let out = Captured::default();
        let subscriber = pretty_with(filter_from(Some("debug"), "warn"), out.clone());
        tracing::subscriber::with_default(subscriber, emit_debug_and_warn);
        let text = out.text();
        assert!(text.contains("quiet detail"));
        assert!(text.contains("loud problem"));
    }

    #[test]
    fn unparsable_or_blank_env_falls_back_to_default() {
        for directives in ["not a [valid filter", "   "] {
            let out = Captured::default();
            let subscriber = pretty_with(filter_from(Some(directives), "warn"), out.clone());
            tracing::subscriber::with_default(subscriber, emit_debug_and_warn);
            let text = out.text();
            assert!(text.contains("loud problem"), "{directives:?}");
            assert!(!text.contains("quiet detail"), "{directives:?}");
        }
    }

    #[test]
    fn json_lines_carry_level_and_fields() {
        let out = Captured::default();
        let subscriber = json_with(filter_from(None, "info"), out.clone());
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(count = 3, "json event");
            tracing::debug!("filtered");
        });
        let text = out.text();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 1, "{text}");
        assert!(lines[0].starts_with('{') && lines[0].ends_with('}'));
        assert!(lines[0].contains(r#""level":"INFO""#));
        assert!(lines[0].contains(r#""message":"json event""#));
        assert!(lines[0].contains(r#""count":3"#));
    }
}
