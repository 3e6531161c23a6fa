//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Keep large payloads out of log lines
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level when present

use std::borrow::Cow;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber. Calling it twice is harmless.
pub fn init_logging(config: &ObservabilityConfig) {
    let default_filter = format!(
        "netrelay={level},tower_http={level}",
        level = config.log_level
    );

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
pub fn preview(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(format!("{}...(truncated, {} bytes total)", &text[..cut], text.len())),
        None => Cow::Borrowed(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_is_untouched() {
        assert!(matches!(preview("hello", 5), Cow::Borrowed("hello")));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let text = "héllo wörld";
        assert_eq!(preview(text, 2), "hé...(truncated, 13 bytes total)");
    }
}
