use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Workspace crate targets whose level is raised by [`env_filter_with_level`].
pub const WORKSPACE_TARGETS: &[&str] = &["ai_llm_service", "rag_store", "contextor", "drive_rag"];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Compact formatting layer writing to **stderr**, so answers printed on
/// stdout stay clean.
///
/// - RFC3339 UTC timestamps
/// - level + target, no file/line
/// - ANSI colors only when stderr is a terminal
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stderr().is_terminal();

    fmt::layer()
        .with_writer(io::stderr)
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_ansi(use_ansi)
        .event_format(fmt::format().compact())
}

/// Builds `target=level` directives for every workspace crate.
pub fn level_directives(level: Level) -> Result<Vec<Directive>, ParseError> {
    let lvl = level.as_str().to_lowercase();
    WORKSPACE_TARGETS
        .iter()
        .map(|t| Directive::from_str(&format!("{t}={lvl}")))
        .collect()
}

/// `EnvFilter` from `RUST_LOG` or `default`, with workspace crates at `level`.
///
/// `RUST_LOG` wins when set; the per-crate directives only apply on fallback.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let mut filter = EnvFilter::new(default);
    if let Ok(directives) = level_directives(level) {
        for d in directives {
            filter = filter.add_directive(d);
        }
    }
    filter
}
