//! Tracing setup for the CLI.
//!
//! Library crates log through `log`; the subscriber installed here picks
//! those records up too. With `--timing`, every `#[instrument]`ed command
//! reports its duration when its span closes.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Installs the global subscriber. `RUST_LOG` still takes precedence.
pub fn init_tracing(verbose: bool, timing: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else if timing {
        // Span close events are logged at INFO
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let span_events = if timing {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_level(true)
                .with_span_events(span_events)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
