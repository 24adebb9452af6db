//! Tracing setup for the CLI.
//!
//! Library crates log through `log`; the subscriber's log bridge forwards those records,
//! so `RUST_LOG=roster_business=debug` works the same as for the CLI's own spans.
//! With `--timing`, spans from `#[instrument]` log their duration on close.

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

const DEFAULT_FILTER: &str = "warn,roster=info";
const VERBOSE_FILTER: &str = "debug";

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            VERBOSE_FILTER
        } else {
            DEFAULT_FILTER
        })
    })
}

/// Install the global subscriber. Call once, before any work starts.
pub fn init_tracing(verbose: bool, timing: bool) {
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
        .with(filter(verbose))
        .init();
}
