use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber: one JSON object per event on stderr.
///
/// stdout carries command output (tables, paths, `--json`), so logs never go
/// there. `quiet` keeps only errors from the xcast crates; otherwise info and
/// up are shown. `RUST_LOG` can still raise other targets.
pub fn init_logging(quiet: bool) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(EnvFilter::from_default_env().add_directive(xcast_directive(quiet)))
        .init();
}

/// `xcast` as a target prefix covers both `xcast` and `xcast_core`.
fn xcast_directive(quiet: bool) -> Directive {
    let (text, level) = if quiet {
        ("xcast=error", LevelFilter::ERROR)
    } else {
        ("xcast=info", LevelFilter::INFO)
    };
    text.parse().unwrap_or_else(|_| level.into())
}
