//! Tracing setup for inspector hosts
//!
//! Diagnostics go through `tracing`. Host events can additionally be routed
//! into a capture buffer through [`CaptureLayer`], which is how the `logs`
//! category gets filled without the host calling the buffer directly.

pub mod tracing_layer;

pub use tracing_layer::{CaptureLayer, FALLBACK_CATEGORY};

use crate::capture::SharedCapture;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_DIRECTIVES: &str = "info";

/// Install the global subscriber.
///
/// `capture` adds a [`CaptureLayer`]; `with_fmt` adds human-readable output
/// on stderr, which a full-screen panel will want to leave off.
pub fn init_tracing(capture: Option<SharedCapture>, with_fmt: bool) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::prelude::*;

    let fmt_layer = with_fmt.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
    });
    let capture_layer = capture.map(CaptureLayer::new);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let subscriber = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(capture_layer)
        .with(env_filter);

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
