//! stderr logging shared with the `[arize]` diagnostics

use std::fmt;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Prefix of every diagnostic line written to stderr
pub const LOG_TAG: &str = "[arize]";

const DEFAULT_FILTER: &str = "warn,h2=error,hyper_util=error";

/// Event formatter that writes [`LOG_TAG`] before the wrapped format
pub struct Tagged<F> {
    inner: F,
}

impl<F> Tagged<F> {
    pub fn new(inner: F) -> Self {
        Tagged { inner }
    }
}

impl<S, N, F> FormatEvent<S, N> for Tagged<F>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
    F: FormatEvent<S, N>,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "{} ", LOG_TAG)?;
        self.inner.format_event(ctx, writer, event)
    }
}

/// Plain-text subscriber: no colors, no timestamps, every line tagged
fn subscriber<W>(writer: W, filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .event_format(Tagged::new(format::format().without_time().with_ansi(false)))
        .with_env_filter(filter)
        .finish()
}

/// Install the global subscriber. RUST_LOG overrides the default level.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    subscriber(std::io::stderr, filter).init();
}
