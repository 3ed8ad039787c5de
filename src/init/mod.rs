//! Global tracing subscriber setup.

use crate::api::OsalConfig;

/// Error returned when the global tracing subscriber cannot be installed.
pub type TracingInitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Installs the global tracing subscriber configured by `config`.
///
/// Fails if a global subscriber is already set.
#[cfg(feature = "tracing")]
pub fn init_tracing(config: &OsalConfig) -> Result<(), TracingInitError> {
  use tracing_subscriber::FmtSubscriber;
  use tracing_subscriber::fmt::format;
  use tracing_subscriber::util::SubscriberInitExt;

  FmtSubscriber::builder()
    .event_format(format().compact())
    .log_internal_errors(true)
    .with_ansi(true)
    .with_file(config.tracing_source_file)
    .with_level(true)
    .with_line_number(config.tracing_source_line)
    .with_max_level(config.tracing_filter())
    .with_target(config.tracing_source_name)
    .with_thread_ids(config.tracing_thread_info)
    .with_thread_names(config.tracing_thread_info)
    .finish()
    .try_init()
    .map_err(Into::into)
}

#[cfg(not(feature = "tracing"))]
pub fn init_tracing(_config: &OsalConfig) -> Result<(), TracingInitError> {
  Ok(())
}
