use std::time::Duration;

use crate::consts;

// -----------------------------------------------------------------------------
// OSAL Config
// -----------------------------------------------------------------------------

/// Configuration of an [`Osal`] instance.
///
/// [`Osal`]: crate::api::Osal
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OsalConfig {
  // ---------------------------------------------------------------------------
  // Object Table Configuration
  // ---------------------------------------------------------------------------
  pub max_timebases: usize,
  pub max_timers: usize,
  pub max_name_len: usize,
  // ---------------------------------------------------------------------------
  // Timebase Configuration
  // ---------------------------------------------------------------------------
  /// How long to wait for a new service loop to attach to its tick source.
  /// `None` waits forever.
  pub start_timeout: Option<Duration>,
  // ---------------------------------------------------------------------------
  // Tracing Subscriber Configuration
  // ---------------------------------------------------------------------------
  /// Install the global tracing subscriber when the instance is created.
  pub tracing_install: bool,
  pub tracing_source_file: bool,
  pub tracing_source_line: bool,
  pub tracing_source_name: bool,
  pub tracing_thread_info: bool,
  pub tracing_verbose: bool,
  pub tracing_very_verbose: bool,
}

impl OsalConfig {
  #[inline]
  pub const fn new() -> Self {
    Self {
      max_timebases: consts::DEF_MAX_TIMEBASES,
      max_timers: consts::DEF_MAX_TIMERS,
      max_name_len: consts::MAX_API_NAME,
      start_timeout: Some(consts::DEF_START_TIMEOUT),
      tracing_install: false,
      tracing_source_file: false,
      tracing_source_line: false,
      tracing_source_name: false,
      tracing_thread_info: true,
      tracing_verbose: true,
      tracing_very_verbose: false,
    }
  }

  #[inline]
  pub const fn tracing_filter(&self) -> tracing::Level {
    if self.tracing_very_verbose {
      tracing::Level::TRACE
    } else if self.tracing_verbose {
      tracing::Level::DEBUG
    } else {
      tracing::Level::INFO
    }
  }
}

impl Default for OsalConfig {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use crate::api::OsalConfig;
  use crate::consts;

  #[test]
  fn test_defaults() {
    let config: OsalConfig = OsalConfig::default();

    assert_eq!(config.max_timebases, consts::DEF_MAX_TIMEBASES);
    assert_eq!(config.max_timers, consts::DEF_MAX_TIMERS);
    assert_eq!(config.max_name_len, consts::MAX_API_NAME);
    assert!(!config.tracing_install);
  }

  #[test]
  fn test_tracing_filter() {
    let mut config: OsalConfig = OsalConfig::default();

    assert_eq!(config.tracing_filter(), tracing::Level::DEBUG);

    config.tracing_very_verbose = true;
    assert_eq!(config.tracing_filter(), tracing::Level::TRACE);

    config.tracing_very_verbose = false;
    config.tracing_verbose = false;
    assert_eq!(config.tracing_filter(), tracing::Level::INFO);
  }
}
