//! Log filtering and subscriber setup for the binary.

use tracing_subscriber::{
    EnvFilter,
    filter::ParseError,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_DIRECTIVE: &str = "patient_tracker=info";

/// Builds the log filter from the value of `RUST_LOG`, if any.
///
/// An explicit `RUST_LOG` is taken as is, so a stricter level such as
/// `patient_tracker=warn` is not widened by the default.
pub fn env_filter(rust_log: Option<&str>) -> Result<EnvFilter, ParseError> {
    EnvFilter::try_new(rust_log.unwrap_or(DEFAULT_DIRECTIVE))
}

/// Installs the global subscriber: the filter above plus the fmt layer.
pub fn init() -> Result<(), ParseError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::registry()
        .with(env_filter(rust_log.as_deref())?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_without_rust_log() {
        assert_eq!(env_filter(None).unwrap().to_string(), "patient_tracker=info");
    }

    #[test]
    fn test_rust_log_is_not_widened() {
        let filter = env_filter(Some("patient_tracker=warn")).unwrap();

        assert_eq!(filter.to_string(), "patient_tracker=warn");
    }

    #[test]
    fn test_invalid_rust_log_is_rejected() {
        assert!(env_filter(Some("patient_tracker=loud")).is_err());
    }
}
