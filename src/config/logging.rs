//! Diagnostic logging setup
//!
//! The level comes from `LOG_LEVEL` (debug, info, warn, error). `RUST_LOG`
//! takes precedence when present so module filters keep working.

use log::LevelFilter;

/// Environment variable selecting the log level
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Map a `LOG_LEVEL` value to a filter, falling back to `Info`
pub fn parse_level(value: Option<&str>) -> LevelFilter {
    match value.map(|v| v.trim().to_ascii_uppercase()).as_deref() {
        Some("DEBUG") => LevelFilter::Debug,
        Some("INFO") => LevelFilter::Info,
        Some("WARNING") | Some("WARN") => LevelFilter::Warn,
        Some("ERROR") | Some("CRITICAL") => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

/// Initialise env_logger once for the process
pub fn init() {
    let level = parse_level(std::env::var(LOG_LEVEL_ENV).ok().as_deref());

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    // A second call (tests) is harmless.
    let _ = builder.format_timestamp_secs().try_init();

    log::debug!("log level set to {}", level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level(Some("debug")), LevelFilter::Debug);
        assert_eq!(parse_level(Some("WARNING")), LevelFilter::Warn);
        assert_eq!(parse_level(Some("critical")), LevelFilter::Error);
        assert_eq!(parse_level(Some("verbose")), LevelFilter::Info);
        assert_eq!(parse_level(None), LevelFilter::Info);
    }
}
