//! Logging setup shared by the homecat crates
//!
//! Levels are selected with the HOMECAT_LOG environment variable, or
//! explicitly by the binary after it has read its configuration file:
//! - HOMECAT_LOG=off (default) - no logs
//! - HOMECAT_LOG=error | warn | info | debug

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable consulted by [`init_diagnostics`]
pub const LOG_ENV: &str = "HOMECAT_LOG";

static INIT: Once = Once::new();

/// Parsed value of a log level setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSetting {
    Off,
    Min(emit::Level),
}

/// Parse a level name. Unknown names yield `None`.
#[must_use]
pub fn parse_level(value: &str) -> Option<LogSetting> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" => Some(LogSetting::Off),
        "error" => Some(LogSetting::Min(emit::Level::Error)),
        "warn" => Some(LogSetting::Min(emit::Level::Warn)),
        "info" => Some(LogSetting::Min(emit::Level::Info)),
        "debug" => Some(LogSetting::Min(emit::Level::Debug)),
        _ => None,
    }
}

/// Initialize diagnostics from HOMECAT_LOG.
///
/// Safe to call more than once; only the first call installs an emitter.
pub fn init_diagnostics() {
    let level = std::env::var(LOG_ENV).unwrap_or_else(|_| "off".to_string());
    init_with_level(&level);
}

/// Initialize diagnostics with an explicit level name.
///
/// Unknown names fall back to `info`.
pub fn init_with_level(level: &str) {
    INIT.call_once(|| {
        let setting = match parse_level(level) {
            Some(setting) => setting,
            None => {
                // Bootstrap warning, the emitter is not installed yet
                eprintln!("Warning: Unknown {LOG_ENV} value '{level}', using 'info'");
                LogSetting::Min(emit::Level::Info)
            }
        };

        let LogSetting::Min(min) = setting else {
            return;
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(min))
            .init();

        // The runtime lives for the rest of the process
        std::mem::forget(rt);
    });
}

/// Log basic operations (commits, uploads, renames).
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log detailed diagnostics (store operations, SQL text, listing sizes).
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log recoverable problems (cleanup failures, fallbacks).
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures that abort an operation.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("off"), Some(LogSetting::Off));
        assert_eq!(parse_level(""), Some(LogSetting::Off));
        assert_eq!(parse_level("DEBUG"), Some(LogSetting::Min(emit::Level::Debug)));
        assert_eq!(parse_level(" warn "), Some(LogSetting::Min(emit::Level::Warn)));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn test_init_is_safe_to_call_multiple_times() {
        init_with_level("off");
        init_diagnostics();
        init_with_level("debug");
    }

    #[test]
    fn test_macros_compile() {
        log_info!("Test message");
        log_debug!("Debug message with {value}", value: 42);
        log_warn!("Warning message");
        log_error!("Error message");
    }
}
