#![deny(missing_docs)]
//! Shared logging utilities for the pdfdesk workspace.
//!
//! The `desk_*` macros tag every record with [`LOG_TARGET`], so the shell and
//! tests can filter pdfdesk output from that of dependencies.

/// Log target used by every `desk_*` macro, so the shell can filter on it.
pub const LOG_TARGET: &str = "pdfdesk";

/// `log::trace!` under [`LOG_TARGET`].
#[macro_export]
macro_rules! desk_trace {
    ($($arg:tt)*) => {{
        log::trace!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// `log::debug!` under [`LOG_TARGET`].
#[macro_export]
macro_rules! desk_debug {
    ($($arg:tt)*) => {{
        log::debug!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// `log::info!` under [`LOG_TARGET`].
#[macro_export]
macro_rules! desk_info {
    ($($arg:tt)*) => {{
        log::info!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// `log::warn!` under [`LOG_TARGET`].
#[macro_export]
macro_rules! desk_warn {
    ($($arg:tt)*) => {{
        log::warn!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// `log::error!` under [`LOG_TARGET`].
#[macro_export]
macro_rules! desk_error {
    ($($arg:tt)*) => {{
        log::error!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Installs a terminal logger for tests that shows only `pdfdesk` records.
///
/// `PDFDESK_TEST_LOG` (e.g. `trace`) overrides the default `Debug` level.
/// No-op when a logger is already installed.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

    let level = std::env::var("PDFDESK_TEST_LOG")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(log::LevelFilter::Debug);
    let config = ConfigBuilder::new().add_filter_allow_str(LOG_TARGET).build();

    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Never);
}

#[cfg(test)]
mod tests {
    #[test]
    fn macros_expand_before_and_after_init() {
        crate::desk_debug!("before init {}", 1);
        crate::initialize_for_tests();
        crate::initialize_for_tests();
        crate::desk_info!("after init {}", 2);
        crate::desk_trace!("trace");
        crate::desk_warn!("warn");
        crate::desk_error!("error");
    }
}
