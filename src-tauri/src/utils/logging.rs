//! Logging setup plus macros gated by a module-level `ENABLE_LOGS` flag.
//!
//! Usage:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_debug, log_info};
//!
//! log_info!("printed when ENABLE_LOGS is true");
//! ```

use log::LevelFilter;

/// Installs `env_logger` at `info` unless `RUST_LOG` says otherwise. Safe to
/// call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .try_init();
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// Conditional info logging. The calling module must define
/// `const ENABLE_LOGS: bool`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
