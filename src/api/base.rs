//! Re-export of the configuration module under the `config` name, so
//! `init.rs` and downstream callers can write `config::app_name()` etc.
//! without reaching into `crate::core::config` directly.

pub use crate::core::config;
