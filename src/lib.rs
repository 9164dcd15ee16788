#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]

//! # Sentinel Guard
//!
//! An in-process resource guard and flow-control engine. It adopts the
//! chain-of-responsibility pattern: the user-defined rules for a resource
//! are checked by slots registered on `base::SlotChain`. Generally, there
//! are a few steps when using it:
//!
//! 1. Initialize configuration.
//! 2. Define a resource to be protected and build a Sentinel entry.
//! 3. Load the rules defined for each resource.
//! 4. Write the code at the entry and exit points.
//!
//! ## Add Dependency
//!
//! ```toml
//! [dependencies]
//! sentinel-guard = "0.1.0"
//! ```
//!
//! Optional features:
//! - `async`: keep entries on `Arc`/`RwLock` instead of `Rc`/`RefCell`, for
//!   use from multi-threaded/asynchronous call sites.
//! - `logger_env`: use `env_logger` to initialize logging.
//! - `logger_log4rs`: use `log4rs` to initialize logging.
//!
//! ## Initialization
//!
//! - `init_default()`: load configuration from environment variables,
//!   falling back to defaults for anything unset.
//! - `init_with_config_file(config_path: &mut String)`: load configuration
//!   from a YAML file.
//! - `init_with_config(config_entity: config::ConfigEntity)`: use a
//!   hand-built `ConfigEntity`.
//!
//! ```rust,no_run
//! use sentinel_guard::{init_default, logging};
//! init_default().unwrap_or_else(|err| logging::error!("{:?}", err));
//! ```
//!
//! ## Resource Definition
//!
//! A piece of code is a resource once its execution is guarded by an entry.
//! Building `EntryBuilder` and calling `build()` creates the entry; if the
//! call is blocked, `build()` returns an error and no `exit()` is needed.
//!
//! ```rust,no_run
//! use sentinel_guard::base;
//! use sentinel_guard::api::EntryBuilder;
//! let entry_builder = EntryBuilder::new("my_resource".into())
//!     .with_traffic_type(base::TrafficType::Inbound);
//! if let Ok(entry) = entry_builder.build() {
//!     // The request is allowed to be processed.
//!     entry.exit()
//! } else {
//!     // The request is blocked; no `exit()` is needed.
//! }
//! ```
//!
//! ## Loading Rules
//!
//! `load_rules()` replaces every rule registered for its kind;
//! `append_rule()` adds one incrementally. For example:
//!
//! ```rust,no_run
//! use sentinel_guard::flow;
//! use std::sync::Arc;
//! flow::load_rules(vec![Arc::new(flow::Rule {
//!     resource: "example".into(),
//!     threshold: 10.0,
//!     calculate_strategy: flow::CalculateStrategy::Direct,
//!     control_strategy: flow::ControlStrategy::Reject,
//!     ..Default::default()
//! })]);
//! ```
//!
//! Dynamic configuration sources, dashboards, and cluster-mode token
//! servers are out of scope for this crate: `load_rules`/`append_rule` are
//! the sole seam for wiring an external configuration source in.
// This module is not intended to be part of the public API. In general, any
// `doc(hidden)` code is not part of the crate's public and stable API.
#[macro_use]
#[doc(hidden)]
pub mod macros;

/// The public, topmost API: entry construction and global initialization.
pub mod api;
/// Core implementations: the slot chain, the statistic structures (the
/// sliding window and its underlying leap array), and the rule managers for
/// flow control, circuit breaking and system adaptive protection.
pub mod core;
/// Adapters for different logging crates.
pub mod logging;
// Utility functions.
pub mod utils;

// re-export precludes
pub use crate::core::*;
pub use api::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
