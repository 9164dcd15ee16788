//! Initialization functions bring up the engine's runtime environment:
//! 1. resolve global config, from a manually built entity, a YAML file, or
//!    the process environment;
//! 2. initialize the global logger;
//! 3. start the background system-metric collectors and the optional
//!    cached-time ticker.

use super::config;
use crate::core::config::{override_items_from_system_env, ConfigEntity};
use crate::{system_metric, utils, Result};

/// init_default initializes the engine using configuration resolved from
/// the system environment and built-in defaults.
#[inline]
pub fn init_default() -> Result<()> {
    init_sentinel(&mut String::new())
}

/// init_with_config initializes the engine using the given config entity.
#[inline]
pub fn init_with_config(config_entity: ConfigEntity) -> Result<()> {
    config_entity.check()?;
    config::reset_global_config(config_entity);
    override_items_from_system_env()?;
    #[cfg(any(feature = "env_logger", feature = "log4rs"))]
    config::init_log()?;
    init_core_components()
}

/// init_with_config_file loads general configuration from the given YAML
/// file and initializes the engine.
#[inline]
pub fn init_with_config_file(config_path: &mut String) -> Result<()> {
    init_sentinel(config_path)
}

#[inline]
fn init_sentinel(config_path: &mut String) -> Result<()> {
    config::init_config_with_yaml(config_path)?;
    init_core_components()
}

#[inline]
fn init_core_components() -> Result<()> {
    let system_interval = config::system_stat_collect_interval_ms();
    let mut load_interval = system_interval;
    let mut cpu_interval = system_interval;
    let mut mem_interval = system_interval;

    if config::load_stat_collec_interval_ms() > 0 {
        load_interval = config::load_stat_collec_interval_ms();
    }
    if config::cpu_stat_collec_interval_ms() > 0 {
        cpu_interval = config::cpu_stat_collec_interval_ms();
    }
    if config::memory_stat_collec_interval_ms() > 0 {
        mem_interval = config::memory_stat_collec_interval_ms();
    }

    if load_interval > 0 {
        system_metric::init_load_collector(load_interval);
    }
    if cpu_interval > 0 {
        system_metric::init_cpu_collector(cpu_interval);
    }
    if mem_interval > 0 {
        system_metric::init_memory_collector(mem_interval);
    }

    if config::use_cache_time() {
        utils::start_time_ticker();
    }
    Ok(())
}
