use crate::base::ResourceType;

// default app settings
pub const SENTINEL_VERSION: &str = "v1";
pub const DEFAULT_APP_NAME: &str = "unknown_service";
pub const DEFAULT_APP_TYPE: u8 = ResourceType::Common as _;
pub const APP_NAME_ENV_KEY: &str = "SENTINEL_APP_NAME";
pub const APP_TYPE_ENV_KEY: &str = "SENTINEL_APP_TYPE";
pub const CONF_FILE_PATH_ENV_KEY: &str = "SENTINEL_CONFIG_FILE_PATH";
pub const CONFIG_FILENAME: &str = "USE_DEFAULT_CONFIGURATION";

// default statistic settings: the global per-resource leap array samples in
// 500ms buckets over a 10s window; the default read-only metric reuses it
// at a coarser 5s-bucket granularity.
pub const DEFAULT_SAMPLE_COUNT_TOTAL: u32 = 20;
pub const DEFAULT_INTERVAL_MS_TOTAL: u32 = 10000;
pub const DEFAULT_SAMPLE_COUNT: u32 = 2;
pub const DEFAULT_INTERVAL_MS: u32 = 10000;

pub const SYSTEM_INTERVAL_MS: u32 = 1000;
pub const LOAD_INTERVAL_MS: u32 = 1000;
pub const CPU_INTERVAL_MS: u32 = 1000;
pub const MEMORY_INTERVAL_MS: u32 = 150;
pub const WARM_UP_COLD_FACTOR: u32 = 3;

// default log settings
pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const LOG_CONFIG_FILE: &str = "testdata/config/log4rs.yaml";
