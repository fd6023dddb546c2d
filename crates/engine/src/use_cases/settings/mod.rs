//! System settings use cases.

mod settings_ops;

pub use settings_ops::{
    keys, SettingsError, SettingsOps, TrackerConfig, DEFAULT_TICK_INTERVAL_SECS,
    INTERVAL_UNIT_SECONDS,
};
