//! Configuration and settings management.
//!
//! This module provides pipeline settings types and JSON file loading.
//! Settings are validated once at startup; see [`Settings::validate`].

mod settings;

pub use settings::{
    AggregationSettings, Backend, ClassifierSettings, ConfigError, GmailSettings, LabelSettings,
    MetricsSettings, Settings, SignalSettings, SubscriptionSettings,
};
