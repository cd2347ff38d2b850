//! `wired-core` — types, configuration and room policy shared by the
//! message-decay subsystem.

pub mod config;
pub mod error;
pub mod policy;
pub mod types;

pub use config::{AnimationProfile, DecayConfig, TierThresholds};
pub use error::{Result, WiredError};
pub use types::{
    short_id, CorruptionMetadata, CountdownDisplay, CountdownTier, DecayPhase, SchedulerStats,
};
