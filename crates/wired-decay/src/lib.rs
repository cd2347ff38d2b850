//! `wired-decay` — per-message decay scheduler for the Wired chat client.
//!
//! # Overview
//!
//! Each chat message may carry [`CorruptionMetadata`]. Registering it with a
//! [`CorruptionScheduler`] starts two independent timers:
//!
//! | Timer      | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | Countdown  | Renders seconds remaining and a severity tier, once a second |
//! | Decay      | Fires once, then animates the text into noise step by step |
//!
//! The scheduler talks to messages only through the [`MessageEntity`]
//! capability traits, and runs its timers as tokio tasks. Tests drive it
//! with a paused tokio clock.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wired_core::CorruptionMetadata;
//! use wired_decay::{CorruptionScheduler, MessageEntity};
//!
//! fn on_message(sched: &CorruptionScheduler, entity: Arc<dyn MessageEntity>, raw: &str) {
//!     let metadata = CorruptionMetadata::from_json(raw).ok();
//!     sched.register(entity, metadata.as_ref());
//! }
//! ```

pub mod animate;
pub mod engine;
pub mod entity;
mod timer;

pub use animate::Animation;
pub use engine::CorruptionScheduler;
pub use entity::{DisplaySink, MessageEntity, TextSink};
pub use wired_core::{
    CorruptionMetadata, CountdownDisplay, CountdownTier, DecayConfig, DecayPhase, SchedulerStats,
};
