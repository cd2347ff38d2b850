use serde::{Deserialize, Serialize};

use crate::config::TierThresholds;
use crate::error::Result;

/// Per-message decay metadata as delivered by the chat transport.
///
/// The transport sends a larger metadata object (`is_phantom`, `room_name`,
/// `session_hash`, …); only the keys below matter here and the rest are
/// ignored on deserialisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptionMetadata {
    /// Opaque message identifier. `None` or an empty string aborts registration.
    #[serde(default)]
    pub message_id: Option<String>,
    /// Severity on a 0–10 scale. 0 means the message never decays.
    #[serde(default)]
    pub corruption_level: u8,
    /// Seconds from registration to decay onset. 0 means "do not schedule".
    #[serde(default)]
    pub corruption_delay: u64,
    /// Forces the short ephemeral fuse regardless of `corruption_delay`.
    #[serde(default)]
    pub is_ephemeral: bool,
    /// Sender's `/corrupt` level, already applied to the text at send time.
    #[serde(default)]
    pub manual_corruption: u8,
}

impl CorruptionMetadata {
    pub fn new(message_id: impl Into<String>, corruption_level: u8, corruption_delay: u64) -> Self {
        Self {
            message_id: Some(message_id.into()),
            corruption_level,
            corruption_delay,
            is_ephemeral: false,
            manual_corruption: 0,
        }
    }

    pub fn ephemeral(mut self, is_ephemeral: bool) -> Self {
        self.is_ephemeral = is_ephemeral;
        self
    }

    /// Parse the transport's JSON metadata object.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// The message id, or `None` when it is missing or empty.
    pub fn id(&self) -> Option<&str> {
        self.message_id.as_deref().filter(|id| !id.is_empty())
    }

    /// True when this metadata would acquire scheduler resources.
    pub fn is_scheduled(&self) -> bool {
        self.id().is_some() && self.corruption_level != 0 && self.corruption_delay != 0
    }
}

/// Severity tier of a running countdown, derived from the remaining fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownTier {
    High,
    Medium,
    Low,
    Critical,
}

impl CountdownTier {
    /// Classify `remaining / total` against the configured thresholds.
    ///
    /// Every comparison is strict: a fraction sitting exactly on a threshold
    /// falls into the lower tier.
    pub fn classify(fraction: f64, thresholds: &TierThresholds) -> Self {
        if fraction > thresholds.high {
            CountdownTier::High
        } else if fraction > thresholds.medium {
            CountdownTier::Medium
        } else if fraction > thresholds.low {
            CountdownTier::Low
        } else {
            CountdownTier::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CountdownTier::High => "high",
            CountdownTier::Medium => "medium",
            CountdownTier::Low => "low",
            CountdownTier::Critical => "critical",
        }
    }
}

impl std::fmt::Display for CountdownTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a countdown sink should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CountdownDisplay {
    /// Seconds left before decay, with the tier for styling.
    Counting { remaining: u64, tier: CountdownTier },
    /// Countdown reached zero; shown as `0` in the "corrupting" style.
    Corrupting,
}

/// Lifecycle markers written on a message while it decays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayPhase {
    /// Progressive animation in progress.
    Corrupting,
    /// Instant (caller-triggered) animation in progress.
    InstantCorrupting,
    /// Terminal state. Replaces any in-progress marker.
    FullyCorrupted,
}

/// Read-only diagnostics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub active: bool,
    /// Number of decay triggers still waiting to fire.
    pub active_timers: usize,
    /// Size of the corruption alphabet.
    pub corruption_chars: usize,
}

/// First 8 characters of an id, for log fields.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}
