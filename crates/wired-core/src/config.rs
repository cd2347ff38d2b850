use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, WiredError};

pub const DEFAULT_EPHEMERAL_FUSE_SECS: u64 = 5;
pub const DEFAULT_COUNTDOWN_TICK_MS: u64 = 1_000;
pub const DEFAULT_NOISE_SPACE_PROBABILITY: f64 = 0.2;
/// Block and shade glyphs used as replacement noise.
pub const DEFAULT_ALPHABET: [char; 13] = [
    '█', '▓', '▒', '░', '▄', '▀', '▐', '▌', '▬', '■', '□', '▪', '▫',
];

/// Tunables for the decay scheduler (decay.toml + WIRED_* env overrides).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayConfig {
    /// Whether a freshly built scheduler accepts registrations.
    #[serde(default = "bool_true")]
    pub start_active: bool,
    /// Fixed fuse used for ephemeral messages, in seconds.
    #[serde(default = "default_ephemeral_fuse_secs")]
    pub ephemeral_fuse_secs: u64,
    /// Countdown cadence in milliseconds.
    #[serde(default = "default_countdown_tick_ms")]
    pub countdown_tick_ms: u64,
    #[serde(default)]
    pub tiers: TierThresholds,
    /// Animation run when a decay trigger fires.
    #[serde(default = "AnimationProfile::progressive")]
    pub progressive: AnimationProfile,
    /// Animation run by caller-triggered instant corruption.
    #[serde(default = "AnimationProfile::instant")]
    pub instant: AnimationProfile,
    /// Chance that a terminal noise character is a space.
    #[serde(default = "default_noise_space_probability")]
    pub noise_space_probability: f64,
    #[serde(default = "default_alphabet")]
    pub alphabet: Vec<char>,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            start_active: true,
            ephemeral_fuse_secs: DEFAULT_EPHEMERAL_FUSE_SECS,
            countdown_tick_ms: DEFAULT_COUNTDOWN_TICK_MS,
            tiers: TierThresholds::default(),
            progressive: AnimationProfile::progressive(),
            instant: AnimationProfile::instant(),
            noise_space_probability: DEFAULT_NOISE_SPACE_PROBABILITY,
            alphabet: default_alphabet(),
        }
    }
}

/// Remaining-fraction boundaries between countdown tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            high: 0.7,
            medium: 0.4,
            low: 0.2,
        }
    }
}

/// Step count and spacing of one animation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationProfile {
    pub steps: u32,
    pub step_delay_ms: u64,
}

impl AnimationProfile {
    pub fn progressive() -> Self {
        Self {
            steps: 3,
            step_delay_ms: 100,
        }
    }

    pub fn instant() -> Self {
        Self {
            steps: 10,
            step_delay_ms: 50,
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_ephemeral_fuse_secs() -> u64 {
    DEFAULT_EPHEMERAL_FUSE_SECS
}
fn default_countdown_tick_ms() -> u64 {
    DEFAULT_COUNTDOWN_TICK_MS
}
fn default_noise_space_probability() -> f64 {
    DEFAULT_NOISE_SPACE_PROBABILITY
}
fn default_alphabet() -> Vec<char> {
    DEFAULT_ALPHABET.to_vec()
}

impl DecayConfig {
    /// Load config from a TOML file with WIRED_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.wired/decay.toml
    ///
    /// A missing file is not an error; compiled defaults fill every key.
    /// Nested keys use a double underscore, e.g. `WIRED_PROGRESSIVE__STEPS=4`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        debug!(%path, "loading decay config");

        Self::from_figment(
            Figment::from(Serialized::defaults(DecayConfig::default()))
                .merge(Toml::file(&path))
                .merge(Env::prefixed("WIRED_").split("__")),
        )
    }

    /// Extract and validate from an already-assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: DecayConfig = figment
            .extract()
            .map_err(|e| WiredError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.alphabet.is_empty() {
            return Err(WiredError::Config("alphabet must not be empty".into()));
        }
        if self.countdown_tick_ms == 0 {
            return Err(WiredError::Config("countdown_tick_ms must be > 0".into()));
        }
        for (name, profile) in [("progressive", self.progressive), ("instant", self.instant)] {
            if profile.steps == 0 {
                return Err(WiredError::Config(format!("{name}.steps must be > 0")));
            }
        }
        if !(0.0..=1.0).contains(&self.noise_space_probability) {
            return Err(WiredError::Config(format!(
                "noise_space_probability {} outside [0, 1]",
                self.noise_space_probability
            )));
        }
        let TierThresholds { high, medium, low } = self.tiers;
        if !(high > medium && medium > low && (0.0..=1.0).contains(&high) && low >= 0.0) {
            return Err(WiredError::Config(format!(
                "tier thresholds must descend within [0, 1], got {high}/{medium}/{low}"
            )));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.wired/decay.toml", home)
}
