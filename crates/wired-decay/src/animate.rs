//! Pure text-corruption step functions.
//!
//! Every frame is sampled fresh from the untouched original text, so a
//! character replaced in one step may show a different glyph, or its
//! original form, in the next. The randomness source is always injected.

use rand::{seq::IndexedRandom, Rng};
use wired_core::{AnimationProfile, DecayConfig, DecayPhase};

/// Glyph used if an alphabet somehow reaches us empty.
const FALLBACK_GLYPH: char = '█';

/// Which animation chain to run over a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    /// Run when a decay trigger fires.
    Progressive,
    /// Caller-triggered, severity `level` on the 0–10 scale.
    Instant { level: u8 },
}

impl Animation {
    pub fn profile(&self, config: &DecayConfig) -> AnimationProfile {
        match self {
            Animation::Progressive => config.progressive,
            Animation::Instant { .. } => config.instant,
        }
    }

    /// Multiplier applied to every step fraction.
    pub fn scale(&self) -> f64 {
        match self {
            Animation::Progressive => 1.0,
            Animation::Instant { level } => (f64::from(*level) / 10.0).min(1.0),
        }
    }

    /// Marker shown while the chain is running.
    pub fn phase(&self) -> DecayPhase {
        match self {
            Animation::Progressive => DecayPhase::Corrupting,
            Animation::Instant { .. } => DecayPhase::InstantCorrupting,
        }
    }
}

/// Corruption density at 0-indexed `step` of a `steps`-long chain.
pub fn step_fraction(step: u32, steps: u32, scale: f64) -> f64 {
    if steps == 0 {
        return scale;
    }
    f64::from(step + 1) / f64::from(steps) * scale
}

/// Uniformly random glyph from `alphabet`.
pub fn glyph<R: Rng>(alphabet: &[char], rng: &mut R) -> char {
    alphabet.choose(rng).copied().unwrap_or(FALLBACK_GLYPH)
}

/// Replace each non-space char of `text` with a random glyph with
/// probability `fraction`. Spaces always survive.
pub fn partial_corruption<R: Rng>(
    text: &str,
    fraction: f64,
    alphabet: &[char],
    rng: &mut R,
) -> String {
    text.chars()
        .map(|c| {
            if c == ' ' {
                ' '
            } else if rng.random::<f64>() < fraction {
                glyph(alphabet, rng)
            } else {
                c
            }
        })
        .collect()
}

/// `len` chars of pure noise: a space with probability `space_probability`,
/// otherwise a random glyph.
pub fn noise<R: Rng>(len: usize, space_probability: f64, alphabet: &[char], rng: &mut R) -> String {
    (0..len)
        .map(|_| {
            if rng.random::<f64>() < space_probability {
                ' '
            } else {
                glyph(alphabet, rng)
            }
        })
        .collect()
}

/// Text shown at `step` of `animation` over `original`.
///
/// Steps past the end of the chain produce the terminal noise frame, which
/// has the same char count as `original` and no relation to its content.
pub fn frame<R: Rng>(
    original: &str,
    step: u32,
    animation: Animation,
    config: &DecayConfig,
    rng: &mut R,
) -> String {
    let steps = animation.profile(config).steps;
    if step >= steps {
        return noise(
            original.chars().count(),
            config.noise_space_probability,
            &config.alphabet,
            rng,
        );
    }
    let fraction = step_fraction(step, steps, animation.scale());
    partial_corruption(original, fraction, &config.alphabet, rng)
}
