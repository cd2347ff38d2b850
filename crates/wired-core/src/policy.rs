//! Room presets, the level → lifespan table and the send-time word
//! corruption the chat server applies before a message is broadcast.

use rand::{seq::IndexedRandom, Rng};
use uuid::Uuid;

use crate::types::CorruptionMetadata;

/// Highest corruption level on the 0–10 scale.
pub const MAX_LEVEL: u8 = 10;

/// Message lifespan in seconds for each level, index = level.
const LEVEL_DELAYS: [u64; 11] = [0, 300, 120, 90, 60, 45, 20, 15, 10, 5, 2];

/// Seconds before a message at `level` decays. 0 means permanent.
/// Levels above [`MAX_LEVEL`] are clamped.
pub fn delay_for_level(level: u8) -> u64 {
    LEVEL_DELAYS[usize::from(level.min(MAX_LEVEL))]
}

/// Glyphs used by send-time corruption. Narrower than the decay alphabet.
pub const SEND_GLYPHS: [char; 9] = ['█', '▓', '▒', '░', '▄', '▀', '▐', '▌', '▬'];

/// Corrupt `text` at the sender's manual `level` before it is sent.
///
/// Each whitespace-separated word is picked with probability `level / 20`;
/// inside a picked word each char is replaced with probability `level / 30`.
/// Words are re-joined with single spaces. Level 0 returns `text` unchanged.
pub fn apply_corruption<R: Rng>(text: &str, level: u8, rng: &mut R) -> String {
    if level == 0 {
        return text.to_owned();
    }
    let word_chance = f64::from(level) / 20.0;
    let char_chance = f64::from(level) / 30.0;

    text.split_whitespace()
        .map(|word| {
            if rng.random::<f64>() >= word_chance {
                return word.to_owned();
            }
            word.chars()
                .map(|c| {
                    if rng.random::<f64>() < char_chance {
                        SEND_GLYPHS.choose(rng).copied().unwrap_or(c)
                    } else {
                        c
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Default corruption level of a named room. Unknown rooms are permanent.
pub fn room_level(room: &str) -> u8 {
    match room {
        "cyberia" => 2,
        "protocol7" | "knights" => 3,
        "wired" | "navi" => 4,
        "phantom" => 5,
        "masami" => 6,
        _ => 0,
    }
}

impl CorruptionMetadata {
    /// Metadata for a message posted in `room`, using the room's preset level.
    pub fn for_room(message_id: impl Into<String>, room: &str, is_ephemeral: bool) -> Self {
        let level = room_level(room);
        Self {
            message_id: Some(message_id.into()),
            corruption_level: level,
            corruption_delay: delay_for_level(level),
            is_ephemeral,
            manual_corruption: 0,
        }
    }

    /// Like [`CorruptionMetadata::for_room`] with a fresh v4 message id.
    pub fn generate_for_room(room: &str, is_ephemeral: bool) -> Self {
        Self::for_room(Uuid::new_v4().to_string(), room, is_ephemeral)
    }
}
