//! Narrow capability interface between the scheduler and whatever renders a
//! chat message (terminal UI, web view, test double).
//!
//! The scheduler never creates or destroys an entity. It only reads the
//! liveness flag and the text, and writes countdown state, text and phase
//! markers.

use std::sync::Arc;

use wired_core::{CountdownDisplay, DecayPhase};

/// Countdown display attached to a message.
pub trait DisplaySink: Send + Sync {
    fn render(&self, state: CountdownDisplay);
}

/// Text body of a message.
pub trait TextSink: Send + Sync {
    /// Current visible text.
    fn text(&self) -> String;
    fn set_text(&self, text: &str);
}

/// A message the scheduler can decay.
pub trait MessageEntity: Send + Sync {
    /// False once the message has left the live view. Checked before any
    /// mutation that happens after a timer fires.
    fn is_live(&self) -> bool;

    fn countdown_sink(&self) -> Option<Arc<dyn DisplaySink>>;

    fn text_sink(&self) -> Option<Arc<dyn TextSink>>;

    /// Set a lifecycle marker. `FullyCorrupted` also clears any in-progress
    /// marker.
    fn set_phase(&self, phase: DecayPhase);
}
