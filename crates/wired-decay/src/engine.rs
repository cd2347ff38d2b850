use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use dashmap::{mapref::entry::Entry, DashMap};
use rand::{rngs::StdRng, SeedableRng};
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};
use wired_core::{
    short_id, CorruptionMetadata, CountdownDisplay, CountdownTier, DecayConfig, DecayPhase,
    Result, SchedulerStats,
};

use crate::{
    animate::{self, Animation},
    entity::{DisplaySink, MessageEntity, TextSink},
    timer::{runtime_available, spawn_detached, spawn_timer, TimerHandle},
};

/// Drives countdowns, decay triggers and corruption animations for chat
/// messages.
///
/// Cheap to clone; clones share the same registries. Build one per view or
/// session and hand it to whatever renders messages. Every operation returns
/// immediately; the work happens on tokio tasks, so a runtime must be
/// running. Nothing here ever returns an error or panics at runtime: bad
/// input, removed messages and missing sub-elements all degrade to a no-op.
#[derive(Clone)]
pub struct CorruptionScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    config: DecayConfig,
    active: AtomicBool,
    /// At most one running countdown per message id.
    countdowns: DashMap<String, TimerHandle>,
    /// At most one pending decay trigger per message id.
    decays: DashMap<String, TimerHandle>,
    next_generation: AtomicU64,
    rng: Mutex<StdRng>,
}

impl CorruptionScheduler {
    /// Build a scheduler seeded from the OS RNG.
    pub fn new(config: DecayConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Build a scheduler with a fixed seed, for reproducible animations.
    pub fn with_seed(config: DecayConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: DecayConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        info!(
            active = config.start_active,
            glyphs = config.alphabet.len(),
            "corruption scheduler initialised"
        );
        Ok(Self::build(config, rng))
    }

    fn build(config: DecayConfig, rng: StdRng) -> Self {
        Self {
            inner: Arc::new(Inner {
                active: AtomicBool::new(config.start_active),
                config,
                countdowns: DashMap::new(),
                decays: DashMap::new(),
                next_generation: AtomicU64::new(0),
                rng: Mutex::new(rng),
            }),
        }
    }

    pub fn config(&self) -> &DecayConfig {
        &self.inner.config
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Start decay for a freshly displayed message.
    ///
    /// No-op when the scheduler is inactive, `metadata` is absent, the id is
    /// missing or empty, or the level or delay is zero. Otherwise starts the
    /// countdown over `corruption_delay` seconds and arms the decay trigger:
    /// the ephemeral fuse if `is_ephemeral`, the nominal delay otherwise.
    /// Re-registering an id supersedes its previous countdown and trigger.
    pub fn register(&self, entity: Arc<dyn MessageEntity>, metadata: Option<&CorruptionMetadata>) {
        if !self.is_active() {
            debug!("scheduler inactive; registration skipped");
            return;
        }
        let Some(metadata) = metadata else {
            debug!("no metadata; registration skipped");
            return;
        };
        let Some(id) = metadata.id().filter(|_| metadata.is_scheduled()) else {
            debug!(
                level = metadata.corruption_level,
                delay_secs = metadata.corruption_delay,
                "no corruption needed"
            );
            return;
        };
        if !runtime_available() {
            warn!(message_id = %short_id(id), "no tokio runtime; registration skipped");
            return;
        }

        info!(
            message_id = %short_id(id),
            level = metadata.corruption_level,
            delay_secs = metadata.corruption_delay,
            ephemeral = metadata.is_ephemeral,
            "registering message for decay"
        );

        self.start_countdown(Arc::clone(&entity), id, metadata.corruption_delay);

        let delay_ms = if metadata.is_ephemeral {
            self.inner.config.ephemeral_fuse_secs.saturating_mul(1000)
        } else {
            metadata.corruption_delay.saturating_mul(1000)
        };
        self.schedule_decay(entity, id, delay_ms);
    }

    // -----------------------------------------------------------------------
    // Countdown
    // -----------------------------------------------------------------------

    /// Show `total_secs` counting down on the entity's countdown display.
    ///
    /// Any countdown already running for `id` is stopped, even when the new
    /// entity has no display.
    ///
    /// Purely cosmetic: reaching zero renders the "corrupting" state and
    /// releases the timer but never touches the message text.
    pub fn start_countdown(&self, entity: Arc<dyn MessageEntity>, id: &str, total_secs: u64) {
        let Some(sink) = entity.countdown_sink() else {
            if let Some((_, stale)) = self.inner.countdowns.remove(id) {
                stale.cancel();
            }
            debug!(message_id = %short_id(id), "no countdown display; countdown skipped");
            return;
        };
        if !runtime_available() {
            return;
        }

        sink.render(self.countdown_display(total_secs, total_secs));
        install(&self.inner.countdowns, id, || {
            self.spawn_countdown(sink, id, total_secs)
        });
        debug!(message_id = %short_id(id), total_secs, "countdown started");
    }

    fn spawn_countdown(
        &self,
        sink: Arc<dyn DisplaySink>,
        id: &str,
        total_secs: u64,
    ) -> Option<TimerHandle> {
        let generation = self.next_generation();
        let tick = Duration::from_millis(self.inner.config.countdown_tick_ms);
        let this = self.clone();
        let id = id.to_string();

        spawn_timer(generation, async move {
            let mut interval = interval_at(Instant::now() + tick, tick);
            let mut remaining = total_secs;
            loop {
                interval.tick().await;
                remaining = remaining.saturating_sub(1);
                sink.render(this.countdown_display(remaining, total_secs));
                if remaining == 0 {
                    break;
                }
            }
            this.inner
                .countdowns
                .remove_if(&id, |_, h| h.generation() == generation);
            debug!(message_id = %short_id(&id), "countdown finished");
        })
    }

    fn countdown_display(&self, remaining: u64, total: u64) -> CountdownDisplay {
        if remaining == 0 || total == 0 {
            return CountdownDisplay::Corrupting;
        }
        let fraction = remaining as f64 / total as f64;
        CountdownDisplay::Counting {
            remaining,
            tier: CountdownTier::classify(fraction, &self.inner.config.tiers),
        }
    }

    // -----------------------------------------------------------------------
    // Decay trigger
    // -----------------------------------------------------------------------

    /// Arm a one-shot trigger that corrupts the entity after `delay_ms`.
    ///
    /// Any trigger already pending for `id` is cancelled first.
    pub fn schedule_decay(&self, entity: Arc<dyn MessageEntity>, id: &str, delay_ms: u64) {
        if !runtime_available() {
            return;
        }
        if self.inner.decays.contains_key(id) {
            debug!(message_id = %short_id(id), "superseding pending decay");
        }
        install(&self.inner.decays, id, || self.spawn_decay(entity, id, delay_ms));
        info!(message_id = %short_id(id), delay_ms, "decay scheduled");
    }

    fn spawn_decay(
        &self,
        entity: Arc<dyn MessageEntity>,
        id: &str,
        delay_ms: u64,
    ) -> Option<TimerHandle> {
        let generation = self.next_generation();
        let this = self.clone();
        let id = id.to_string();

        spawn_timer(generation, async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            this.inner
                .decays
                .remove_if(&id, |_, h| h.generation() == generation);
            this.corrupt(entity, &id);
        })
    }

    // -----------------------------------------------------------------------
    // Animation
    // -----------------------------------------------------------------------

    /// Run the progressive animation over the entity's text now.
    ///
    /// No-op if the entity has left the live view or has no text element.
    /// Once started the chain cannot be cancelled.
    pub fn corrupt(&self, entity: Arc<dyn MessageEntity>, id: &str) {
        self.animate(entity, id, Animation::Progressive);
    }

    /// Corrupt the entity immediately at severity `level` (0–10).
    ///
    /// Runs the instant profile with every step fraction scaled by
    /// `min(level / 10, 1)`, then lands on the same full-noise terminal
    /// state as a decay.
    pub fn instant_corruption(&self, entity: Arc<dyn MessageEntity>, id: &str, level: u8) {
        self.animate(entity, id, Animation::Instant { level });
    }

    fn animate(&self, entity: Arc<dyn MessageEntity>, id: &str, animation: Animation) {
        if !entity.is_live() {
            debug!(message_id = %short_id(id), "entity no longer live; corruption skipped");
            return;
        }
        let Some(text) = entity.text_sink() else {
            debug!(message_id = %short_id(id), "no text element; corruption skipped");
            return;
        };
        if !runtime_available() {
            return;
        }

        let original = text.text();
        entity.set_phase(animation.phase());
        info!(
            message_id = %short_id(id),
            ?animation,
            chars = original.chars().count(),
            "corruption started"
        );

        let this = self.clone();
        let id = id.to_string();
        spawn_detached(async move {
            this.run_animation(entity, text, &id, &original, animation)
                .await;
        });
    }

    async fn run_animation(
        &self,
        entity: Arc<dyn MessageEntity>,
        text: Arc<dyn TextSink>,
        id: &str,
        original: &str,
        animation: Animation,
    ) {
        let config = &self.inner.config;
        let profile = animation.profile(config);
        let step_delay = Duration::from_millis(profile.step_delay_ms);

        for step in 0..profile.steps {
            let frame = animate::frame(original, step, animation, config, &mut *self.rng());
            text.set_text(&frame);
            tokio::time::sleep(step_delay).await;
        }

        let noise = animate::frame(original, profile.steps, animation, config, &mut *self.rng());
        text.set_text(&noise);
        entity.set_phase(DecayPhase::FullyCorrupted);
        info!(message_id = %short_id(id), "message fully corrupted");
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Cancel the pending decay trigger for `id`, if any.
    ///
    /// A running countdown keeps ticking and an animation already in flight
    /// runs to completion.
    pub fn cancel(&self, id: &str) {
        if let Some((_, handle)) = self.inner.decays.remove(id) {
            handle.cancel();
            info!(message_id = %short_id(id), "decay cancelled");
        }
    }

    /// Set the global enable flag, or flip it when `active` is `None`.
    /// Returns the new state.
    ///
    /// Deactivating cancels every pending decay trigger. Reactivating does
    /// not bring them back.
    pub fn set_active(&self, active: Option<bool>) -> bool {
        let now = match active {
            Some(flag) => {
                self.inner.active.store(flag, Ordering::SeqCst);
                flag
            }
            None => !self.inner.active.fetch_xor(true, Ordering::SeqCst),
        };
        if now {
            info!("corruption scheduler activated");
        } else {
            let cleared = self.clear_decays();
            info!(cleared, "corruption scheduler deactivated");
        }
        now
    }

    /// Cancel every pending decay trigger. Call once when the view closes.
    pub fn teardown(&self) {
        let cleared = self.clear_decays();
        info!(cleared, "corruption scheduler torn down");
    }

    fn clear_decays(&self) -> usize {
        let ids: Vec<String> = self.inner.decays.iter().map(|e| e.key().clone()).collect();
        let mut cleared = 0;
        for id in ids {
            if let Some((_, handle)) = self.inner.decays.remove(&id) {
                handle.cancel();
                cleared += 1;
            }
        }
        cleared
    }

    /// Diagnostics snapshot. No side effects.
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            active: self.is_active(),
            active_timers: self.inner.decays.len(),
            corruption_chars: self.inner.config.alphabet.len(),
        }
    }

    /// Number of countdowns still ticking.
    pub fn countdown_count(&self) -> usize {
        self.inner.countdowns.len()
    }

    /// True if a decay trigger is pending for `id`.
    pub fn is_pending(&self, id: &str) -> bool {
        self.inner.decays.contains_key(id)
    }

    // --- private helpers ---------------------------------------------------

    fn next_generation(&self) -> u64 {
        self.inner.next_generation.fetch_add(1, Ordering::Relaxed)
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.inner.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CorruptionScheduler {
    fn default() -> Self {
        Self::build(DecayConfig::default(), StdRng::from_os_rng())
    }
}

/// Replace the timer registered under `id`, cancelling the old one before
/// the new one is spawned.
fn install<F>(registry: &DashMap<String, TimerHandle>, id: &str, spawn: F)
where
    F: FnOnce() -> Option<TimerHandle>,
{
    match registry.entry(id.to_string()) {
        Entry::Occupied(mut slot) => {
            slot.get().cancel();
            match spawn() {
                Some(handle) => {
                    slot.insert(handle);
                }
                None => {
                    slot.remove();
                }
            }
        }
        Entry::Vacant(slot) => {
            if let Some(handle) = spawn() {
                slot.insert(handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl MessageEntity for Bare {
        fn is_live(&self) -> bool {
            true
        }
        fn countdown_sink(&self) -> Option<Arc<dyn DisplaySink>> {
            None
        }
        fn text_sink(&self) -> Option<Arc<dyn TextSink>> {
            None
        }
        fn set_phase(&self, _phase: DecayPhase) {}
    }

    #[test]
    fn stats_on_fresh_scheduler() {
        let sched = CorruptionScheduler::default();
        assert_eq!(
            sched.stats(),
            SchedulerStats {
                active: true,
                active_timers: 0,
                corruption_chars: 13,
            }
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = DecayConfig {
            alphabet: Vec::new(),
            ..DecayConfig::default()
        };
        assert!(CorruptionScheduler::new(config).is_err());
    }

    #[test]
    fn start_inactive_from_config() {
        let config = DecayConfig {
            start_active: false,
            ..DecayConfig::default()
        };
        let sched = CorruptionScheduler::with_seed(config, 1).unwrap();
        assert!(!sched.is_active());
    }

    #[test]
    fn toggle_flips_and_reports_state() {
        let sched = CorruptionScheduler::default();
        assert!(!sched.set_active(None));
        assert!(sched.set_active(None));
        assert!(!sched.set_active(Some(false)));
        assert!(!sched.set_active(Some(false)));
        assert!(sched.set_active(Some(true)));
    }

    #[test]
    fn register_outside_runtime_is_silent() {
        let sched = CorruptionScheduler::default();
        let meta = CorruptionMetadata::new("m1", 4, 10);
        sched.register(Arc::new(Bare), Some(&meta));
        assert_eq!(sched.stats().active_timers, 0);
        assert_eq!(sched.countdown_count(), 0);
    }

    #[test]
    fn countdown_display_fraction_tiers() {
        let sched = CorruptionScheduler::default();
        assert_eq!(
            sched.countdown_display(10, 10),
            CountdownDisplay::Counting { remaining: 10, tier: CountdownTier::High }
        );
        assert_eq!(
            sched.countdown_display(7, 10),
            CountdownDisplay::Counting { remaining: 7, tier: CountdownTier::Medium }
        );
        assert_eq!(sched.countdown_display(0, 10), CountdownDisplay::Corrupting);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_countdown_display_still_arms_decay() {
        let sched = CorruptionScheduler::default();
        let meta = CorruptionMetadata::new("m1", 4, 10);
        sched.register(Arc::new(Bare), Some(&meta));
        assert_eq!(sched.countdown_count(), 0);
        assert!(sched.is_pending("m1"));
    }
}
