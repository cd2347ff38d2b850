//! In-memory message double that records everything the scheduler does to it.

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use tokio::time::Instant;
use wired_decay::{CountdownDisplay, DecayPhase, DisplaySink, MessageEntity, TextSink};

/// Install a test subscriber once; `RUST_LOG=wired_decay=debug` shows the
/// scheduler's trace.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wired_decay=info".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Milliseconds since the message was created, on the tokio clock.
fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

pub struct Countdown {
    start: Instant,
    renders: Mutex<Vec<(u64, CountdownDisplay)>>,
}

impl Countdown {
    pub fn renders(&self) -> Vec<(u64, CountdownDisplay)> {
        self.renders.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<CountdownDisplay> {
        self.renders.lock().unwrap().last().map(|(_, d)| *d)
    }
}

impl DisplaySink for Countdown {
    fn render(&self, state: CountdownDisplay) {
        self.renders
            .lock()
            .unwrap()
            .push((elapsed_ms(self.start), state));
    }
}

pub struct Text {
    start: Instant,
    original: String,
    current: Mutex<String>,
    history: Mutex<Vec<(u64, String)>>,
}

impl Text {
    pub fn current(&self) -> String {
        self.current.lock().unwrap().clone()
    }

    pub fn history(&self) -> Vec<(u64, String)> {
        self.history.lock().unwrap().clone()
    }

    pub fn untouched(&self) -> bool {
        self.history.lock().unwrap().is_empty() && self.current() == self.original
    }
}

impl TextSink for Text {
    fn text(&self) -> String {
        self.current()
    }

    fn set_text(&self, text: &str) {
        *self.current.lock().unwrap() = text.to_string();
        self.history
            .lock()
            .unwrap()
            .push((elapsed_ms(self.start), text.to_string()));
    }
}

pub struct Message {
    live: AtomicBool,
    pub countdown: Option<Arc<Countdown>>,
    pub text: Option<Arc<Text>>,
    phases: Mutex<Vec<DecayPhase>>,
}

impl Message {
    /// A live message with both a countdown display and a text element.
    pub fn new(text: &str) -> Arc<Self> {
        Self::build(text, true, true)
    }

    pub fn without_countdown(text: &str) -> Arc<Self> {
        Self::build(text, false, true)
    }

    pub fn without_text() -> Arc<Self> {
        Self::build("", true, false)
    }

    fn build(text: &str, countdown: bool, has_text: bool) -> Arc<Self> {
        let start = Instant::now();
        Arc::new(Self {
            live: AtomicBool::new(true),
            countdown: countdown.then(|| {
                Arc::new(Countdown {
                    start,
                    renders: Mutex::new(Vec::new()),
                })
            }),
            text: has_text.then(|| {
                Arc::new(Text {
                    start,
                    original: text.to_string(),
                    current: Mutex::new(text.to_string()),
                    history: Mutex::new(Vec::new()),
                })
            }),
            phases: Mutex::new(Vec::new()),
        })
    }

    pub fn remove_from_view(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    pub fn phases(&self) -> Vec<DecayPhase> {
        self.phases.lock().unwrap().clone()
    }

    pub fn text(&self) -> &Text {
        self.text.as_deref().expect("message has a text element")
    }

    pub fn countdown(&self) -> &Countdown {
        self.countdown
            .as_deref()
            .expect("message has a countdown display")
    }
}

impl MessageEntity for Message {
    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn countdown_sink(&self) -> Option<Arc<dyn DisplaySink>> {
        self.countdown
            .clone()
            .map(|c| c as Arc<dyn DisplaySink>)
    }

    fn text_sink(&self) -> Option<Arc<dyn TextSink>> {
        self.text.clone().map(|t| t as Arc<dyn TextSink>)
    }

    fn set_phase(&self, phase: DecayPhase) {
        self.phases.lock().unwrap().push(phase);
    }
}
