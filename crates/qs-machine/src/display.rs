//! Display sink: what the machine tells its front-end
//!
//! The machine holds one sink and calls it by name at each step of a pull.
//! Front-ends implement the hooks they care about.

use std::sync::Arc;

use parking_lot::Mutex;

use qs_entropy::{EntropyError, SourceKind};
use qs_slot::{PullOutcome, SessionStats, Triple};

/// Receives machine updates, in order, on the pulling task
pub trait DisplaySink: Send {
    // ═══════════════════════════════════════════════════════════════════════════
    // PULL
    // ═══════════════════════════════════════════════════════════════════════════

    /// A pull was accepted and a triple has been requested
    fn reels_spinning(&mut self, _source: SourceKind) {}

    /// Reel faces: all blank while a pull is in flight, then the landed triple
    fn show_reels(&mut self, triple: &Triple);

    /// Credits won by the last pull (0 on a loss)
    fn show_payout(&mut self, _payout: u32, _rule: Option<&str>) {}

    /// The triple could not be obtained; the session is unchanged
    fn pull_failed(&mut self, _error: &EntropyError) {}

    // ═══════════════════════════════════════════════════════════════════════════
    // SESSION
    // ═══════════════════════════════════════════════════════════════════════════

    /// New balance
    fn credits_changed(&mut self, credits: i64);

    /// Balance hit zero
    fn game_over(&mut self, _stats: &SessionStats) {}

    /// Providers ready to serve a pull
    fn sources_changed(&mut self, _sources: &[SourceKind]) {}
}

/// One display update
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Spinning(SourceKind),
    Reels(Triple),
    Payout(u32),
    Failed(String),
    Credits(i64),
    GameOver { total_pulls: u64 },
    Sources(Vec<SourceKind>),
}

/// Sink that records every update; clones share the same log
#[derive(Debug, Default, Clone)]
pub struct RecordingDisplay {
    events: Arc<Mutex<Vec<DisplayEvent>>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().clone()
    }

    /// Drop recorded events
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn push(&self, event: DisplayEvent) {
        self.events.lock().push(event);
    }
}

impl DisplaySink for RecordingDisplay {
    fn reels_spinning(&mut self, source: SourceKind) {
        self.push(DisplayEvent::Spinning(source));
    }

    fn show_reels(&mut self, triple: &Triple) {
        self.push(DisplayEvent::Reels(*triple));
    }

    fn show_payout(&mut self, payout: u32, _rule: Option<&str>) {
        self.push(DisplayEvent::Payout(payout));
    }

    fn pull_failed(&mut self, error: &EntropyError) {
        self.push(DisplayEvent::Failed(error.to_string()));
    }

    fn credits_changed(&mut self, credits: i64) {
        self.push(DisplayEvent::Credits(credits));
    }

    fn game_over(&mut self, stats: &SessionStats) {
        self.push(DisplayEvent::GameOver {
            total_pulls: stats.total_pulls,
        });
    }

    fn sources_changed(&mut self, sources: &[SourceKind]) {
        self.push(DisplayEvent::Sources(sources.to_vec()));
    }
}

/// Forward a pull's result to a sink in display order
pub fn render_outcome(sink: &mut dyn DisplaySink, outcome: &PullOutcome) {
    sink.show_reels(&outcome.triple);
    sink.show_payout(outcome.payout, outcome.rule.as_deref());
    sink.credits_changed(outcome.credits);
}
