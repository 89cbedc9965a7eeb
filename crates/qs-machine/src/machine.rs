//! Slot machine orchestration
//!
//! A pull is atomic: the triple is obtained first and the session is only
//! touched once it is in hand. Any failure before that leaves credits,
//! status and stats exactly as they were.

use qs_entropy::{SourceKind, TripleProvider};
use qs_slot::{PayTable, PullOutcome, SessionState, SlotConfig, SlotError, Triple};

use crate::display::{DisplaySink, render_outcome};
use crate::error::MachineResult;

/// One cabinet: session, paytable, reel provider and display
pub struct SlotMachine<P: TripleProvider> {
    provider: P,
    paytable: PayTable,
    starting_credits: i64,
    session: SessionState,
    source: SourceKind,
    display: Box<dyn DisplaySink>,
}

impl<P: TripleProvider> SlotMachine<P> {
    /// Open the first session and show the starting balance
    pub fn new(provider: P, config: &SlotConfig, display: Box<dyn DisplaySink>) -> MachineResult<Self> {
        let session = config.new_session()?;
        let mut machine = Self {
            provider,
            paytable: config.paytable.clone(),
            starting_credits: config.starting_credits,
            session,
            source: SourceKind::default(),
            display,
        };
        machine.display.credits_changed(machine.session.credits());
        Ok(machine)
    }

    /// Start with a different selected provider
    pub fn with_source(mut self, source: SourceKind) -> Self {
        self.source = source;
        self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn credits(&self) -> i64 {
        self.session.credits()
    }

    pub fn paytable(&self) -> &PayTable {
        &self.paytable
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Provider used by [`SlotMachine::spin`]
    pub fn source(&self) -> SourceKind {
        self.source
    }

    /// Select the provider for later spins
    pub fn select_source(&mut self, source: SourceKind) {
        log::info!("[SlotMachine] source: {} -> {}", self.source, source);
        self.source = source;
    }

    /// Select by name; an unknown name changes nothing
    pub fn select_source_by_name(&mut self, selector: &str) -> MachineResult<SourceKind> {
        let source: SourceKind = selector.parse()?;
        self.select_source(source);
        Ok(source)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PULLS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Pull with the selected provider
    pub async fn spin(&mut self) -> MachineResult<PullOutcome> {
        self.pull(self.source).await
    }

    /// Pull the lever once using `source` for the reels
    ///
    /// The reels show blank faces until the triple arrives.
    pub async fn pull(&mut self, source: SourceKind) -> MachineResult<PullOutcome> {
        if !self.session.is_alive() {
            return Err(SlotError::SessionOver.into());
        }

        self.display.reels_spinning(source);
        self.display.show_reels(&Triple::blank());
        let triple = match self.provider.next_triple(source).await {
            Ok(triple) => triple,
            Err(e) => {
                log::warn!("[SlotMachine] {} could not fill the reels: {}", source, e);
                self.display.pull_failed(&e);
                return Err(e.into());
            }
        };

        let outcome = self.session.pull(triple, &self.paytable)?;
        log::debug!(
            "[SlotMachine] {} via {} -> payout {}, credits {}",
            outcome.triple,
            source,
            outcome.payout,
            outcome.credits
        );

        render_outcome(self.display.as_mut(), &outcome);
        if outcome.is_game_over() {
            self.display.game_over(self.session.stats());
        }
        Ok(outcome)
    }

    /// Pull with a provider named by string
    ///
    /// The name is checked before the session or any provider is touched.
    pub async fn pull_with(&mut self, selector: &str) -> MachineResult<PullOutcome> {
        let source: SourceKind = selector.parse()?;
        self.pull(source).await
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SESSION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Providers that can serve a pull right now
    pub async fn available_sources(&mut self) -> Vec<SourceKind> {
        let sources = self.provider.available_sources().await;
        self.display.sources_changed(&sources);
        sources
    }

    /// Replace the session with a fresh one at the configured balance
    pub fn new_session(&mut self) -> MachineResult<()> {
        let previous = self.session.stats().clone();
        self.session = SessionState::new(self.starting_credits)?;
        log::info!(
            "[SlotMachine] new session with {} credits (previous: {} pulls, rtp {:.1}%)",
            self.starting_credits,
            previous.total_pulls,
            previous.rtp()
        );
        self.display.credits_changed(self.session.credits());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayEvent, RecordingDisplay};
    use qs_entropy::{LocalSampler, TripleSource};

    fn machine(credits: i64) -> (SlotMachine<TripleSource>, RecordingDisplay) {
        let display = RecordingDisplay::new();
        let config = SlotConfig {
            starting_credits: credits,
            ..SlotConfig::default()
        };
        let machine = SlotMachine::new(
            TripleSource::local_only(LocalSampler::seeded(9)),
            &config,
            Box::new(display.clone()),
        )
        .unwrap();
        (machine, display)
    }

    #[test]
    fn test_new_machine_shows_balance() {
        let (machine, display) = machine(20);
        assert_eq!(machine.credits(), 20);
        assert_eq!(machine.source(), SourceKind::LocalSimulator);
        assert_eq!(display.events(), vec![DisplayEvent::Credits(20)]);
    }

    #[test]
    fn test_rejects_non_positive_balance() {
        let config = SlotConfig {
            starting_credits: 0,
            ..SlotConfig::default()
        };
        let result = SlotMachine::new(
            TripleSource::local_only(LocalSampler::seeded(9)),
            &config,
            Box::new(RecordingDisplay::new()),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_local_pull_matches_paytable() {
        let (mut machine, _display) = machine(20);
        let outcome = machine.spin().await.unwrap();
        assert_eq!(outcome.payout, machine.paytable().evaluate(&outcome.triple));
        assert_eq!(outcome.credits, 20 - 1 + outcome.payout as i64);
        assert_eq!(machine.session().stats().total_pulls, 1);
    }

    #[test]
    fn test_select_source_by_name() {
        let (mut machine, _display) = machine(20);
        assert_eq!(
            machine.select_source_by_name("external-rng").unwrap(),
            SourceKind::ExternalRng
        );
        assert!(machine.select_source_by_name("dice").is_err());
        assert_eq!(machine.source(), SourceKind::ExternalRng);
    }
}
