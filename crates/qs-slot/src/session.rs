//! Credit session state machine
//!
//! ```text
//!   ALIVE ──pull, credits > 0──▶ ALIVE
//!   ALIVE ──pull, credits <= 0─▶ OVER   (terminal)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::paytable::PayTable;
use crate::symbols::Triple;

/// Credits charged per pull
pub const PULL_COST: i64 = 1;

/// Starting balance of a fresh session
pub const DEFAULT_STARTING_CREDITS: i64 = 20;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Alive,
    Over,
}

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_pulls: u64,
    pub total_staked: u64,
    pub total_paid: u64,
    pub wins: u64,
    pub biggest_payout: u32,
}

impl SessionStats {
    /// Return to player in percent
    pub fn rtp(&self) -> f64 {
        if self.total_staked > 0 {
            (self.total_paid as f64 / self.total_staked as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Share of pulls that paid something, in percent
    pub fn hit_rate(&self) -> f64 {
        if self.total_pulls > 0 {
            (self.wins as f64 / self.total_pulls as f64) * 100.0
        } else {
            0.0
        }
    }

    fn record(&mut self, payout: u32) {
        self.total_pulls += 1;
        self.total_staked += PULL_COST as u64;
        self.total_paid += payout as u64;
        if payout > 0 {
            self.wins += 1;
        }
        self.biggest_payout = self.biggest_payout.max(payout);
    }
}

/// What a single pull did to the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullOutcome {
    /// Reels shown
    pub triple: Triple,
    /// Credits won
    pub payout: u32,
    /// Paytable rule that fired
    pub rule: Option<String>,
    /// Balance after cost and payout
    pub credits: i64,
    /// Can the player pull again?
    pub alive: bool,
}

impl PullOutcome {
    /// Did this pull end the game?
    pub fn is_game_over(&self) -> bool {
        !self.alive
    }
}

/// One player's credit balance from first pull to game over
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    credits: i64,
    starting_credits: i64,
    status: SessionStatus,
    stats: SessionStats,
}

impl SessionState {
    /// Open a session with a positive balance
    pub fn new(starting_credits: i64) -> SlotResult<Self> {
        if starting_credits <= 0 {
            return Err(SlotError::InvalidStartingCredits(starting_credits));
        }
        Ok(Self {
            credits: starting_credits,
            starting_credits,
            status: SessionStatus::Alive,
            stats: SessionStats::default(),
        })
    }

    /// Current balance
    pub fn credits(&self) -> i64 {
        self.credits
    }

    /// Balance the session started with
    pub fn starting_credits(&self) -> i64 {
        self.starting_credits
    }

    /// Lifecycle state
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Can the player pull?
    pub fn is_alive(&self) -> bool {
        self.status == SessionStatus::Alive
    }

    /// Session statistics
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Charge one pull and pay out the triple
    ///
    /// Fails with [`SlotError::SessionOver`] once the balance has run out;
    /// a rejected pull leaves the session untouched.
    pub fn pull(&mut self, triple: Triple, paytable: &PayTable) -> SlotResult<PullOutcome> {
        if !self.is_alive() {
            return Err(SlotError::SessionOver);
        }

        let eval = paytable.evaluate_detailed(&triple);
        self.credits -= PULL_COST;
        self.credits += eval.payout as i64;
        self.stats.record(eval.payout);

        if self.credits <= 0 {
            self.status = SessionStatus::Over;
            log::info!(
                "[Session] game over after {} pulls",
                self.stats.total_pulls
            );
        }

        Ok(PullOutcome {
            triple,
            payout: eval.payout,
            rule: eval.rule,
            credits: self.credits,
            alive: self.is_alive(),
        })
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            credits: DEFAULT_STARTING_CREDITS,
            starting_credits: DEFAULT_STARTING_CREDITS,
            status: SessionStatus::Alive,
            stats: SessionStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Symbol;
    use approx::assert_relative_eq;

    #[test]
    fn test_jackpot_pull() {
        let table = PayTable::classic();
        let mut session = SessionState::new(20).unwrap();
        let outcome = session
            .pull(Triple::new(Symbol::Seven, Symbol::Seven, Symbol::Seven), &table)
            .unwrap();
        assert_eq!(outcome.payout, 700);
        assert_eq!(outcome.credits, 719);
        assert!(outcome.alive);
    }

    #[test]
    fn test_losing_pull_costs_one() {
        let table = PayTable::classic();
        let mut session = SessionState::new(20).unwrap();
        let outcome = session
            .pull(Triple::new(Symbol::Cherry, Symbol::Grape, Symbol::Lemon), &table)
            .unwrap();
        assert_eq!(outcome.payout, 0);
        assert_eq!(outcome.rule, None);
        assert_eq!(outcome.credits, 19);
        assert!(outcome.alive);
    }

    #[test]
    fn test_last_credit_ends_session() {
        let table = PayTable::classic();
        let mut session = SessionState::new(1).unwrap();
        let outcome = session
            .pull(Triple::new(Symbol::Lemon, Symbol::Orange, Symbol::Grape), &table)
            .unwrap();
        assert_eq!(outcome.credits, 0);
        assert!(outcome.is_game_over());
        assert_eq!(session.status(), SessionStatus::Over);

        let again = session.pull(Triple::new(Symbol::Seven, Symbol::Seven, Symbol::Seven), &table);
        assert!(matches!(again, Err(SlotError::SessionOver)));
        assert_eq!(session.credits(), 0);
        assert_eq!(session.stats().total_pulls, 1);
    }

    #[test]
    fn test_single_bell_keeps_balance() {
        let table = PayTable::classic();
        let mut session = SessionState::new(1).unwrap();
        let outcome = session
            .pull(Triple::new(Symbol::Bell, Symbol::Grape, Symbol::Lemon), &table)
            .unwrap();
        assert_eq!(outcome.credits, 1);
        assert!(outcome.alive);
    }

    #[test]
    fn test_rejects_non_positive_start() {
        assert!(matches!(
            SessionState::new(0),
            Err(SlotError::InvalidStartingCredits(0))
        ));
        assert!(SessionState::new(-5).is_err());
    }

    #[test]
    fn test_balance_accounting() {
        let table = PayTable::classic();
        let mut session = SessionState::new(20).unwrap();
        let sequence = [
            Triple::new(Symbol::Bell, Symbol::Bell, Symbol::Grape),
            Triple::new(Symbol::Cherry, Symbol::Grape, Symbol::Lemon),
            Triple::new(Symbol::Orange, Symbol::Orange, Symbol::Orange),
            Triple::new(Symbol::Bell, Symbol::Seven, Symbol::Seven),
        ];

        let mut paid = 0i64;
        for triple in sequence {
            paid += session.pull(triple, &table).unwrap().payout as i64;
        }

        assert_eq!(session.credits(), 20 - sequence.len() as i64 + paid);
        assert_eq!(paid, 5 + 20 + 1);
        assert_eq!(session.stats().wins, 3);
        assert_eq!(session.stats().biggest_payout, 20);
        assert_relative_eq!(session.stats().hit_rate(), 75.0);
        assert_relative_eq!(session.stats().rtp(), 650.0);
    }
}
