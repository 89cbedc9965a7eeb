//! Text rendering of the cabinet

use std::io::Write;

use qs_entropy::{EntropyError, SourceKind};
use qs_machine::DisplaySink;
use qs_slot::{SessionStats, Triple};

/// Writes reels, payouts and the credit box as plain lines
pub struct TerminalDisplay<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            log::warn!("[Terminal] write failed: {}", e);
        }
    }
}

/// Credit box contents
pub fn credit_box(credits: i64) -> String {
    let label = if credits <= 0 {
        "LOSE".to_string()
    } else {
        credits.to_string()
    };
    format!("[ CREDITS: {:>5} ]", label)
}

/// Reel window, one symbol name per reel
pub fn reel_window(triple: &Triple) -> String {
    let names: Vec<String> = triple
        .symbols()
        .iter()
        .map(|s| format!("{:^10}", s.name()))
        .collect();
    format!("|{}|", names.join("|"))
}

impl<W: Write + Send> DisplaySink for TerminalDisplay<W> {
    fn reels_spinning(&mut self, source: SourceKind) {
        self.line(&format!("spinning ({})...", source));
    }

    fn show_reels(&mut self, triple: &Triple) {
        self.line(&reel_window(triple));
    }

    fn show_payout(&mut self, payout: u32, rule: Option<&str>) {
        if payout > 0 {
            self.line(&format!("WIN {} ({})", payout, rule.unwrap_or("paytable")));
        }
    }

    fn pull_failed(&mut self, error: &EntropyError) {
        let hint = if error.is_retryable() { " (try again)" } else { "" };
        self.line(&format!("no spin: {}{}", error, hint));
    }

    fn credits_changed(&mut self, credits: i64) {
        self.line(&credit_box(credits));
    }

    fn game_over(&mut self, stats: &SessionStats) {
        self.line(&format!(
            "GAME OVER after {} pulls: paid {} of {} staked (rtp {:.1}%, hit rate {:.1}%). Type 'new' to play again.",
            stats.total_pulls,
            stats.total_paid,
            stats.total_staked,
            stats.rtp(),
            stats.hit_rate()
        ));
    }

    fn sources_changed(&mut self, sources: &[SourceKind]) {
        let names: Vec<&str> = sources.iter().map(|s| s.as_str()).collect();
        self.line(&format!("ready: {}", names.join(", ")));
    }
}
