//! Reel symbols and the three-reel triple

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};

/// Number of reels on the machine
pub const REEL_COUNT: usize = 3;

/// Bits consumed per reel draw
pub const DRAW_BITS: u32 = 3;

/// Exclusive upper bound of a single reel draw
pub const DRAW_RANGE: u8 = 1 << DRAW_BITS;

/// A reel face
///
/// `Blank` is the "waiting" face shown while a pull is in flight. Every other
/// symbol corresponds to one 3-bit draw: `Bell` is draw 0, `Seven` is draw 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i8)]
pub enum Symbol {
    Blank = -1,
    Bell = 0,
    Cherry = 1,
    Grape = 2,
    Lemon = 3,
    Orange = 4,
    Strawberry = 5,
    Watermelon = 6,
    Seven = 7,
}

impl Symbol {
    /// All nine faces, blank first
    pub const ALL: [Symbol; 9] = [
        Symbol::Blank,
        Symbol::Bell,
        Symbol::Cherry,
        Symbol::Grape,
        Symbol::Lemon,
        Symbol::Orange,
        Symbol::Strawberry,
        Symbol::Watermelon,
        Symbol::Seven,
    ];

    /// Faces a draw can land on, indexed by draw value
    pub const REEL: [Symbol; 8] = [
        Symbol::Bell,
        Symbol::Cherry,
        Symbol::Grape,
        Symbol::Lemon,
        Symbol::Orange,
        Symbol::Strawberry,
        Symbol::Watermelon,
        Symbol::Seven,
    ];

    /// Map a 3-bit draw onto its reel face
    pub fn from_draw(draw: u8) -> SlotResult<Self> {
        Self::REEL
            .get(draw as usize)
            .copied()
            .ok_or(SlotError::InvalidDraw(draw))
    }

    /// Look up a face by its signed index (-1..=7)
    pub fn from_index(index: i8) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.index() == index)
    }

    /// Signed index of this face
    pub fn index(self) -> i8 {
        self as i8
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Symbol::Blank => "BLANK",
            Symbol::Bell => "BELL",
            Symbol::Cherry => "CHERRY",
            Symbol::Grape => "GRAPE",
            Symbol::Lemon => "LEMON",
            Symbol::Orange => "ORANGE",
            Symbol::Strawberry => "STRAWBERRY",
            Symbol::Watermelon => "WATERMELON",
            Symbol::Seven => "SEVEN",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One symbol per reel, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple([Symbol; REEL_COUNT]);

impl Triple {
    /// Create a triple from three faces
    pub fn new(a: Symbol, b: Symbol, c: Symbol) -> Self {
        Self([a, b, c])
    }

    /// All three reels showing the waiting face
    pub fn blank() -> Self {
        Self([Symbol::Blank; REEL_COUNT])
    }

    /// Build from three raw draws, each in `0..8`
    pub fn from_draws(draws: [u8; REEL_COUNT]) -> SlotResult<Self> {
        Ok(Self([
            Symbol::from_draw(draws[0])?,
            Symbol::from_draw(draws[1])?,
            Symbol::from_draw(draws[2])?,
        ]))
    }

    /// Faces in reel order
    pub fn symbols(&self) -> [Symbol; REEL_COUNT] {
        self.0
    }

    /// Face on a given reel
    pub fn reel(&self, index: usize) -> Option<Symbol> {
        self.0.get(index).copied()
    }

    /// How many reels show `symbol`
    pub fn count(&self, symbol: Symbol) -> usize {
        self.0.iter().filter(|&&s| s == symbol).count()
    }

    /// Every reel shows `symbol`
    pub fn all(&self, symbol: Symbol) -> bool {
        self.count(symbol) == REEL_COUNT
    }
}

impl From<[Symbol; REEL_COUNT]> for Triple {
    fn from(symbols: [Symbol; REEL_COUNT]) -> Self {
        Self(symbols)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {}", self.0[0], self.0[1], self.0[2])
    }
}
