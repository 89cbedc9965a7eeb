//! Paytable and payout evaluation
//!
//! Rules are checked in order and the first match pays. A triple that matches
//! no rule pays nothing, so evaluation is total.

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::symbols::{DRAW_RANGE, REEL_COUNT, Symbol, Triple};

/// Pattern a triple has to show for a rule to pay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayPattern {
    /// Every reel shows the symbol
    AllOf { symbol: Symbol },
    /// Exactly `count` reels show the symbol
    Exactly { symbol: Symbol, count: u8 },
}

impl PayPattern {
    /// Check the pattern against a triple
    pub fn matches(&self, triple: &Triple) -> bool {
        match *self {
            PayPattern::AllOf { symbol } => triple.all(symbol),
            PayPattern::Exactly { symbol, count } => triple.count(symbol) == count as usize,
        }
    }
}

/// A single paytable line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaytableRule {
    /// Rule name (e.g., "three sevens")
    pub name: String,
    /// Winning pattern
    pub pattern: PayPattern,
    /// Credits paid on match
    pub payout: u32,
}

impl PaytableRule {
    /// All three reels show `symbol`
    pub fn all_of(name: impl Into<String>, symbol: Symbol, payout: u32) -> Self {
        Self {
            name: name.into(),
            pattern: PayPattern::AllOf { symbol },
            payout,
        }
    }

    /// Exactly `count` reels show `symbol`
    pub fn exactly(name: impl Into<String>, symbol: Symbol, count: u8, payout: u32) -> Self {
        Self {
            name: name.into(),
            pattern: PayPattern::Exactly { symbol, count },
            payout,
        }
    }
}

/// Result of evaluating one triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Credits won
    pub payout: u32,
    /// Name of the rule that fired, `None` when nothing matched
    pub rule: Option<String>,
}

impl Evaluation {
    /// Did this triple pay anything?
    pub fn is_win(&self) -> bool {
        self.payout > 0
    }
}

/// Ordered paytable
///
/// The rule order is fixed once the table is built; there is no way to insert
/// or reorder rules afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PaytableRule>", into = "Vec<PaytableRule>")]
pub struct PayTable {
    rules: Vec<PaytableRule>,
}

impl PayTable {
    /// Build a table from rules in precedence order
    pub fn new(rules: Vec<PaytableRule>) -> SlotResult<Self> {
        for rule in &rules {
            if let PayPattern::Exactly { count, .. } = rule.pattern {
                if count as usize > REEL_COUNT {
                    return Err(SlotError::InvalidPaytable(format!(
                        "rule '{}' asks for {} of {} reels",
                        rule.name, count, REEL_COUNT
                    )));
                }
            }
            if rule.name.trim().is_empty() {
                return Err(SlotError::InvalidPaytable("rule with empty name".into()));
            }
        }
        Ok(Self { rules })
    }

    /// The classic three-reel paytable
    pub fn classic() -> Self {
        Self {
            rules: vec![
                PaytableRule::all_of("three sevens", Symbol::Seven, 700),
                PaytableRule::all_of("three watermelons", Symbol::Watermelon, 200),
                PaytableRule::all_of("three lemons", Symbol::Lemon, 60),
                PaytableRule::all_of("three bells", Symbol::Bell, 80),
                PaytableRule::all_of("three cherries", Symbol::Cherry, 40),
                PaytableRule::all_of("three oranges", Symbol::Orange, 20),
                PaytableRule::all_of("three grapes", Symbol::Grape, 15),
                PaytableRule::all_of("three strawberries", Symbol::Strawberry, 10),
                PaytableRule::exactly("two bells", Symbol::Bell, 2, 5),
                PaytableRule::exactly("one bell", Symbol::Bell, 1, 1),
            ],
        }
    }

    /// Rules in precedence order
    pub fn rules(&self) -> &[PaytableRule] {
        &self.rules
    }

    /// Payout for a triple
    pub fn evaluate(&self, triple: &Triple) -> u32 {
        self.matching_rule(triple).map(|r| r.payout).unwrap_or(0)
    }

    /// Payout plus the name of the rule that fired
    pub fn evaluate_detailed(&self, triple: &Triple) -> Evaluation {
        match self.matching_rule(triple) {
            Some(rule) => Evaluation {
                payout: rule.payout,
                rule: Some(rule.name.clone()),
            },
            None => Evaluation {
                payout: 0,
                rule: None,
            },
        }
    }

    fn matching_rule(&self, triple: &Triple) -> Option<&PaytableRule> {
        self.rules.iter().find(|rule| rule.pattern.matches(triple))
    }

    /// Largest single payout the table can award
    pub fn max_payout(&self) -> u32 {
        self.rules.iter().map(|r| r.payout).max().unwrap_or(0)
    }

    /// Average payout per pull when every draw is uniform over `0..8`
    pub fn expected_payout(&self) -> f64 {
        let faces = &Symbol::REEL[..DRAW_RANGE as usize];
        let mut total = 0u64;
        let mut outcomes = 0u64;
        for &a in faces {
            for &b in faces {
                for &c in faces {
                    total += self.evaluate(&Triple::new(a, b, c)) as u64;
                    outcomes += 1;
                }
            }
        }
        total as f64 / outcomes as f64
    }
}

impl Default for PayTable {
    fn default() -> Self {
        Self::classic()
    }
}

impl TryFrom<Vec<PaytableRule>> for PayTable {
    type Error = SlotError;

    fn try_from(rules: Vec<PaytableRule>) -> SlotResult<Self> {
        Self::new(rules)
    }
}

impl From<PayTable> for Vec<PaytableRule> {
    fn from(table: PayTable) -> Self {
        table.rules
    }
}
