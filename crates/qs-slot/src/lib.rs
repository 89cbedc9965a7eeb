//! # qs-slot: Quantum Slot Machine model
//!
//! The game side of a three-reel slot machine whose reels are driven by
//! quantum random numbers. Everything here is pure and synchronous; where the
//! randomness comes from is the business of `qs-entropy`.
//!
//! ## Architecture
//!
//! ```text
//! [u8; 3] draws ──▶ Triple ──▶ PayTable::evaluate ──▶ payout
//!                                                      │
//!                                                      v
//!                                SessionState::pull (−1, +payout, ALIVE/OVER)
//! ```

pub mod config;
pub mod error;
pub mod paytable;
pub mod session;
pub mod symbols;

pub use config::*;
pub use error::*;
pub use paytable::*;
pub use session::*;
pub use symbols::*;
