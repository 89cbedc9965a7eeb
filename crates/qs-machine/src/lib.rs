//! # qs-machine: Quantum slot machine
//!
//! Wires the slot model to the reel providers:
//!
//! ```text
//! MachineConfig (yaml/json)
//!     │ build_machine()
//!     v
//! SlotMachine ──next_triple(kind)──▶ TripleProvider (TripleSource)
//!     │
//!     ├── SessionState::pull(triple, &PayTable)
//!     └── DisplaySink (reels, payout, credits, game over)
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod machine;

pub use config::*;
pub use display::*;
pub use error::*;
pub use machine::*;
