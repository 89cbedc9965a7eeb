//! # qs-entropy: Reel randomness for the quantum slot machine
//!
//! Three interchangeable providers fill the reels:
//!
//! - **local-simulator**: in-process register sampler, always available
//! - **remote-device**: batches of readouts from the least busy quantum device,
//!   buffered and refilled in the background
//! - **external-rng**: a public QRNG service over HTTP
//!
//! ## Architecture
//!
//! ```text
//! TripleSource ("local-simulator" | "remote-device" | "external-rng")
//!     │
//!     ├── LocalSampler        (9 qubits, 1 shot → 3 draws)
//!     ├── RemoteDeviceBatch   (refill worker ─▶ DeviceRegistry::least_busy)
//!     └── ExternalHttpRng     (GET hex bytes → top 3 bits)
//!           │
//!           v
//!     [u8; 3] draws → qs_slot::Triple
//! ```

pub mod device;
pub mod error;
pub mod http;
pub mod kind;
pub mod local;
pub mod remote;
pub mod retry;
pub mod source;

pub use device::*;
pub use error::*;
pub use http::*;
pub use kind::*;
pub use local::*;
pub use remote::*;
pub use retry::*;
pub use source::*;
