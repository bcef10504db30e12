//! `daybook-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod clock;
pub mod email;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use email::Email;
pub use session::SessionId;
