//! Cross-cutting helpers for the server crate.

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};
