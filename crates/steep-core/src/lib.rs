//! Shared abstractions for the Steep storefront data layer.
//!
//! This crate provides:
//! - `Clock` - Injectable time source (`SystemClock` in production,
//!   `ManualClock` in tests)
//! - `Memo` - Explicit memoization slot for derived values
//!
//! Both exist so the stores built on top of them can be constructed
//! explicitly and tested in isolation, instead of reading ambient
//! process-wide state.

mod clock;
mod memo;

pub use clock::{system_clock, Clock, ManualClock, SharedClock, SystemClock, Timestamp};
pub use memo::Memo;
