//! Background Tasks Module
//!
//! Tasks that remove expired entries outside any caller's control flow.
//!
//! # Tasks
//! - Deferred deletion: one-shot removal per entry (eager strategy)
//! - Expiry sweep: periodic purge of the whole store (lazy strategy)

mod deferred;
mod sweep;

pub(crate) use deferred::schedule_deletion;
pub(crate) use sweep::SweepControl;
