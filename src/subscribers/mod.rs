//! # Event subscribers.
//!
//! [`Subscribe`] is the extension point for observing lifecycle events;
//! [`SubscriberSet`] fans each event out to every subscriber without blocking
//! the node operation that published it.
//!
//! ## Architecture
//! ```text
//! lifecycle op ── publish(Event) ──► Bus ──► supervisor listener ──► SubscriberSet
//!                                                                 ┌──────┴──────┐
//!                                                                 ▼             ▼
//!                                                             LogWriter      Custom
//! ```
//!
//! ## Built-in
//! - [`LogWriter`] (feature `logging`): writes events through `tracing`.

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
