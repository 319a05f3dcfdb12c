//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to publish
//! lifecycle transitions of managed nodes and supervisor housekeeping.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: lifecycle operations (`core::lifecycle`), `Supervisor`
//!   (shutdown), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the supervisor's listener, which fans out to the `SubscriberSet`.
//!
//! Events are observability only: the status table is the source of truth and is
//! never rebuilt from events.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
