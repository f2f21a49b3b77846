//! StayWake daemon: CLI surface, persisted timer state, the tokio-backed
//! host timer and the single-owner event loop driving the engine. The
//! actual power inhibition is the embedding platform's concern; this
//! process reports arm/expiry through the [`runtime::Notifier`] seam.

pub mod cli;
pub mod host;
pub mod runtime;
pub mod store;
