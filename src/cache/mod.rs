//! Durable fallback snapshots for offline support.
//!
//! This module persists the last known-good server data as named slots so a
//! failed fetch can degrade to stale-but-real data instead of nothing.
//! Snapshots are overwritten on every successful fetch and have no expiry.

mod store;

pub use store::{NoopSnapshots, Snapshot, SnapshotStore, SqliteSnapshots};
