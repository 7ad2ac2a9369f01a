//! Shared primitive types used across the entire crate.

/// A host tick. Every entity gets at most one primary action per tick.
pub type Tick = u64;

/// A stable, opaque identifier for any object the host knows about.
pub type EntityId = String;

/// The canonical run identifier.
pub type RunId = String;

/// Name of a room, e.g. `W1N1`.
pub type RoomName = String;
