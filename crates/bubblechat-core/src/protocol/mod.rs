//! Store protocol modules.
//!
//! - `paths`: key-tree paths and the per-room layout.
//! - `push_id`: store-assigned, chronologically sortable child keys.
//! - `records`: JSON shapes stored at each path, plus snapshot decoders.
//! - `text`: the JSON envelope spoken by the gateway's WebSocket lane.
//!
//! Decoders are panic-free: malformed records are skipped and logged instead
//! of failing the whole snapshot, so one bad write cannot blank a room.

pub mod paths;
pub mod push_id;
pub mod records;
pub mod text;
