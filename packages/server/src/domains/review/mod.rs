//! Review domain - draft moderation and versioning workflow
//!
//! Components:
//! - models: draft, moderation action, and live entity records
//! - machines: legal state transitions and review decisions
//! - diff: field-level changeset between a live snapshot and a draft payload
//! - store: the atomicity boundary (Postgres and in-memory implementations)
//! - actions: exposed operations, including the review coordinator

pub mod actions;
pub mod diff;
pub mod machines;
pub mod models;
pub mod store;

pub use actions::*;
pub use diff::{compute_changeset, ChangeEntry};
pub use machines::ReviewDecision;
pub use models::*;
