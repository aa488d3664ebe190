pub mod draft;
pub mod live_entity;
pub mod moderation_action;

pub use draft::{Draft, DraftState, EntityKind};
pub use live_entity::{validate_payload, LiveEntity};
pub use moderation_action::{ModerationAction, ModerationActionType};
