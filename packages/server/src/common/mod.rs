// Common types and utilities shared across the application

pub mod auth;
pub mod entity_ids;
pub mod errors;
pub mod id;

pub use auth::{Actor, AdminCapability};
pub use entity_ids::{ActionId, DraftId, LineageId, MemberId};
pub use errors::ReviewError;
pub use id::Id;
