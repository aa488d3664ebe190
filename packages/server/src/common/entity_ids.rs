//! Typed ID aliases for the moderation domain.
//!
//! One marker type per entity keeps ID usage honest across the codebase:
//! a `DraftId` can never silently stand in for a `LineageId` even though
//! both are UUIDs on the wire.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for draft rows (one proposed change version).
pub struct Draft;

/// Marker type for moderation ledger entries.
pub struct ModerationAction;

/// Marker type for an entity lineage: the identity of "this service" or
/// "this vendor" across all of its draft versions and its live record.
pub struct EntityLineage;

/// Marker type for members (vendors and administrators).
pub struct Member;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for a single draft version row.
pub type DraftId = Id<Draft>;

/// Typed ID for one moderation ledger entry.
pub type ActionId = Id<ModerationAction>;

/// Typed ID for an entity lineage.
pub type LineageId = Id<EntityLineage>;

/// Typed ID for a member (vendor or administrator).
pub type MemberId = Id<Member>;
