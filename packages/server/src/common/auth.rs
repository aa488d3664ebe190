//! Authorization gate for moderation operations.
//!
//! Provides a fluent API for admin checks in action code:
//!
//! ```ignore
//! Actor::new(reviewer_id)
//!     .can(AdminCapability::ModerateDrafts)
//!     .check(kernel.identity.as_ref())
//!     .await?;
//! ```
//!
//! The identity collaborator supplies the caller's role; deeper
//! authorization logic lives outside this core.

use crate::common::entity_ids::MemberId;
use crate::common::errors::ReviewError;
use crate::kernel::BaseIdentityService;

/// Capabilities in the moderation core.
///
/// The platform is admin-managed: every capability here requires the ADMIN
/// claim, the enum exists so call sites document what they are gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCapability {
    /// Approve, reject, or send back submitted drafts
    ModerateDrafts,

    /// Full admin access to all operations
    FullAdmin,
}

/// Entry point for authorization checks
pub struct Actor {
    actor_id: MemberId,
}

impl Actor {
    pub fn new(actor_id: MemberId) -> Self {
        Self { actor_id }
    }

    /// Specify what capability the actor needs
    pub fn can(self, capability: AdminCapability) -> CapabilityCheck {
        CapabilityCheck {
            actor_id: self.actor_id,
            capability,
        }
    }
}

/// Builder after specifying capability
pub struct CapabilityCheck {
    actor_id: MemberId,
    capability: AdminCapability,
}

impl CapabilityCheck {
    /// Perform the authorization check against the identity collaborator.
    pub async fn check(self, identity: &dyn BaseIdentityService) -> Result<(), ReviewError> {
        let is_admin = identity.is_admin(self.actor_id).await?;
        if !is_admin {
            tracing::warn!(
                actor_id = %self.actor_id,
                capability = ?self.capability,
                "non-admin attempted a moderation operation"
            );
            return Err(ReviewError::AdminRequired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::MockIdentityService;

    #[tokio::test]
    async fn admin_passes_capability_check() {
        let identity = MockIdentityService::new();
        let admin = MemberId::new();
        identity.grant_admin(admin);

        let result = Actor::new(admin)
            .can(AdminCapability::ModerateDrafts)
            .check(&identity)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn non_admin_is_rejected() {
        let identity = MockIdentityService::new();

        let result = Actor::new(MemberId::new())
            .can(AdminCapability::ModerateDrafts)
            .check(&identity)
            .await;

        assert!(matches!(result, Err(ReviewError::AdminRequired)));
    }
}
