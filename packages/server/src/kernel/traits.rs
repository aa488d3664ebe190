// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. The review
// workflow consumes them through narrow interfaces; channel-specific
// delivery (push/email/SMS) and real role storage live outside this core.

use anyhow::Result;
use async_trait::async_trait;

use crate::common::MemberId;

// =============================================================================
// Notification Trait (Infrastructure - fire-and-forget delivery)
// =============================================================================

/// Outbound notification emitter.
///
/// Emission is fire-and-forget and at-least-once: the caller logs a failure
/// and moves on. A failed emit must never block or roll back a committed
/// review decision; the implementation owns its own retry policy.
#[async_trait]
pub trait BaseNotificationService: Send + Sync {
    async fn emit(
        &self,
        event_type: &str,
        recipient: MemberId,
        payload: serde_json::Value,
    ) -> Result<()>;
}

// =============================================================================
// Identity Trait (Infrastructure - caller role lookup)
// =============================================================================

/// Supplies the caller's role for authorization gates.
#[async_trait]
pub trait BaseIdentityService: Send + Sync {
    /// Whether this member holds the ADMIN claim.
    async fn is_admin(&self, member_id: MemberId) -> Result<bool>;
}

// =============================================================================
// Default implementations
// =============================================================================

/// Notification emitter that records emissions to the structured log only.
///
/// Stands in wherever real delivery is wired up elsewhere (or not at all,
/// e.g. local development).
pub struct LogNotificationService;

#[async_trait]
impl BaseNotificationService for LogNotificationService {
    async fn emit(
        &self,
        event_type: &str,
        recipient: MemberId,
        payload: serde_json::Value,
    ) -> Result<()> {
        tracing::info!(
            event_type,
            recipient = %recipient,
            payload = %payload,
            "notification emitted"
        );
        Ok(())
    }
}

/// Identity service backed by the static admin list from configuration.
pub struct ConfigIdentityService {
    admins: Vec<MemberId>,
}

impl ConfigIdentityService {
    pub fn new(admins: Vec<MemberId>) -> Self {
        Self { admins }
    }
}

#[async_trait]
impl BaseIdentityService for ConfigIdentityService {
    async fn is_admin(&self, member_id: MemberId) -> Result<bool> {
        Ok(self.admins.contains(&member_id))
    }
}
