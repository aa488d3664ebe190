// Test dependencies - mock implementations for testing
//
// Mock collaborators that can be injected into a ReviewKernel for tests.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{BaseIdentityService, BaseNotificationService, ReviewKernel};
use crate::common::MemberId;
use crate::domains::review::store::MemoryDraftStore;

// =============================================================================
// Mock Notification Service
// =============================================================================

/// One recorded emission
#[derive(Debug, Clone)]
pub struct EmittedNotification {
    pub event_type: String,
    pub recipient: MemberId,
    pub payload: serde_json::Value,
}

/// Records every emission; can be toggled to fail so tests can prove that
/// notification failure never reverses a committed decision.
pub struct MockNotificationService {
    emissions: Mutex<Vec<EmittedNotification>>,
    failing: AtomicBool,
}

impl MockNotificationService {
    pub fn new() -> Self {
        Self {
            emissions: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn emissions(&self) -> Vec<EmittedNotification> {
        self.emissions.lock().unwrap().clone()
    }
}

impl Default for MockNotificationService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseNotificationService for MockNotificationService {
    async fn emit(
        &self,
        event_type: &str,
        recipient: MemberId,
        payload: serde_json::Value,
    ) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("notification channel unavailable");
        }
        self.emissions.lock().unwrap().push(EmittedNotification {
            event_type: event_type.to_string(),
            recipient,
            payload,
        });
        Ok(())
    }
}

// =============================================================================
// Mock Identity Service
// =============================================================================

/// In-memory admin set
pub struct MockIdentityService {
    admins: Mutex<HashSet<MemberId>>,
}

impl MockIdentityService {
    pub fn new() -> Self {
        Self {
            admins: Mutex::new(HashSet::new()),
        }
    }

    pub fn grant_admin(&self, member_id: MemberId) {
        self.admins.lock().unwrap().insert(member_id);
    }
}

impl Default for MockIdentityService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseIdentityService for MockIdentityService {
    async fn is_admin(&self, member_id: MemberId) -> Result<bool> {
        Ok(self.admins.lock().unwrap().contains(&member_id))
    }
}

// =============================================================================
// Test kernel wiring
// =============================================================================

/// A ReviewKernel over in-memory storage plus handles to its mocks.
pub struct TestKernel {
    pub kernel: ReviewKernel,
    pub store: Arc<MemoryDraftStore>,
    pub notifications: Arc<MockNotificationService>,
    pub identity: Arc<MockIdentityService>,
}

impl TestKernel {
    pub fn new() -> Self {
        let store = Arc::new(MemoryDraftStore::new());
        let notifications = Arc::new(MockNotificationService::new());
        let identity = Arc::new(MockIdentityService::new());
        let kernel = ReviewKernel::new(store.clone(), notifications.clone(), identity.clone());
        Self {
            kernel,
            store,
            notifications,
            identity,
        }
    }

    /// Registers a fresh member as admin and returns its id.
    pub fn admin(&self) -> MemberId {
        let id = MemberId::new();
        self.identity.grant_admin(id);
        id
    }
}

impl Default for TestKernel {
    fn default() -> Self {
        Self::new()
    }
}
