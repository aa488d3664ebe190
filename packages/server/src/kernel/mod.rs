// ReviewKernel - core infrastructure with all dependencies
//
// Holds the storage and collaborator handles used by the review actions,
// behind traits for testability.

pub mod test_dependencies;
pub mod traits;

pub use traits::{
    BaseIdentityService, BaseNotificationService, ConfigIdentityService, LogNotificationService,
};

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;
use crate::domains::review::store::{DraftStore, PostgresDraftStore};

/// Dependency container handed to every review action.
#[derive(Clone)]
pub struct ReviewKernel {
    pub store: Arc<dyn DraftStore>,
    pub notifications: Arc<dyn BaseNotificationService>,
    pub identity: Arc<dyn BaseIdentityService>,
}

impl ReviewKernel {
    pub fn new(
        store: Arc<dyn DraftStore>,
        notifications: Arc<dyn BaseNotificationService>,
        identity: Arc<dyn BaseIdentityService>,
    ) -> Self {
        Self {
            store,
            notifications,
            identity,
        }
    }

    /// Production wiring: Postgres-backed store, log-only notification
    /// emitter, config-listed admins.
    pub fn postgres(pool: PgPool, config: &Config) -> Self {
        Self {
            store: Arc::new(PostgresDraftStore::new(pool)),
            notifications: Arc::new(LogNotificationService),
            identity: Arc::new(ConfigIdentityService::new(config.admin_member_ids.clone())),
        }
    }
}
