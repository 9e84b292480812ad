use std::sync::Arc;

use laurel_core::clock::Clock;
use laurel_db::pg::PgStore;
use laurel_db::store::{AchievementStore, AttachmentStore, RefreshTokenStore, UserStore};
use laurel_db::DbPool;

use crate::accounts::AccountService;
use crate::attachments::AttachmentService;
use crate::auth::jwt::TokenSigner;
use crate::blob::BlobStore;
use crate::config::ServerConfig;
use crate::session::SessionManager;
use crate::workflow::AchievementWorkflow;

/// The persistence handles every service is built from.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    pub achievements: Arc<dyn AchievementStore>,
    pub attachments: Arc<dyn AttachmentStore>,
}

impl Stores {
    /// All four stores over one PostgreSQL pool.
    pub fn postgres(pool: DbPool) -> Self {
        let pg = Arc::new(PgStore::new(pool));
        Self {
            users: pg.clone(),
            refresh_tokens: pg.clone(),
            achievements: pg.clone(),
            attachments: pg,
        }
    }
}

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database pool, probed by `/health`. `None` when running on in-memory stores.
    pub pool: Option<DbPool>,
    pub config: Arc<ServerConfig>,
    pub sessions: Arc<SessionManager>,
    pub workflow: Arc<AchievementWorkflow>,
    pub attachments: Arc<AttachmentService>,
    pub accounts: Arc<AccountService>,
}

impl AppState {
    /// Wire every service from its collaborators (the composition root).
    pub fn build(
        config: ServerConfig,
        stores: Stores,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        pool: Option<DbPool>,
    ) -> Self {
        let signer = Arc::new(TokenSigner::new(&config.jwt, clock.clone()));

        let sessions = SessionManager::new(
            stores.users.clone(),
            stores.refresh_tokens.clone(),
            signer,
            clock.clone(),
        );
        let workflow = AchievementWorkflow::new(stores.achievements.clone(), clock.clone());
        let attachments = AttachmentService::new(
            stores.achievements.clone(),
            stores.attachments.clone(),
            blobs,
            config.upload.policy.clone(),
            clock.clone(),
        );
        let accounts = AccountService::new(
            stores.users.clone(),
            stores.refresh_tokens.clone(),
            clock,
        );

        Self {
            pool,
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            workflow: Arc::new(workflow),
            attachments: Arc::new(attachments),
            accounts: Arc::new(accounts),
        }
    }
}
