use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::password::dummy_hash;
use crate::auth::tokens::TokenService;
use crate::config::Config;
use crate::mail::{LogMailer, Mailer};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub tokens: Arc<TokenService>,
    /// Pluggable mail transport. Default: LogMailer.
    pub mailer: Arc<dyn Mailer>,
    /// Verified against when a login names an unknown email.
    pub dummy_password_hash: Arc<str>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let tokens = Arc::new(TokenService::new(&config)?);
        let dummy_password_hash = dummy_hash(config.bcrypt_cost)?.into();
        Ok(Self {
            db,
            config,
            tokens,
            mailer: Arc::new(LogMailer),
            dummy_password_hash,
        })
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }
}
