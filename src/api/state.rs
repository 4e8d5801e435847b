//! Shared application state handed to every route

use std::sync::Arc;

use crate::auth::{IdentityLookup, TokenIssuer};
use crate::config::Config;
use crate::handlers::{ReleaseHandler, UserHandler};
use crate::projection::ProjectionService;
use crate::repository::{ReleaseRepository, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: UserHandler,
    pub releases: ReleaseHandler,
    pub projection: ProjectionService,
    pub tokens: Arc<TokenIssuer>,
    pub identity: Arc<dyn IdentityLookup>,
}

impl AppState {
    /// Wire services over the given storage and identity adapters
    pub fn new(
        config: Arc<Config>,
        user_repository: Arc<dyn UserRepository>,
        release_repository: Arc<dyn ReleaseRepository>,
        identity: Arc<dyn IdentityLookup>,
    ) -> Self {
        let tokens = Arc::new(TokenIssuer::new(Arc::new(config.token_config())));

        Self {
            users: UserHandler::new(user_repository.clone()),
            releases: ReleaseHandler::new(release_repository.clone(), user_repository.clone()),
            projection: ProjectionService::new(release_repository, user_repository),
            tokens,
            identity,
            config,
        }
    }
}
