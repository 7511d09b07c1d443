use std::sync::Arc;

use crate::auth::{AuthWorkflow, CredentialHasher, SessionCookies, TokenService};
use crate::store::{IdentityStore, MessageStore};

/// Shared application state, built once in `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub identities: Arc<dyn IdentityStore>,
    pub messages: Arc<dyn MessageStore>,
    pub tokens: Arc<TokenService>,
    pub auth: AuthWorkflow,
    pub cookies: SessionCookies,
}

impl AppState {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        messages: Arc<dyn MessageStore>,
        tokens: Arc<TokenService>,
        hasher: Arc<CredentialHasher>,
        cookies: SessionCookies,
    ) -> Self {
        let auth = AuthWorkflow::new(identities.clone(), hasher, tokens.clone());
        Self {
            identities,
            messages,
            tokens,
            auth,
            cookies,
        }
    }
}
