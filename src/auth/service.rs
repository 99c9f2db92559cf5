//! Session operations against the `/auth` endpoints

use crate::api::ApiClient;
use crate::auth::types::{Credentials, RegistrationProfile, SessionState, access_token};
use crate::error::handlers::{AuthErrorHandler, LOGIN_FAILED, REGISTER_FAILED};
use crate::error::{AuthError, ClientError};
use crate::events::SessionEvents;
use crate::storage::SessionStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Login, registration, verification and logout over the shared client.
///
/// Each operation is a single round trip. Failures come back as [`AuthError`]
/// whose message is ready to show to a user.
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
    store: Arc<dyn SessionStore>,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        let store = client.store();
        Self { client, store }
    }

    pub fn events(&self) -> &SessionEvents {
        self.client.events()
    }

    pub async fn state(&self) -> SessionState {
        match self.store.get().await {
            Ok(Some(_)) => SessionState::Authenticated,
            Ok(None) => SessionState::Anonymous,
            Err(e) => {
                warn!(error = %e, "could not read session credential");
                SessionState::Anonymous
            }
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> AuthResult<Value> {
        debug!(identifier = %credentials.identifier, "logging in");

        let payload = self
            .client
            .post_form(&["auth", "login"], credentials)
            .await
            .map_err(AuthErrorHandler::handle_login_error)?
            .into_body();

        self.persist(&payload)
            .await
            .map_err(|e| AuthError::new(LOGIN_FAILED, e))?;

        info!("session started");
        Ok(payload)
    }

    pub async fn register(&self, profile: &RegistrationProfile) -> AuthResult<Value> {
        debug!(identifier = %profile.identifier, "registering account");

        let payload = self
            .client
            .post_json(&["auth", "register"], profile)
            .await
            .map_err(AuthErrorHandler::handle_register_error)?
            .into_body();

        self.persist(&payload)
            .await
            .map_err(|e| AuthError::new(REGISTER_FAILED, e))?;

        info!("account created");
        Ok(payload)
    }

    /// Confirm the stored credential is still accepted. Any failure drops it.
    pub async fn verify_token(&self) -> AuthResult<Value> {
        match self.client.get(&["auth", "me"]).await {
            Ok(response) => Ok(response.into_body()),
            Err(e) => {
                debug!(error = %e, "session verification failed");
                self.discard_credential().await;
                Err(AuthErrorHandler::handle_verify_error(e))
            }
        }
    }

    /// Best-effort server logout followed by an unconditional local clear.
    pub async fn logout(&self) {
        if let Err(e) = self.client.post_empty(&["auth", "logout"]).await {
            debug!(error = %e, "server logout failed, ignoring");
        }
        self.discard_credential().await;
        info!("session ended");
    }

    async fn persist(&self, payload: &Value) -> std::result::Result<(), ClientError> {
        if let Some(token) = access_token(payload) {
            self.store.set(token).await?;
        }
        Ok(())
    }

    async fn discard_credential(&self) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "could not clear session credential");
        }
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("client", &self.client)
            .finish()
    }
}
