use crate::constants::TOKEN_KEY;
use crate::errors::FundChatResult;
use crate::models::UserProfile;
use crate::session_store::SessionStoreClient;
use log::{info, warn};

/// The signed-in user, passed explicitly to whoever needs it.
///
/// Created once at startup by [`AuthContext::bootstrap`] and torn down by
/// [`AuthContext::logout`].
pub struct AuthContext {
    client: SessionStoreClient,
    user: Option<UserProfile>,
}

impl AuthContext {
    /// Restores the session from a stored token. A failed profile fetch
    /// discards the token and leaves the context signed out.
    pub async fn bootstrap(client: SessionStoreClient) -> Self {
        let mut ctx = AuthContext { client, user: None };

        let has_token = match ctx.client.store().get(TOKEN_KEY) {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!("Could not read stored session token: {}", e);
                false
            }
        };
        if !has_token {
            return ctx;
        }

        match ctx.client.profile().await {
            Ok(profile) => {
                info!("Restored session for {}", profile.email);
                ctx.user = Some(profile);
            }
            Err(e) => {
                warn!("Auth check failed: {}", e);
                if let Err(e) = ctx.client.store().remove(TOKEN_KEY) {
                    warn!("Could not discard session token: {}", e);
                }
            }
        }
        ctx
    }

    pub async fn login(&mut self, token: &str) -> FundChatResult<&UserProfile> {
        self.client.store().set(TOKEN_KEY, token)?;
        let profile = self.client.profile().await?;
        info!("Signed in as {}", profile.email);
        Ok(self.user.insert(profile))
    }

    pub fn logout(&mut self) -> FundChatResult<()> {
        self.user = None;
        self.client.store().remove(TOKEN_KEY)
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn client(&self) -> &SessionStoreClient {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn profile_body() -> serde_json::Value {
        json!({ "id": "u1", "email": "ana@example.com", "name": "Ana", "role": "ADMIN" })
    }

    fn client(server: &MockServer, store: Arc<MemoryStore>) -> SessionStoreClient {
        SessionStoreClient::new(server.uri(), store, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_bootstrap_without_token_skips_profile_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
            .expect(0)
            .mount(&server)
            .await;

        let ctx = AuthContext::bootstrap(client(&server, Arc::new(MemoryStore::new()))).await;
        assert!(!ctx.is_authenticated());
    }

    #[tokio::test]
    async fn test_bootstrap_with_valid_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/profile"))
            .and(header("authorization", "Bearer good"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store.set(TOKEN_KEY, "good").unwrap();
        let ctx = AuthContext::bootstrap(client(&server, store)).await;
        assert_eq!(ctx.user().map(|u| u.name.as_str()), Some("Ana"));
    }

    #[tokio::test]
    async fn test_bootstrap_with_rejected_token_discards_it() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/profile"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store.set(TOKEN_KEY, "stale").unwrap();
        let ctx = AuthContext::bootstrap(client(&server, store.clone())).await;

        assert!(!ctx.is_authenticated());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/profile"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let mut ctx = AuthContext::bootstrap(client(&server, store.clone())).await;

        let user = ctx.login("fresh").await.unwrap();
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("fresh"));

        ctx.logout().unwrap();
        assert!(ctx.user().is_none());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }
}
