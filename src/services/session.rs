use crate::errors::AppError;
use crate::services::identity_api::IdentityApiService;

/// Single read/write/clear contract for the two session credentials. The
/// navigation gate and the API client both go through this trait; the
/// persistence medium behind it is an implementation choice.
pub trait SessionStore {
    fn token(&self) -> Option<String>;
    fn set_token(&mut self, token: &str);
    fn clear_token(&mut self);

    fn api_key(&self) -> Option<String>;
    fn set_api_key(&mut self, key: &str);
    fn clear_api_key(&mut self);
}

/// In-memory backend, also the test double.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: Option<String>,
    api_key: Option<String>,
}

impl SessionStore for MemorySessionStore {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }

    fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    fn clear_token(&mut self) {
        self.token = None;
    }

    fn api_key(&self) -> Option<String> {
        self.api_key.clone()
    }

    fn set_api_key(&mut self, key: &str) {
        self.api_key = Some(key.to_string());
    }

    fn clear_api_key(&mut self) {
        self.api_key = None;
    }
}

/// Session states: `Anonymous` → `NoCompany` → `Ready`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No usable bearer token; caller belongs on the sign-in page.
    Anonymous,
    /// Valid token but the caller owns no company yet; any stored API key
    /// has been cleared.
    NoCompany,
    Ready { company_id: String, api_key: String },
}

/// Resolves the session on load: validate the stored token, pick the first
/// company, then fetch or issue its primary API key and persist it. A
/// rejected token clears both credentials instead of propagating the 401 --
/// credentials, not transient conditions, caused the failure.
pub async fn bootstrap(
    store: &mut dyn SessionStore,
    identity: &IdentityApiService,
) -> Result<SessionState, AppError> {
    let Some(token) = store.token() else {
        return Ok(SessionState::Anonymous);
    };

    let companies = match identity.get_companies(&token).await {
        Ok(companies) => companies,
        Err(AppError::Unauthorized(reason)) => {
            log::info!("Stored token rejected, clearing session: {}", reason);
            logout(store);
            return Ok(SessionState::Anonymous);
        }
        Err(err) => return Err(err),
    };

    let Some(company) = companies.into_iter().next() else {
        store.clear_api_key();
        return Ok(SessionState::NoCompany);
    };

    let issued = match identity.get_primary_api_key(&token, &company.id).await? {
        Some(key) => key,
        None => identity.issue_api_key(&token, &company.id).await?,
    };

    store.set_api_key(&issued.key);
    Ok(SessionState::Ready {
        company_id: company.id,
        api_key: issued.key,
    })
}

pub fn logout(store: &mut dyn SessionStore) {
    store.clear_token();
    store.clear_api_key();
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_with(token: Option<&str>, api_key: Option<&str>) -> MemorySessionStore {
        let mut store = MemorySessionStore::default();
        if let Some(token) = token {
            store.set_token(token);
        }
        if let Some(key) = api_key {
            store.set_api_key(key);
        }
        store
    }

    #[tokio::test]
    async fn no_token_stays_anonymous_without_network_calls() {
        let mut store = store_with(None, None);
        // Unconfigured service: any request would fail, proving none is made.
        let identity = IdentityApiService::new(None);

        let state = bootstrap(&mut store, &identity).await.unwrap();
        assert_eq!(state, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn empty_company_list_clears_key_and_issues_no_key_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/companies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        // Any hit on an apikey path would fail the unmatched-request check.

        let mut store = store_with(Some("tok"), Some("stale-key"));
        let identity = IdentityApiService::new(Some(server.uri()));

        let state = bootstrap(&mut store, &identity).await.unwrap();
        assert_eq!(state, SessionState::NoCompany);
        assert!(store.api_key().is_none());
        assert!(store.token().is_some());
    }

    #[tokio::test]
    async fn existing_primary_key_is_persisted() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/companies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "c1", "name": "Acme"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/companies/c1/apikey"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "key": "key-123", "companyId": "c1"
            })))
            .mount(&server)
            .await;

        let mut store = store_with(Some("tok"), None);
        let identity = IdentityApiService::new(Some(server.uri()));

        let state = bootstrap(&mut store, &identity).await.unwrap();
        assert_eq!(
            state,
            SessionState::Ready {
                company_id: "c1".to_string(),
                api_key: "key-123".to_string()
            }
        );
        assert_eq!(store.api_key().as_deref(), Some("key-123"));
    }

    #[tokio::test]
    async fn missing_primary_key_triggers_issuance() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/companies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "c1", "name": "Acme"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/companies/c1/apikey"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/companies/c1/apikey"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "key": "fresh-key", "companyId": "c1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut store = store_with(Some("tok"), None);
        let identity = IdentityApiService::new(Some(server.uri()));

        let state = bootstrap(&mut store, &identity).await.unwrap();
        assert!(matches!(state, SessionState::Ready { api_key, .. } if api_key == "fresh-key"));
    }

    #[tokio::test]
    async fn rejected_token_clears_both_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/companies"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let mut store = store_with(Some("stale"), Some("old-key"));
        let identity = IdentityApiService::new(Some(server.uri()));

        let state = bootstrap(&mut store, &identity).await.unwrap();
        assert_eq!(state, SessionState::Anonymous);
        assert!(store.token().is_none());
        assert!(store.api_key().is_none());
    }

    #[test]
    fn logout_clears_everything() {
        let mut store = store_with(Some("tok"), Some("key"));
        logout(&mut store);
        assert!(store.token().is_none());
        assert!(store.api_key().is_none());
    }
}
