use crate::errors::AppError;
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::ToSchema;

/// Client for the upstream identity service: bearer-token resolution,
/// company listing and API-key issuance. Nothing is cached locally; every
/// call re-validates against the upstream.
#[derive(Clone)]
pub struct IdentityApiService {
    client: Client,
    base_url: Option<String>,
}

impl IdentityApiService {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    fn base(&self) -> Result<&str, AppError> {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .ok_or_else(|| AppError::Config("Identity API URL is missing.".to_string()))
    }

    async fn send(
        &self,
        token: &str,
        method: Method,
        path: &str,
    ) -> Result<reqwest::Response, AppError> {
        let url = format!("{}{}", self.base()?, path);
        let response = self
            .client
            .request(method, &url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::Unauthorized(
                "Identity service rejected the token".to_string(),
            )),
            _ => Ok(response),
        }
    }

    async fn request<R: DeserializeOwned>(
        &self,
        token: &str,
        method: Method,
        path: &str,
    ) -> Result<R, AppError> {
        let response = self.send(token, method, path).await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error reading response body".to_string());
            log::error!("Identity API error on {}: {} - {}", path, status, error_text);
            return Err(AppError::Upstream(format!(
                "Identity request failed with status {}: {}",
                status, error_text
            )));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))
    }

    /// Resolves the caller behind a bearer token. Any non-success response
    /// means the stored token must be discarded.
    pub async fn get_profile(&self, token: &str) -> Result<Profile, AppError> {
        self.request(token, Method::GET, "/me").await
    }

    pub async fn get_companies(&self, token: &str) -> Result<Vec<CompanySummary>, AppError> {
        self.request(token, Method::GET, "/companies").await
    }

    /// Fetches the company's current primary API key; `None` when no key has
    /// been issued yet.
    pub async fn get_primary_api_key(
        &self,
        token: &str,
        company_id: &str,
    ) -> Result<Option<IssuedApiKey>, AppError> {
        let path = format!("/companies/{}/apikey", company_id);
        let response = self.send(token, Method::GET, &path).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Upstream(format!(
                "Identity request failed with status {}",
                status
            )));
        }

        let key = response
            .json::<IssuedApiKey>()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;
        Ok(Some(key))
    }

    pub async fn issue_api_key(
        &self,
        token: &str,
        company_id: &str,
    ) -> Result<IssuedApiKey, AppError> {
        let path = format!("/companies/{}/apikey", company_id);
        self.request(token, Method::POST, &path).await
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuedApiKey {
    pub key: String,
    pub company_id: Option<String>,
}
