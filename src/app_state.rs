use crate::config::Config;
use crate::services::identity_api::IdentityApiService;
use sea_orm::DatabaseConnection;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    /// Shared outbound client used by the reverse proxies.
    pub http: reqwest::Client,
    pub identity: IdentityApiService,
}
