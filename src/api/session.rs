use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::middleware::AUTH_COOKIE;
use crate::api::proxy::APIKEY_COOKIE;
use crate::app_state::AppState;
use crate::errors::AppError;
use crate::services::session::{self, MemorySessionStore, SessionState, SessionStore};

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapResponse {
    /// `anonymous`, `noCompany` or `ready`.
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(AUTH_COOKIE) {
        return Some(cookie.value().to_string());
    }
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

/// Resolves the caller's session on load: validates the stored bearer token,
/// then fetches or issues the first company's primary API key and mirrors it
/// into the `crafty_apikey` cookie the messaging proxy falls back to.
#[utoipa::path(
    get,
    path = "/api/session/bootstrap",
    tag = "Session",
    responses(
        (status = 200, description = "Resolved session state", body = BootstrapResponse),
        (status = 502, description = "Identity service unreachable"),
    )
)]
#[get("/bootstrap")]
pub async fn bootstrap(
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let mut store = MemorySessionStore::default();
    if let Some(token) = bearer_token(&req) {
        store.set_token(&token);
    }
    if let Some(cookie) = req.cookie(APIKEY_COOKIE) {
        store.set_api_key(cookie.value());
    }

    let state = session::bootstrap(&mut store, &app_state.identity).await?;

    let mut response = HttpResponse::Ok();
    match state {
        SessionState::Anonymous => {
            response.cookie(removal_cookie(AUTH_COOKIE));
            response.cookie(removal_cookie(APIKEY_COOKIE));
            Ok(response.json(BootstrapResponse {
                state: "anonymous",
                company_id: None,
                api_key: None,
            }))
        }
        SessionState::NoCompany => {
            response.cookie(removal_cookie(APIKEY_COOKIE));
            Ok(response.json(BootstrapResponse {
                state: "noCompany",
                company_id: None,
                api_key: None,
            }))
        }
        SessionState::Ready {
            company_id,
            api_key,
        } => {
            let mut cookie = Cookie::new(APIKEY_COOKIE, api_key.clone());
            cookie.set_path("/");
            response.cookie(cookie);
            Ok(response.json(BootstrapResponse {
                state: "ready",
                company_id: Some(company_id),
                api_key: Some(api_key),
            }))
        }
    }
}

/// Clears both credentials; the client follows up by navigating to `/auth`.
#[utoipa::path(
    post,
    path = "/api/session/logout",
    tag = "Session",
    responses((status = 200, description = "Credentials cleared")),
)]
#[post("/logout")]
pub async fn logout() -> HttpResponse {
    HttpResponse::Ok()
        .cookie(removal_cookie(AUTH_COOKIE))
        .cookie(removal_cookie(APIKEY_COOKIE))
        .json(serde_json::json!({ "ok": true }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/session").service(bootstrap).service(logout));
}
