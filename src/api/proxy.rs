use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use url::Url;

use crate::{app_state::AppState, errors::AppError};

pub const APIKEY_COOKIE: &str = "crafty_apikey";
pub const AGNO_PORT_HEADER: &str = "x-agno-port";

// Transport headers that must not be replayed to the upstream.
const SKIP_REQUEST_HEADERS: [&str; 3] = ["host", "content-length", "connection"];
// The HTTP layer has already decoded any compression; replaying these would
// make the client decode twice.
const SKIP_RESPONSE_HEADERS: [&str; 4] = [
    "content-encoding",
    "content-length",
    "transfer-encoding",
    "connection",
];

fn skip_request_header(name: &str) -> bool {
    SKIP_REQUEST_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h))
}

fn skip_response_header(name: &str) -> bool {
    SKIP_RESPONSE_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Joins the configured base, the incoming path suffix and the original
/// query string into the upstream target.
fn build_target_url(base: &str, tail: &str, query: &str) -> String {
    let mut url = format!("{}/{}", base.trim_end_matches('/'), tail.trim_start_matches('/'));
    if !query.is_empty() {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// Transparent forwarder shared by both upstream proxies. Accepts any method
/// and path suffix, performs exactly one outbound request, and returns the
/// upstream status and body unchanged.
async fn forward(
    app_state: &web::Data<AppState>,
    req: &HttpRequest,
    body: web::Bytes,
    target: String,
    apikey: Option<String>,
) -> Result<HttpResponse, AppError> {
    let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())
        .map_err(|_| AppError::InvalidInput("Unsupported HTTP method".to_string()))?;

    let mut upstream = app_state.http.request(method, &target);

    for (name, value) in req.headers() {
        if skip_request_header(name.as_str()) {
            continue;
        }
        // Replaced below with the resolved key, never duplicated.
        if apikey.is_some() && name.as_str().eq_ignore_ascii_case("apikey") {
            continue;
        }
        if let Ok(value) = value.to_str() {
            upstream = upstream.header(name.as_str(), value);
        }
    }

    if let Some(key) = apikey {
        upstream = upstream.header("apikey", key);
    }

    let method_has_body = !matches!(req.method().as_str(), "GET" | "HEAD");
    if method_has_body && !body.is_empty() {
        upstream = upstream.body(body.to_vec());
    }

    let response = upstream.send().await.map_err(|e| {
        log::error!("Proxy request to {} failed: {}", target, e);
        AppError::Upstream(e.to_string())
    })?;

    let status =
        StatusCode::from_u16(response.status().as_u16()).map_err(|_| AppError::Internal)?;

    let mut builder = HttpResponse::build(status);
    for (name, value) in response.headers() {
        if skip_response_header(name.as_str()) {
            continue;
        }
        builder.append_header((name.as_str(), value.as_bytes()));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    Ok(builder.body(bytes))
}

/// `ANY /api/evo/{...}` -> Evolution messaging API. The `apikey` header is
/// sourced from the incoming request or, failing that, the stored cookie.
pub async fn evo_proxy(
    req: HttpRequest,
    body: web::Bytes,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let base = app_state
        .config
        .evolution_api_url
        .as_deref()
        .ok_or_else(|| AppError::Config("Evolution API URL is missing.".to_string()))?;

    let apikey = req
        .headers()
        .get("apikey")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.cookie(APIKEY_COOKIE).map(|c| c.value().to_string()));

    let tail = req.match_info().query("tail");
    let target = build_target_url(base, tail, req.query_string());

    forward(&app_state, &req, body, target, apikey).await
}

/// `ANY /api/agno/{...}` -> Agno agent API. An `x-agno-port` header redirects
/// the call to a tenant-specific agent port; otherwise the configured default
/// applies.
pub async fn agno_proxy(
    req: HttpRequest,
    body: web::Bytes,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let base = app_state
        .config
        .agno_api_url
        .as_deref()
        .ok_or_else(|| AppError::Config("Agno API URL is missing.".to_string()))?;

    let tail = req.match_info().query("tail");
    let mut target = build_target_url(base, tail, req.query_string());

    let port = req
        .headers()
        .get(AGNO_PORT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u16>().ok())
        .or(app_state.config.agno_default_port);

    if let Some(port) = port {
        let mut url = Url::parse(&target)
            .map_err(|_| AppError::Config("Agno API URL is missing.".to_string()))?;
        url.set_port(Some(port)).map_err(|_| AppError::Internal)?;
        target = url.to_string();
    }

    forward(&app_state, &req, body, target, None).await
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/evo/{tail:.*}").route(web::route().to(evo_proxy)))
        .service(web::resource("/agno/{tail:.*}").route(web::route().to(agno_proxy)));
}
