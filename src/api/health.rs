use actix_web::{get, web, HttpResponse};

use crate::{app_state::AppState, database::connector, errors::AppError};

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "Ops",
    responses(
        (status = 200, description = "Database reachable"),
        (status = 500, description = "Database unreachable"),
    )
)]
#[get("/healthz")]
pub async fn healthz(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    connector::ping(&app_state.db).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}
