use actix_web::HttpRequest;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use sha2::{Digest, Sha256};

use crate::{database::models::api_keys, errors::AppError};

pub const API_KEY_HEADER: &str = "apikey";
pub const API_KEY_HEADER_ALT: &str = "x-evo-apikey";

/// Authenticated caller. Every `/api/db` query is constrained to this tenant.
#[derive(Clone, Debug)]
pub struct TenantContext {
    pub company_id: String,
}

/// Deterministic one-way digest of a raw API key, lowercase hex SHA-256.
/// Only the digest is ever compared against the credential table.
pub fn hash_api_key(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

fn api_key_from_headers(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(API_KEY_HEADER)
        .or_else(|| req.headers().get(API_KEY_HEADER_ALT))
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Resolves the request's API key to its tenant. Missing, unknown or revoked
/// keys all fail with `Unauthorized` before any other table is touched.
pub async fn resolve_tenant(
    req: &HttpRequest,
    db: &DatabaseConnection,
) -> Result<TenantContext, AppError> {
    let raw_key = api_key_from_headers(req)
        .ok_or_else(|| AppError::Unauthorized("Missing `apikey` header".to_string()))?;

    let digest = hash_api_key(raw_key);

    let record = api_keys::Entity::find()
        .filter(api_keys::Column::KeyHash.eq(digest))
        .filter(api_keys::Column::RevokedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown or revoked API key".to_string()))?;

    Ok(TenantContext {
        company_id: record.company_id,
    })
}
