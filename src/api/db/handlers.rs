use actix_web::{get, patch, web, HttpRequest, HttpResponse};
use sea_orm::sea_query::{Condition, Expr, Query, SelectStatement};
use sea_orm::{
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::extension::postgres::PgExpr,
};

use crate::{
    api::context::resolve_tenant,
    app_state::AppState,
    database::models::{chats, contacts, instances, integration_sessions, media, messages},
    errors::AppError,
};

use super::structures::{
    AckResponse, ChatAiUpdate, ChatListQuery, ChatListResponse, ChatUnreadUpdate,
    ContactListQuery, ContactListResponse, InstanceListResponse, IntegrationSessionQuery,
    IntegrationSessionResponse, MediaListResponse, MediaQuery, MessageListQuery,
    MessageListResponse, MessagesStatusUpdate,
};

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 200;
const DEFAULT_MESSAGE_LIMIT: u64 = 100;
const MAX_MESSAGE_LIMIT: u64 = 1000;

/// Subquery selecting the ids of every instance owned by the tenant. Every
/// statement issued by this module carries it, reads and writes alike.
fn tenant_instances(company_id: &str) -> SelectStatement {
    use sea_orm::sea_query::ExprTrait;
    Query::select()
        .column(instances::Column::Id)
        .from(instances::Entity)
        .and_where(Expr::col(instances::Column::CompanyId).eq(company_id))
        .to_owned()
}

/// Message ids reachable from the tenant's instances; used to scope Media,
/// which hangs off a Message rather than an Instance.
fn tenant_message_ids(company_id: &str) -> SelectStatement {
    use sea_orm::sea_query::ExprTrait;
    Query::select()
        .column(messages::Column::Id)
        .from(messages::Entity)
        .and_where(
            Expr::col(messages::Column::InstanceId).in_subquery(tenant_instances(company_id)),
        )
        .to_owned()
}

fn split_ids(single: Option<String>, many: Option<String>) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(id) = single {
        let id = id.trim();
        if !id.is_empty() {
            out.push(id.to_string());
        }
    }
    if let Some(list) = many {
        for id in list.split(',') {
            let id = id.trim();
            if !id.is_empty() {
                out.push(id.to_string());
            }
        }
    }
    out
}

fn effective_message_limit(limit: Option<u64>, recent: Option<u64>) -> u64 {
    recent
        .or(limit)
        .unwrap_or(DEFAULT_MESSAGE_LIMIT)
        .clamp(1, MAX_MESSAGE_LIMIT)
}

fn effective_page(page: Option<u64>, page_size: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, page_size)
}

#[utoipa::path(
    get,
    path = "/api/db/chats",
    tag = "Query Gateway",
    params(ChatListQuery),
    responses(
        (status = 200, description = "Tenant chats, newest activity first", body = ChatListResponse),
        (status = 401, description = "Missing or invalid API key"),
    )
)]
#[get("/chats")]
pub async fn list_chats(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    query: web::Query<ChatListQuery>,
) -> Result<HttpResponse, AppError> {
    let ctx = resolve_tenant(&req, &app_state.db).await?;
    let params = query.into_inner();
    let (page, page_size) = effective_page(params.page, params.page_size);

    let mut select = chats::Entity::find()
        .filter(chats::Column::InstanceId.in_subquery(tenant_instances(&ctx.company_id)));

    if let Some(instance_id) = params.instance_id.filter(|v| !v.trim().is_empty()) {
        select = select.filter(chats::Column::InstanceId.eq(instance_id.trim()));
    }

    if let Some(search) = params.search.filter(|v| !v.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        select = select.filter(
            Condition::any()
                .add(Expr::col(chats::Column::Name).ilike(pattern.clone()))
                .add(Expr::col(chats::Column::RemoteJid).ilike(pattern)),
        );
    }

    let chats = select
        .order_by_desc(chats::Column::UpdatedAt)
        .limit(page_size)
        .offset((page - 1) * page_size)
        .all(&app_state.db)
        .await?;

    Ok(HttpResponse::Ok().json(ChatListResponse { chats }))
}

#[utoipa::path(
    get,
    path = "/api/db/contacts",
    tag = "Query Gateway",
    params(ContactListQuery),
    responses(
        (status = 200, description = "Tenant contacts", body = ContactListResponse),
        (status = 401, description = "Missing or invalid API key"),
    )
)]
#[get("/contacts")]
pub async fn list_contacts(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    query: web::Query<ContactListQuery>,
) -> Result<HttpResponse, AppError> {
    let ctx = resolve_tenant(&req, &app_state.db).await?;

    let mut select = contacts::Entity::find()
        .filter(contacts::Column::InstanceId.in_subquery(tenant_instances(&ctx.company_id)));

    if let Some(instance_id) = query.into_inner().instance_id.filter(|v| !v.trim().is_empty()) {
        select = select.filter(contacts::Column::InstanceId.eq(instance_id.trim()));
    }

    let contacts = select
        .order_by_desc(contacts::Column::UpdatedAt)
        .all(&app_state.db)
        .await?;

    Ok(HttpResponse::Ok().json(ContactListResponse { contacts }))
}

#[utoipa::path(
    get,
    path = "/api/db/instances",
    tag = "Query Gateway",
    responses(
        (status = 200, description = "Tenant instances", body = InstanceListResponse),
        (status = 401, description = "Missing or invalid API key"),
    )
)]
#[get("/instances")]
pub async fn list_instances(
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let ctx = resolve_tenant(&req, &app_state.db).await?;

    let instances = instances::Entity::find()
        .filter(instances::Column::CompanyId.eq(ctx.company_id))
        .all(&app_state.db)
        .await?;

    Ok(HttpResponse::Ok().json(InstanceListResponse { instances }))
}

#[utoipa::path(
    get,
    path = "/api/db/media",
    tag = "Query Gateway",
    params(MediaQuery),
    responses(
        (status = 200, description = "Media rows for the given message id(s)", body = MediaListResponse),
        (status = 400, description = "Neither messageId nor messageIds given"),
        (status = 401, description = "Missing or invalid API key"),
    )
)]
#[get("/media")]
pub async fn list_media(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    query: web::Query<MediaQuery>,
) -> Result<HttpResponse, AppError> {
    let ctx = resolve_tenant(&req, &app_state.db).await?;
    let params = query.into_inner();

    let ids = split_ids(params.message_id, params.message_ids);
    if ids.is_empty() {
        return Err(AppError::InvalidInput(
            "messageId or messageIds is required".to_string(),
        ));
    }

    let media = media::Entity::find()
        .filter(media::Column::MessageId.is_in(ids))
        .filter(media::Column::MessageId.in_subquery(tenant_message_ids(&ctx.company_id)))
        .all(&app_state.db)
        .await?;

    Ok(HttpResponse::Ok().json(MediaListResponse { media }))
}

#[utoipa::path(
    get,
    path = "/api/db/integration-session",
    tag = "Query Gateway",
    params(IntegrationSessionQuery),
    responses(
        (status = 200, description = "The session, or null when not visible to the tenant", body = IntegrationSessionResponse),
        (status = 401, description = "Missing or invalid API key"),
    )
)]
#[get("/integration-session")]
pub async fn get_integration_session(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    query: web::Query<IntegrationSessionQuery>,
) -> Result<HttpResponse, AppError> {
    let ctx = resolve_tenant(&req, &app_state.db).await?;

    let session = integration_sessions::Entity::find()
        .filter(integration_sessions::Column::Id.eq(query.into_inner().id))
        .filter(
            integration_sessions::Column::InstanceId
                .in_subquery(tenant_instances(&ctx.company_id)),
        )
        .one(&app_state.db)
        .await?;

    Ok(HttpResponse::Ok().json(IntegrationSessionResponse { session }))
}

#[utoipa::path(
    get,
    path = "/api/db/messages",
    tag = "Query Gateway",
    params(MessageListQuery),
    responses(
        (status = 200, description = "Tenant messages", body = MessageListResponse),
        (status = 401, description = "Missing or invalid API key"),
    )
)]
#[get("/messages")]
pub async fn list_messages(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    query: web::Query<MessageListQuery>,
) -> Result<HttpResponse, AppError> {
    let ctx = resolve_tenant(&req, &app_state.db).await?;
    let params = query.into_inner();

    let mut select = messages::Entity::find()
        .filter(messages::Column::InstanceId.in_subquery(tenant_instances(&ctx.company_id)));

    if let Some(instance_id) = params.instance_id.filter(|v| !v.trim().is_empty()) {
        select = select.filter(messages::Column::InstanceId.eq(instance_id.trim()));
    }

    let jids = split_ids(params.remote_jid, params.remote_jids);
    if !jids.is_empty() {
        // The chat identifier lives inside the structured key; match either
        // its primary or alternate form.
        let mut any = Condition::any();
        for jid in &jids {
            any = any
                .add(Expr::cust_with_values(
                    r#""key"->>'remoteJid' = ?"#,
                    [jid.clone()],
                ))
                .add(Expr::cust_with_values(
                    r#""key"->>'remoteJidAlt' = ?"#,
                    [jid.clone()],
                ));
        }
        select = select.filter(any);
    }

    if let Some(before) = params.before {
        select = select.filter(messages::Column::MessageTimestamp.lt(before));
    }

    let ascending = matches!(params.order.as_deref(), Some("asc"));
    select = if ascending {
        select.order_by_asc(messages::Column::MessageTimestamp)
    } else {
        select.order_by_desc(messages::Column::MessageTimestamp)
    };

    let messages = select
        .limit(effective_message_limit(params.limit, params.recent))
        .all(&app_state.db)
        .await?;

    Ok(HttpResponse::Ok().json(MessageListResponse { messages }))
}

#[utoipa::path(
    patch,
    path = "/api/db/chat-ai",
    tag = "Query Gateway",
    request_body = ChatAiUpdate,
    responses(
        (status = 200, description = "AI flag updated", body = AckResponse),
        (status = 400, description = "Malformed payload"),
        (status = 401, description = "Missing or invalid API key"),
    )
)]
#[patch("/chat-ai")]
pub async fn update_chat_ai(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    body: web::Json<ChatAiUpdate>,
) -> Result<HttpResponse, AppError> {
    let ctx = resolve_tenant(&req, &app_state.db).await?;
    let payload = body.into_inner();

    if payload.id.trim().is_empty() {
        return Err(AppError::InvalidInput("id is required".to_string()));
    }

    chats::Entity::update_many()
        .col_expr(chats::Column::AiEnabled, Expr::value(payload.enabled))
        .filter(chats::Column::Id.eq(payload.id))
        .filter(chats::Column::InstanceId.in_subquery(tenant_instances(&ctx.company_id)))
        .exec(&app_state.db)
        .await?;

    Ok(HttpResponse::Ok().json(AckResponse { ok: true }))
}

#[utoipa::path(
    patch,
    path = "/api/db/chat-unread",
    tag = "Query Gateway",
    request_body = ChatUnreadUpdate,
    responses(
        (status = 200, description = "Unread count updated", body = AckResponse),
        (status = 400, description = "Malformed payload"),
        (status = 401, description = "Missing or invalid API key"),
    )
)]
#[patch("/chat-unread")]
pub async fn update_chat_unread(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    body: web::Json<ChatUnreadUpdate>,
) -> Result<HttpResponse, AppError> {
    let ctx = resolve_tenant(&req, &app_state.db).await?;
    let payload = body.into_inner();

    if payload.instance_id.trim().is_empty() || payload.remote_jid.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "instanceId and remoteJid are required".to_string(),
        ));
    }

    chats::Entity::update_many()
        .col_expr(
            chats::Column::UnreadMessages,
            Expr::value(payload.unread_messages),
        )
        .filter(chats::Column::InstanceId.eq(payload.instance_id))
        .filter(chats::Column::RemoteJid.eq(payload.remote_jid))
        .filter(chats::Column::InstanceId.in_subquery(tenant_instances(&ctx.company_id)))
        .exec(&app_state.db)
        .await?;

    Ok(HttpResponse::Ok().json(AckResponse { ok: true }))
}

#[utoipa::path(
    patch,
    path = "/api/db/messages-status",
    tag = "Query Gateway",
    request_body = MessagesStatusUpdate,
    responses(
        (status = 200, description = "Status updated on the given messages", body = AckResponse),
        (status = 400, description = "Empty ids or blank status"),
        (status = 401, description = "Missing or invalid API key"),
    )
)]
#[patch("/messages-status")]
pub async fn update_messages_status(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    body: web::Json<MessagesStatusUpdate>,
) -> Result<HttpResponse, AppError> {
    let ctx = resolve_tenant(&req, &app_state.db).await?;
    let payload = body.into_inner();

    if payload.ids.is_empty() {
        return Err(AppError::InvalidInput("ids must not be empty".to_string()));
    }
    if payload.status.trim().is_empty() {
        return Err(AppError::InvalidInput("status must not be blank".to_string()));
    }

    messages::Entity::update_many()
        .col_expr(messages::Column::Status, Expr::value(payload.status.clone()))
        .filter(messages::Column::Id.is_in(payload.ids))
        .filter(messages::Column::InstanceId.in_subquery(tenant_instances(&ctx.company_id)))
        .exec(&app_state.db)
        .await?;

    Ok(HttpResponse::Ok().json(AckResponse { ok: true }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/db")
            .service(list_chats)
            .service(list_contacts)
            .service(list_instances)
            .service(list_media)
            .service(get_integration_session)
            .service(list_messages)
            .service(update_chat_ai)
            .service(update_chat_unread)
            .service(update_messages_status),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::context::hash_api_key;
    use crate::app_state::AppState;
    use crate::config::Config;
    use crate::database::models::api_keys;
    use crate::services::identity_api::IdentityApiService;
    use actix_web::{test, App};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};

    fn test_config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "postgres://localhost/test".to_string(),
            database_max_connections: None,
            database_min_connections: None,
            database_connect_timeout_secs: None,
            database_acquire_timeout_secs: None,
            database_idle_timeout_secs: None,
            database_sql_log: None,
            evolution_api_url: None,
            agno_api_url: None,
            agno_default_port: None,
            identity_api_url: None,
            max_body_bytes: None,
        }
    }

    fn state_with(db: DatabaseConnection) -> AppState {
        AppState {
            db,
            config: test_config(),
            http: reqwest::Client::new(),
            identity: IdentityApiService::new(None),
        }
    }

    fn key_row(company_id: &str, raw_key: &str) -> api_keys::Model {
        api_keys::Model {
            id: "k1".to_string(),
            key_hash: hash_api_key(raw_key),
            company_id: company_id.to_string(),
            revoked_at: None,
            created_at: None,
        }
    }

    fn chat_row(id: &str, instance_id: &str) -> chats::Model {
        chats::Model {
            id: id.to_string(),
            remote_jid: format!("{}@s.whatsapp.net", id),
            name: Some("Chat".to_string()),
            unread_messages: 0,
            ai_enabled: true,
            labels: None,
            instance_id: instance_id.to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    macro_rules! test_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .service(web::scope("/api").configure(init_routes)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn missing_api_key_is_401_and_touches_no_other_table() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test_app!(state_with(db.clone()));

        for path in ["/api/db/chats", "/api/db/instances", "/api/db/contacts"] {
            let req = test::TestRequest::get().uri(path).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 401, "path {}", path);
        }

        assert!(db.into_transaction_log().is_empty());
    }

    #[actix_web::test]
    async fn chats_are_scoped_to_the_callers_tenant() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![key_row("company-a", "key-a")]])
            .append_query_results([vec![chat_row("c1", "inst-a")]])
            .into_connection();
        let app = test_app!(state_with(db.clone()));

        let req = test::TestRequest::get()
            .uri("/api/db/chats")
            .insert_header(("apikey", "key-a"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["chats"][0]["id"], "c1");
        assert_eq!(body["chats"][0]["remoteJid"], "c1@s.whatsapp.net");

        // The chat select must restrict instances to the resolved tenant.
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("companyId"));
        assert!(log.contains("company-a"));
    }

    #[actix_web::test]
    async fn message_limit_is_clamped_to_the_maximum() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![key_row("company-a", "key-a")]])
            .append_query_results([Vec::<messages::Model>::new()])
            .into_connection();
        let app = test_app!(state_with(db.clone()));

        let req = test::TestRequest::get()
            .uri("/api/db/messages?limit=5000&before=1700000000")
            .insert_header(("apikey", "key-a"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("1000"));
        assert!(log.contains("messageTimestamp"));
        assert!(log.contains("1700000000"));
    }

    #[actix_web::test]
    async fn empty_ids_in_messages_status_is_400_with_no_write() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![key_row("company-a", "key-a")]])
            .into_connection();
        let app = test_app!(state_with(db.clone()));

        let req = test::TestRequest::patch()
            .uri("/api/db/messages-status")
            .insert_header(("apikey", "key-a"))
            .set_json(serde_json::json!({"ids": [], "status": "READ"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        // Only the credential lookup ran.
        assert_eq!(db.into_transaction_log().len(), 1);
    }

    #[actix_web::test]
    async fn blank_status_is_400() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![key_row("company-a", "key-a")]])
            .into_connection();
        let app = test_app!(state_with(db));

        let req = test::TestRequest::patch()
            .uri("/api/db/messages-status")
            .insert_header(("apikey", "key-a"))
            .set_json(serde_json::json!({"ids": ["m1"], "status": "  "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn non_boolean_ai_flag_is_400() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test_app!(state_with(db.clone()));

        let req = test::TestRequest::patch()
            .uri("/api/db/chat-ai")
            .insert_header(("apikey", "key-a"))
            .set_json(serde_json::json!({"id": "c1", "enabled": "yes"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        assert!(db.into_transaction_log().is_empty());
    }

    #[actix_web::test]
    async fn messages_status_update_carries_the_tenant_clause() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![key_row("company-a", "key-a")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();
        let app = test_app!(state_with(db.clone()));

        let req = test::TestRequest::patch()
            .uri("/api/db/messages-status")
            .insert_header(("apikey", "key-a"))
            .set_json(serde_json::json!({"ids": ["m1", "m2"], "status": "READ"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["ok"], true);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("companyId"));
        assert!(log.contains("company-a"));
    }

    #[actix_web::test]
    async fn media_requires_a_message_id() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![key_row("company-a", "key-a")]])
            .into_connection();
        let app = test_app!(state_with(db));

        let req = test::TestRequest::get()
            .uri("/api/db/media")
            .insert_header(("apikey", "key-a"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[test]
    fn split_ids_handles_both_forms() {
        assert_eq!(
            split_ids(Some("a".into()), Some("b, c ,,".into())),
            vec!["a", "b", "c"]
        );
        assert!(split_ids(None, None).is_empty());
    }

    #[test]
    fn limits_and_pages_are_clamped() {
        assert_eq!(effective_message_limit(Some(5000), None), 1000);
        assert_eq!(effective_message_limit(None, Some(7)), 7);
        assert_eq!(effective_message_limit(None, None), 100);
        assert_eq!(effective_page(None, None), (1, 50));
        assert_eq!(effective_page(Some(0), Some(100_000)), (1, 200));
    }
}
