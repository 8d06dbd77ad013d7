use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use craftychat_gateway::api::db::structures;
use craftychat_gateway::api::{db, health, middleware, proxy, session};
use craftychat_gateway::app_state::AppState;
use craftychat_gateway::config::Config;
use craftychat_gateway::database::{connector, models};
use craftychat_gateway::services::identity_api::{self, IdentityApiService};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().expect("Failed to load configuration");
    let db = connector::connect_with_settings(&config.database_settings())
        .await
        .expect("Failed to connect to database");

    #[derive(OpenApi)]
    #[openapi(
        paths(
            // Query gateway
            db::handlers::list_chats,
            db::handlers::list_contacts,
            db::handlers::list_instances,
            db::handlers::list_media,
            db::handlers::get_integration_session,
            db::handlers::list_messages,
            db::handlers::update_chat_ai,
            db::handlers::update_chat_unread,
            db::handlers::update_messages_status,
            // Session
            session::bootstrap,
            session::logout,
            // Ops
            health::healthz,
        ),
        components(
            schemas(
                // --- Entities ---
                models::chats::Model,
                models::contacts::Model,
                models::instances::Model,
                models::media::Model,
                models::messages::Model,
                models::integration_sessions::Model,

                // --- DTOs ---
                structures::ChatListResponse,
                structures::ContactListResponse,
                structures::InstanceListResponse,
                structures::MediaListResponse,
                structures::IntegrationSessionResponse,
                structures::MessageListResponse,
                structures::AckResponse,
                structures::ChatAiUpdate,
                structures::ChatUnreadUpdate,
                structures::MessagesStatusUpdate,
                session::BootstrapResponse,

                // --- Identity API structs ---
                identity_api::Profile,
                identity_api::CompanySummary,
                identity_api::IssuedApiKey,
            )
        ),
        tags(
            (name = "Query Gateway", description = "Tenant-scoped reads and writes over the shared messaging schema"),
            (name = "Session", description = "Bearer-token bootstrap and logout"),
            (name = "Ops", description = "Operational endpoints")
        )
    )]
    struct ApiDoc;

    let state = AppState {
        db,
        config: config.clone(),
        http: reqwest::Client::new(),
        identity: IdentityApiService::new(config.identity_api_url.clone()),
    };

    let host = config.host.clone();
    let port = config.port;
    let max_body = config.effective_max_body_bytes();

    log::info!("Starting server at http://{}:{}", host, port);
    log::info!("Swagger UI available at http://{}:{}/swagger-ui/", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::trim())
            .wrap(middleware::AuthGate)
            .wrap(middleware::RequestId)
            .app_data(web::Data::new(state.clone()))
            .app_data(web::PayloadConfig::new(max_body))
            .service(health::healthz)
            .service(
                web::scope("/api")
                    .configure(db::init_routes)
                    .configure(session::init_routes)
                    .configure(proxy::init_routes),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
