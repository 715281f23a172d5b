//! MarkOps API composition root.

#![forbid(unsafe_code)]

mod auth;
mod dev_seed;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use markops_application::{
    AccessControlService, CampaignService, NotificationService, OrganizationRepository,
    RoleAdminRepository, RoleAdminService, SsoService, TeamService, UserRepository, UserService,
};
use markops_core::AppError;
use markops_infrastructure::{
    Argon2PasswordHasher, ConsoleEmailService, PostgresAccessControlRepository,
    PostgresCampaignRepository, PostgresOrganizationRepository, PostgresPreferencesRepository,
    PostgresRoleAdminRepository, PostgresTeamRepository, PostgresUserRepository,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let command = env::args().nth(1);
    let migrate_only = command.as_deref() == Some("migrate");
    let seed = command.as_deref() == Some("seed");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);
    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .unwrap_or_else(|_| "false".to_owned())
        .eq_ignore_ascii_case("true");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    if seed {
        dev_seed::run(&pool).await?;
        info!("development fixtures seeded");
        return Ok(());
    }

    let session_store = PostgresStore::new(pool.clone())
        .with_table_name("tower_sessions")
        .map_err(|error| {
            AppError::Validation(format!("invalid session table name configuration: {error}"))
        })?;
    session_store.migrate().await.map_err(|error| {
        AppError::Internal(format!("failed to initialize session store: {error}"))
    })?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30)));

    let access_control_repository = Arc::new(PostgresAccessControlRepository::new(pool.clone()));
    let access_control_service = AccessControlService::new(access_control_repository);

    let campaign_repository = Arc::new(PostgresCampaignRepository::new(pool.clone()));
    let campaign_service = CampaignService::new(campaign_repository);

    let team_repository = Arc::new(PostgresTeamRepository::new(pool.clone()));
    let team_service = TeamService::new(team_repository);

    let user_repository: Arc<dyn UserRepository> =
        Arc::new(PostgresUserRepository::new(pool.clone()));
    let organization_repository: Arc<dyn OrganizationRepository> =
        Arc::new(PostgresOrganizationRepository::new(pool.clone()));
    let role_admin_repository: Arc<dyn RoleAdminRepository> =
        Arc::new(PostgresRoleAdminRepository::new(pool.clone()));

    let password_hasher = Arc::new(Argon2PasswordHasher::new());
    let email_service = Arc::new(ConsoleEmailService::new(frontend_url.clone()));
    let user_service = UserService::new(
        user_repository.clone(),
        organization_repository.clone(),
        password_hasher,
        email_service,
    );

    let role_admin_service = RoleAdminService::new(role_admin_repository.clone());
    let sso_service = SsoService::new(
        user_repository.clone(),
        organization_repository,
        role_admin_repository.clone(),
    );

    let preferences_repository = Arc::new(PostgresPreferencesRepository::new(pool.clone()));
    let notification_service = NotificationService::new(
        user_repository,
        preferences_repository,
        role_admin_repository,
    );

    let app_state = AppState {
        access_control_service,
        campaign_service,
        notification_service,
        role_admin_service,
        sso_service,
        team_service,
        user_service,
        frontend_url: frontend_url.clone(),
    };

    // Campaign routes carry the request classifier in addition to the
    // session check; the classifier maps path and method onto a
    // MODULE:ACTION permission.
    let campaign_routes = Router::new()
        .route(
            "/api/campaigns",
            get(handlers::list_campaigns_handler).post(handlers::create_campaign_handler),
        )
        .route(
            "/api/campaigns/{campaign_id}",
            get(handlers::get_campaign_handler)
                .put(handlers::update_campaign_handler)
                .delete(handlers::delete_campaign_handler),
        )
        .route(
            "/api/campaigns/{campaign_id}/status",
            put(handlers::update_campaign_status_handler),
        )
        .route(
            "/api/campaigns/{campaign_id}/approve",
            post(handlers::approve_campaign_handler),
        )
        .route(
            "/api/campaigns/{campaign_id}/export",
            get(handlers::export_campaign_handler),
        )
        .route(
            "/api/campaigns/{campaign_id}/assignments",
            get(handlers::list_assignments_handler).post(handlers::add_assignment_handler),
        )
        .route(
            "/api/campaigns/{campaign_id}/metrics",
            get(handlers::list_metrics_handler).post(handlers::record_metric_handler),
        )
        .route(
            "/api/campaigns/{campaign_id}/metrics/summary",
            get(handlers::metrics_summary_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::enforce_module_permissions,
        ))
        .route_layer(from_fn(middleware::require_auth));

    // Team routes enforce membership inside the handlers; the guard
    // yields the fixed {"error": ...} denials.
    let team_routes = Router::new()
        .route(
            "/api/teams",
            get(handlers::list_teams_handler).post(handlers::create_team_handler),
        )
        .route(
            "/api/teams/{team_id}",
            get(handlers::team_detail_handler).delete(handlers::delete_team_handler),
        )
        .route(
            "/api/teams/{team_id}/members",
            post(handlers::add_team_member_handler),
        )
        .route(
            "/api/teams/{team_id}/members/{user_id}",
            put(handlers::change_team_member_role_handler)
                .delete(handlers::remove_team_member_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    let me_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/me/preferences",
            get(handlers::get_preferences_handler).put(handlers::update_preferences_handler),
        )
        .route(
            "/me/notification-settings",
            get(handlers::list_notification_settings_handler)
                .put(handlers::update_notification_setting_handler),
        )
        .route(
            "/me/notifications/test-dispatch",
            post(handlers::test_dispatch_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    // Role administration is superuser-only; the handlers enforce it.
    let admin_routes = Router::new()
        .route(
            "/admin/roles",
            get(handlers::list_roles_handler).post(handlers::create_role_handler),
        )
        .route(
            "/admin/permissions",
            get(handlers::list_permission_catalog_handler),
        )
        .route(
            "/admin/roles/{role_id}/permissions",
            get(handlers::list_role_grants_handler)
                .post(handlers::grant_permission_handler)
                .delete(handlers::revoke_permission_handler),
        )
        .route(
            "/admin/users/{user_id}/roles",
            get(handlers::list_user_roles_handler)
                .post(handlers::assign_user_role_handler)
                .delete(handlers::unassign_user_role_handler),
        )
        .route(
            "/admin/users/{user_id}/permissions",
            get(handlers::list_user_permissions_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/verify", get(auth::verify_email_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/sso/login", get(auth::sso_login_handler))
        .route("/auth/sso/callback", get(auth::sso_callback_handler))
        .merge(me_routes)
        .merge(team_routes)
        .merge(campaign_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "markops-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
