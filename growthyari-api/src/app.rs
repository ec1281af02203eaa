/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use growthyari_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = growthyari_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{
        rate_limit::{login_rate_limit_layer, RateLimit, RateLimiter},
        security::SecurityHeadersLayer,
    },
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use growthyari_shared::{
    auth::{
        jwt::TokenType,
        middleware::{authenticate_admin, authenticate_user},
        oauth::GoogleOAuthClient,
    },
    email::{HttpMailer, LogMailer, Mailer},
    payments::{PaymentGateway, RazorpayGateway},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub mailer: Arc<dyn Mailer>,

    /// `None` when Google OAuth is not configured
    pub oauth: Option<Arc<GoogleOAuthClient>>,
    pub login_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Creates state with the production gateway and mailer
    pub fn new(db: PgPool, config: Config) -> Self {
        let gateway = RazorpayGateway::new(
            config.payments.key_id.clone(),
            config.payments.key_secret.clone(),
            config.payments.api_base.clone(),
        );

        let mailer: Arc<dyn Mailer> = match (&config.email.api_url, &config.email.api_key) {
            (Some(url), Some(key)) => Arc::new(HttpMailer::new(
                url.clone(),
                key.clone(),
                config.email.from.clone(),
            )),
            _ => {
                tracing::warn!("EMAIL_API_URL/EMAIL_API_KEY not set, emails will only be logged");
                Arc::new(LogMailer)
            }
        };

        let login_limiter = RateLimiter::new(RateLimit::login(), config.api.trusted_proxies.clone());

        let oauth = config
            .google_oauth()
            .map(|c| Arc::new(GoogleOAuthClient::new(c)));

        Self {
            db,
            config: Arc::new(config),
            gateway: Arc::new(gateway),
            mailer,
            oauth,
            login_limiter: Arc::new(login_limiter),
        }
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Whether cookies carry the `Secure` attribute
    pub fn secure_cookies(&self) -> bool {
        self.config.api.production
    }

    /// `Max-Age` for a cookie holding a token of `token_type`
    pub fn cookie_max_age(token_type: TokenType) -> i64 {
        token_type.default_expiration().num_seconds()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /health                                   public
/// /v1/auth/register|forgot-password|reset-password
/// /v1/auth/login                            rate limited
/// /v1/auth/logout
/// /v1/auth/oauth/google[/callback]
/// /v1/events            GET  list           public
/// /v1/events/:event     GET  by slug        public
/// /v1/events/:event/register|cancel         member
/// /v1/me, /v1/me/registrations              member
/// /v1/registrations/:id/ticket.pdf          member
/// /v1/payments/orders|verify                member
/// /v1/payments/webhook                      gateway signature
/// /v1/networking/*                          member
/// /v1/admin/login                           rate limited
/// /v1/admin/logout
/// /v1/admin/events[/:id[/registrations]]    admin
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication and rate limiting (per route group)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let login_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .layer(from_fn_with_state(state.clone(), login_rate_limit_layer));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/logout", post(routes::auth::logout))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", post(routes::auth::reset_password))
        .route("/oauth/google", get(routes::oauth::google_start))
        .route("/oauth/google/callback", get(routes::oauth::google_callback))
        .merge(login_routes);

    let public_event_routes = Router::new()
        .route("/", get(routes::events::list_events))
        .route("/:event", get(routes::events::get_event));

    let member_event_routes = Router::new()
        .route("/:event/register", post(routes::registrations::register))
        .route("/:event/cancel", post(routes::registrations::cancel))
        .layer(from_fn_with_state(state.clone(), user_auth_layer));

    let me_routes = Router::new()
        .route(
            "/",
            get(routes::profile::get_me).patch(routes::profile::update_me),
        )
        .route(
            "/registrations",
            get(routes::registrations::my_registrations),
        )
        .layer(from_fn_with_state(state.clone(), user_auth_layer));

    let ticket_routes = Router::new()
        .route("/:id/ticket.pdf", get(routes::registrations::ticket_pdf))
        .layer(from_fn_with_state(state.clone(), user_auth_layer));

    let payment_routes = Router::new()
        .route("/orders", post(routes::payments::create_order))
        .route("/verify", post(routes::payments::verify_payment))
        .layer(from_fn_with_state(state.clone(), user_auth_layer))
        .route("/webhook", post(routes::payments::webhook));

    let networking_routes = Router::new()
        .route("/presence", put(routes::networking::update_presence))
        .route("/peers", get(routes::networking::list_peers))
        .route(
            "/turn-credentials",
            get(routes::networking::turn_credentials),
        )
        .route("/socket-token", get(routes::networking::socket_token))
        .layer(from_fn_with_state(state.clone(), user_auth_layer));

    let admin_session_routes = Router::new()
        .route("/login", post(routes::admin::login))
        .layer(from_fn_with_state(state.clone(), login_rate_limit_layer))
        .route("/logout", post(routes::admin::logout));

    let admin_routes = Router::new()
        .route(
            "/events",
            get(routes::admin::list_events).post(routes::admin::create_event),
        )
        .route(
            "/events/:id",
            put(routes::admin::update_event).delete(routes::admin::delete_event),
        )
        .route(
            "/events/:id/registrations",
            get(routes::admin::event_registrations),
        )
        .layer(from_fn_with_state(state.clone(), admin_auth_layer))
        .merge(admin_session_routes);

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/events", public_event_routes.merge(member_event_routes))
        .nest("/me", me_routes)
        .nest("/registrations", ticket_routes)
        .nest("/payments", payment_routes)
        .nest("/networking", networking_routes)
        .nest("/admin", admin_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Member authentication from `gy_token` / `gy_session`
///
/// Inserts [`AuthContext`](growthyari_shared::auth::middleware::AuthContext)
/// into request extensions.
async fn user_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate_user(req.headers(), state.jwt_secret())?;
    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}

/// Admin authentication from `gy_admin`
async fn admin_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let admin = authenticate_admin(req.headers(), state.jwt_secret())?;
    req.extensions_mut().insert(admin);
    Ok(next.run(req).await)
}
