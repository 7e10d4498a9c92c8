//! Web server module.

mod assets;
mod handlers;
mod views;

use crate::backend::Backend;
use crate::config::ServerConfig;
use crate::session::{self, SessionStore};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub backend: Backend,
    pub sessions: SessionStore,
}

/// Web server for SquidView.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(config: ServerConfig, backend: Backend) -> Self {
        Self {
            state: AppState {
                config,
                backend,
                sessions: SessionStore::default(),
            },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

        Router::new()
            // Dashboard
            .route("/", get(handlers::handle_dashboard))
            .route("/dashboard/date", post(handlers::handle_select_date))
            .route("/dashboard/page", post(handlers::handle_page))
            .route("/dashboard/search", get(handlers::handle_search))
            // Log viewer
            .route("/users/{index}/logs/open", post(handlers::handle_open_logs))
            .route("/users/{index}/logs/close", post(handlers::handle_close_logs))
            .route("/users/{index}/logs/search", post(handlers::handle_logs_search))
            .route(
                "/users/{index}/logs/filter/{category}",
                post(handlers::handle_logs_filter),
            )
            // Dialogs
            .route("/dialogs/{name}/close", post(handlers::handle_dialog_close))
            .route("/confirm/accept", post(handlers::handle_confirm_accept))
            .route("/confirm/cancel", post(handlers::handle_confirm_cancel))
            // ACL editor
            .route("/admin/acls", get(handlers::handle_acls))
            .route("/admin/acls/new", post(handlers::handle_acl_new))
            .route("/admin/acls/{id}/edit", post(handlers::handle_acl_edit))
            .route("/admin/acls/{id}/delete", post(handlers::handle_acl_delete))
            .route("/admin/acls/form/{mode}", post(handlers::handle_acl_form))
            // Reports
            .route("/reports/go", post(handlers::handle_report_go))
            // Theme
            .route("/theme/toggle", post(handlers::handle_theme_toggle))
            .route(
                "/api/theme",
                get(handlers::handle_get_theme)
                    .put(handlers::handle_put_theme)
                    .delete(handlers::handle_delete_theme),
            )
            .route("/api/chart-theme", get(handlers::handle_chart_theme))
            .route("/api/charts", post(handlers::handle_register_chart))
            // API: users
            .route("/api/users", get(handlers::handle_api_users))
            .route("/api/users/{index}/logs", get(handlers::handle_api_user_logs))
            // Static assets
            .route("/static/{*path}", get(assets::handle_static))
            .route("/favicon.ico", get(assets::handle_favicon))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB
            .with_state(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);
        tracing::info!("Using backend at {}", self.state.config.backend_url);

        let sweeper = session::spawn_sweeper(
            self.state.sessions.clone(),
            self.state.config.session_sweep(),
            self.state.config.session_idle(),
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let served = axum::serve(listener, router).await;
        sweeper.abort();
        served?;

        Ok(())
    }
}
