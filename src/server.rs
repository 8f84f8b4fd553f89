//! HTTP surface of the dashboard

use crate::config::Config;
use crate::controller::DashboardController;
use crate::render::{RenderOptions, Renderer};
use crate::source::StatusSource;
use crate::theme::{COLOR_SCHEME_HINT, THEME_COOKIE, Theme, ThemeController};

use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, Responder, web};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state of the dashboard server. Per-viewer state (range and theme)
/// travels with each request.
pub struct AppState {
    pub config: Config,
    pub controller: Arc<DashboardController>,
    pub renderer: Renderer,
    pub themes: ThemeController,
}

impl AppState {
    pub fn new(config: Config, source: Arc<dyn StatusSource>) -> Self {
        let controller = Arc::new(DashboardController::new(
            source,
            config.default_days,
            config.refresh_interval,
        ));
        let renderer = Renderer::new(RenderOptions::from(&config));
        let themes = ThemeController::new(config.default_theme);

        Self {
            config,
            controller,
            renderer,
            themes,
        }
    }

    /// Range a request asks for. Only ranges offered by the controls are
    /// honoured; anything else falls back to the default range.
    fn requested_range(&self, days: Option<u32>) -> u32 {
        match days {
            Some(days) if self.config.is_offered_range(days) => days,
            Some(days) => {
                warn!("Ignoring request for unsupported range: {} days", days);
                self.config.default_days
            }
            None => self.config.default_days,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub days: Option<u32>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

fn theme_signals(req: &HttpRequest) -> (Option<String>, Option<Theme>) {
    let stored = req.cookie(THEME_COOKIE).map(|c| c.value().to_string());
    let system = req
        .headers()
        .get(COLOR_SCHEME_HINT)
        .and_then(|value| value.to_str().ok())
        .and_then(Theme::from_client_hint);
    (stored, system)
}

fn theme_cookie(theme: Theme) -> Cookie<'static> {
    Cookie::build(THEME_COOKIE, theme.as_str())
        .path("/")
        .permanent()
        .finish()
}

// Render the dashboard for the requested range
pub async fn index(
    req: HttpRequest,
    query: web::Query<RangeQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    let days = data.requested_range(query.days);
    let view = data.controller.ensure_loaded(days).await;

    let (stored, system) = theme_signals(&req);
    let choice = data.themes.startup(stored.as_deref(), system);

    let html = data.renderer.render_page(&view, days, choice.theme, &Local::now());

    let mut response = HttpResponse::Ok();
    response
        .content_type("text/html; charset=utf-8")
        .insert_header(("Accept-CH", COLOR_SCHEME_HINT))
        .insert_header((header::VARY, COLOR_SCHEME_HINT));
    if choice.persist {
        response.cookie(theme_cookie(choice.theme));
    }
    response.body(html)
}

// Flip the theme and store it in the cookie
pub async fn toggle_theme(
    req: HttpRequest,
    query: web::Query<RangeQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    let (stored, system) = theme_signals(&req);
    let current = data.themes.resolve(stored.as_deref(), system);
    let next = data.themes.toggle(current);
    info!("Theme toggled from {} to {}", current, next);

    let days = data.requested_range(query.days);
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, format!("/?days={}", days)))
        .cookie(theme_cookie(next))
        .finish()
}

// Manual retry from the error state
pub async fn refresh(query: web::Query<RangeQuery>, data: web::Data<AppState>) -> impl Responder {
    let days = data.requested_range(query.days);
    let outcome = data.controller.refresh(days).await;
    info!("Manual refresh of {} days finished: {:?}", days, outcome);

    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, format!("/?days={}", days)))
        .finish()
}

pub async fn health_check() -> impl Responder {
    web::Json(HealthResponse {
        status: "OK".into(),
    })
}

/// Register every dashboard route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/theme", web::post().to(toggle_theme))
        .route("/refresh", web::post().to(refresh))
        .route("/health", web::get().to(health_check));
}

/// Serve the dashboard until the process is stopped, refreshing in the
/// background.
pub async fn run_server(state: AppState) -> std::io::Result<()> {
    let bind_address = state.config.bind_address.clone();
    let data = web::Data::new(state);

    let controller = Arc::clone(&data.controller);
    tokio::spawn(controller.run_periodic());

    info!("Server is live at http://{}", bind_address);

    HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .bind(bind_address.as_str())?
        .run()
        .await
}
