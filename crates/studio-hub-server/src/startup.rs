//! Actix server startup + app wiring.
//!
//! Builds the shared state, routes, middleware, and OpenAPI endpoints.

use std::path::PathBuf;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_cors::Cors;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse};
use actix_web::Error;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use futures_util::future::{ok, LocalBoxFuture, Ready};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::config;
use crate::events::EventBus;
use crate::fifo::ensure_named_pipe;
use crate::openapi;
use crate::queue_service::QueueService;
use crate::search::YtDlpSearch;
use crate::state::AppState;
use crate::stream_launcher::PipeLauncher;
use crate::volume::WpctlVolume;

/// Build server state and start the Actix HTTP server.
pub(crate) async fn run(args: crate::Args) -> Result<()> {
    let cfg = load_config(args.config.as_ref())?;
    let cfg = cfg.resolve(args.bind)?;
    tracing::info!(
        bind = %cfg.bind,
        node = %cfg.node_id,
        fifo = %cfg.fifo_path.display(),
        yt_dlp = %cfg.yt_dlp_path,
        git_sha = env!("GIT_SHA"),
        build_date = env!("BUILD_DATE"),
        "starting studio-hub-server"
    );

    ensure_named_pipe(&cfg.fifo_path).await?;

    let events = EventBus::new();
    let launcher = Arc::new(PipeLauncher::new(
        cfg.yt_dlp_path.clone(),
        cfg.fifo_path.clone(),
    ));
    let queue = QueueService::new(launcher, events.clone());
    let search = Arc::new(YtDlpSearch::new(
        cfg.yt_dlp_path.clone(),
        cfg.search_limit,
        cfg.search_timeout,
    ));
    let volume = Arc::new(WpctlVolume::new(cfg.wpctl_path.clone(), cfg.volume_timeout));
    let state = web::Data::new(AppState::new(
        cfg.node_id.clone(),
        queue.clone(),
        search,
        volume,
        events,
    ));
    setup_shutdown(queue.clone());

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(FilteredLogger)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", openapi::ApiDoc::openapi()),
            )
            .configure(api::configure)
    })
    .bind(cfg.bind)?
    .run()
    .await?;

    queue.stop_stream();
    tracing::info!("studio-hub-server stopped");
    Ok(())
}

/// Return true when the request path should be logged.
fn should_log_path(path: &str) -> bool {
    !(path == "/api/status" || path == "/api/status/stream" || path == "/health")
}

/// Actix middleware that filters noisy paths from logging.
struct FilteredLogger;

impl<S, B> actix_web::dev::Transform<S, ServiceRequest> for FilteredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = FilteredLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(FilteredLoggerMiddleware { service })
    }
}

/// Service wrapper that applies the logging filter.
struct FilteredLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for FilteredLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let path = req.path().to_string();
        let should_log = should_log_path(&path);
        let method = req.method().clone();
        let peer = req.connection_info().realip_remote_addr().unwrap_or("-").to_string();
        let start = std::time::Instant::now();
        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            if should_log {
                tracing::info!(
                    method = %method,
                    path = %path,
                    status = %res.status().as_u16(),
                    peer = %peer,
                    elapsed_ms = %start.elapsed().as_millis(),
                    "http request"
                );
            }
            Ok(res)
        })
    }
}

/// Load server config from disk, falling back to built-in defaults.
fn load_config(path: Option<&PathBuf>) -> Result<config::ServerConfig> {
    if let Some(path) = path {
        return config::ServerConfig::load(path);
    }
    let auto_path = std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join("config.toml")));
    match auto_path {
        Some(path) if path.exists() => {
            tracing::info!(path = %path.display(), "using config next to executable");
            config::ServerConfig::load(&path)
        }
        _ => {
            tracing::info!("no config file; using defaults");
            Ok(config::ServerConfig::default())
        }
    }
}

/// Install Ctrl+C handler to stop the stream writer cleanly.
fn setup_shutdown(queue: QueueService) {
    let _ = ctrlc::set_handler(move || {
        queue.stop_stream();
        if let Some(system) = actix_web::rt::System::try_current() {
            system.stop();
        } else {
            std::process::exit(0);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_polls_are_not_logged() {
        assert!(!should_log_path("/api/status"));
        assert!(!should_log_path("/api/status/stream"));
        assert!(should_log_path("/api/queue"));
        assert!(should_log_path("/api/search"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let path = PathBuf::from("/nonexistent/studio-hub/config.toml");
        assert!(load_config(Some(&path)).is_err());
    }
}
