#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for corona stats.
//!
//! Serves case curves, weekday reporting bias and reproduction number
//! estimates computed on demand from an in-memory case table. The table
//! is an immutable snapshot; `POST /api/refresh` loads a new one from the
//! configured source and swaps it in. Requests already running keep the
//! snapshot they started with.

mod handlers;
pub mod interactive;

use std::sync::{Arc, PoisonError, RwLock};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use corona_stats_estimation::CaseTable;
use corona_stats_source::config::AppConfig;

/// Shared application state.
pub struct AppState {
    snapshot: RwLock<Arc<CaseTable>>,
    /// Source to refresh from and default pipeline settings.
    pub config: AppConfig,
}

impl AppState {
    #[must_use]
    pub fn new(table: CaseTable, config: AppConfig) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(table)),
            config,
        }
    }

    /// Returns the current case table.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CaseTable> {
        let guard = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swaps in a new case table.
    pub fn replace(&self, table: CaseTable) {
        let table = Arc::new(table);
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *guard = table;
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/area-types", web::get().to(handlers::area_types))
            .route("/areas", web::get().to(handlers::areas))
            .route("/curve", web::get().to(handlers::curve))
            .route("/r", web::get().to(handlers::r))
            .route("/weekly-factor", web::get().to(handlers::weekly_factor))
            .route("/report", web::get().to(handlers::report))
            .route("/refresh", web::post().to(handlers::refresh)),
    );
}

/// Starts the corona stats API server.
///
/// Loads the case table from `config.source`, then serves the API on
/// `config.server`. This is a regular async function; the caller is
/// responsible for providing the async runtime (e.g. via
/// `#[actix_web::main]`) and for initializing logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the initial load fails, or the
/// HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: AppConfig) -> std::io::Result<()> {
    log::info!("Loading case table from {}...", config.source);
    let table = corona_stats_source::load(&config.source)
        .await
        .map_err(std::io::Error::other)?;

    let bind_addr = config.server.bind_addr.clone();
    let port = config.server.port;

    let state = web::Data::new(AppState::new(table, config));

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
