//! The dashboard web server: one HTML page plus a small JSON API.

mod api;
mod error;

pub use api::{FacilityEntry, ReportDto, StationDetailDto, StationDto, StatusDto};
pub use error::{NO_DATA_MESSAGE, RouteErrorResponse, RouteResult};

use crate::fetch::HttpClient;
use crate::mbta::MbtaClient;
use crate::report::TextGenerator;
use axum::{Router, response::Html, routing::get};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

const DASHBOARD_HTML: &str = include_str!("../../assets/dashboard.html");

/// Read-only for the life of the process.
#[derive(Clone)]
pub struct AppState {
    pub mbta: Arc<MbtaClient<Box<dyn HttpClient>>>,
    pub reports: Arc<dyn TextGenerator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .nest("/api", api::routes(state))
        .layer(TraceLayer::new_for_http())
}

async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

/// Serves on an already bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}

pub async fn start_web_server(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Dashboard listening");
    serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutting down");
    })
    .await
}
