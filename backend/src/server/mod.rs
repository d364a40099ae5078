//! Server construction and middleware wiring.

mod config;
mod state_builders;
mod sweeper;

pub use config::AppSettings;

use state_builders::build_http_state;
use sweeper::spawn_expiry_sweeper;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(feature = "metrics")]
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use tracing::info;

use marketplace::Trace;
#[cfg(debug_assertions)]
use marketplace::doc::ApiDoc;
use marketplace::inbound::http::configure_api;
use marketplace::inbound::http::health::{HealthState, live, ready};
use marketplace::inbound::http::state::HttpState;
use marketplace::inbound::ws;
use marketplace::inbound::ws::state::{OriginAllowList, WsState};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure_api))
        .service(ws::ws_entry)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

#[cfg(feature = "metrics")]
fn build_metrics() -> std::io::Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new("marketplace")
        .endpoint("/metrics")
        .build()
        .map_err(|err| std::io::Error::other(format!("configure Prometheus metrics: {err}")))
}

/// Construct the Actix HTTP server from settings.
///
/// Builds the adapters and services, starts the expiry sweeper when enabled,
/// binds the listener and marks the service ready.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when wiring fails or the socket cannot be
/// bound.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    settings: &AppSettings,
) -> std::io::Result<Server> {
    settings.validate().map_err(std::io::Error::other)?;

    let http_state = build_http_state(settings).await?;

    #[cfg(feature = "metrics")]
    let metrics = build_metrics()?;

    if let Some(period) = settings.expiry_sweep_interval() {
        #[cfg(feature = "metrics")]
        let on_expired = {
            let counter = sweeper::expired_requests_counter(&metrics.registry).map_err(|err| {
                std::io::Error::other(format!("register expiry metrics: {err}"))
            })?;
            move |count: usize| counter.inc_by(u64::try_from(count).unwrap_or(u64::MAX))
        };
        #[cfg(not(feature = "metrics"))]
        let on_expired = |_: usize| {};
        spawn_expiry_sweeper(http_state.requests.clone(), period, on_expired);
    }
    let ws_state = web::Data::new(
        WsState::new(
            http_state.requests_query.clone(),
            OriginAllowList::new(settings.ws_allowed_origins()),
        )
        .with_refresh_interval(settings.ws_refresh_interval()),
    );
    let http_state = web::Data::new(http_state);
    let server_health_state = health_state.clone();

    let bind_addr = settings.bind_addr();
    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    info!(%bind_addr, "marketplace listening");
    health_state.mark_ready();
    Ok(server)
}
