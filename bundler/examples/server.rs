//! # Bundle API
//!
//! A (naive) HTTP server generating microservice bundles. POST an
//! organization snapshot to `/api/download-microservices` to receive the
//! bundle as a zip archive.
//!
//! Generation settings are read from the JSON file named by `BUNDLER_CONFIG`
//! when set.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use credibil_bundler::microservice::Kind;
use credibil_bundler::provider::{Environment, RemoteTemplate, StandardEnvironment, Template};
use credibil_bundler::{Config, Endpoint, Fault, Snapshot, generate};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Clone)]
struct Provider {
    template: RemoteTemplate,
    environment: StandardEnvironment,
}

impl Template for Provider {
    async fn fetch(&self) -> anyhow::Result<Vec<u8>> {
        self.template.fetch().await
    }
}

impl Environment for Provider {
    fn fill(&self, endpoint: &Endpoint, kind: Kind) -> anyhow::Result<BTreeMap<String, String>> {
        self.environment.fill(endpoint, kind)
    }
}

#[derive(Clone)]
struct AppState {
    provider: Provider,
    config: Config,
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("set subscriber");

    let config = std::env::var("BUNDLER_CONFIG").map_or_else(
        |_| Config::default(),
        |path| {
            let json = std::fs::read_to_string(path).expect("should read config");
            Config::from_json(&json).expect("should parse config")
        },
    );
    let state = AppState {
        provider: Provider {
            template: RemoteTemplate::from(&config),
            environment: StandardEnvironment::from(&config),
        },
        config,
    };

    let cors = CorsLayer::new().allow_methods(Any).allow_origin(Any).allow_headers(Any);
    let router = Router::new()
        .route("/api/download-microservices", post(download))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store"),
        ))
        .with_state(state);

    let listener = TcpListener::bind("0.0.0.0:8080").await.expect("should bind");
    tracing::info!("listening on {}", listener.local_addr().expect("should have addr"));
    axum::serve(listener, router).await.expect("server should run");
}

// Input problems are reported to the caller; template problems are not.
#[axum::debug_handler]
async fn download(State(state): State<AppState>, Json(snapshot): Json<Snapshot>) -> Response {
    match generate(&state.provider, &snapshot, &state.config).await {
        Ok(bundle) => (
            [
                (header::CONTENT_TYPE, credibil_bundler::CONTENT_TYPE),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"microservices.zip\""),
            ],
            bundle,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("bundle generation failed: {e}");
            match e.fault() {
                Fault::Input => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
                Fault::Template => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "bundle generation failed").into_response()
                }
            }
        }
    }
}
