#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod model;
mod openapi;
mod relay;
mod route;
mod store;
mod trace;

use std::sync::Arc;

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::{http::HeaderValue, Extension, Router};
use tower::Layer;
use tower_http::{
	compression::CompressionLayer,
	cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
	normalize_path::NormalizePathLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{
	config::Config,
	relay::{KeySource, Relay, API_KEY_VAR},
	store::{PgPostStore, Posts},
};

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

/// The shared application state.
///
/// Both dependencies are long-lived and shared by every request.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub posts: Posts,
	pub relay: Arc<Relay>,
}

/// Builds the application with its documentation and per-request layers.
pub fn router(state: AppState) -> Router {
	let mut api = OpenApi::default();

	ApiRouter::new()
		.merge(route::health::routes())
		.nest("/api/posts", route::post::routes())
		.nest("/api/ai", route::ai::routes())
		.nest("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(CompressionLayer::new())
		.layer(TraceLayer::new_for_http())
		.layer(PropagateRequestIdLayer::x_request_id())
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
		.with_state(state)
}

/// Trims trailing slashes before routing, so `/api/posts/` reaches the same
/// handler as `/api/posts`.
pub fn normalize(router: Router) -> Router {
	Router::new().fallback_service(NormalizePathLayer::trim_trailing_slash().layer(router))
}

fn cors(origins: &[String]) -> CorsLayer {
	let origins = origins
		.iter()
		.filter_map(|origin| match origin.parse::<HeaderValue>() {
			Ok(origin) => Some(origin),
			Err(..) => {
				tracing::warn!(%origin, "ignoring invalid CORS origin");
				None
			}
		})
		.collect::<Vec<_>>();

	CorsLayer::new()
		.allow_origin(AllowOrigin::list(origins))
		.allow_credentials(true)
		.allow_methods(AllowMethods::mirror_request())
		.allow_headers(AllowHeaders::mirror_request())
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	let config = Config::from_env().expect("invalid configuration");
	let _guard = trace::init_tracing_subscriber(&config).expect("failed to initialise tracing");

	let posts = PgPostStore::connect(&config.database_url, config.database_name.as_deref())
		.await
		.expect("failed to connect to database");

	let state = State {
		posts: Arc::new(posts),
		relay: Arc::new(Relay::new(KeySource::Env(API_KEY_VAR), config.llm.clone())),
	};

	let app = normalize(router(state).layer(cors(&config.cors_origins)));

	let listener = tokio::net::TcpListener::bind((config.host, config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!(host = %config.host, port = config.port, "listening");

	axum::serve(listener, app)
		.await
		.expect("server error");
}
