#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod openapi;
mod retriever;
mod route;
mod trace;
mod upstream;

use std::sync::Arc;

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::{body::Body, http::Request, Extension, Router};
use tower::ServiceBuilder;
use tower_http::{
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use config::Config;
use retriever::PostInfoRetriever;

pub type AppState = State;

/// The shared application state.
///
/// Everything in here is read-only once the server starts; requests
/// share nothing mutable.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub retriever: PostInfoRetriever,
}

/// Builds the application router, including the `OpenAPI` document.
pub fn app(state: AppState) -> Router {
	let mut api = OpenApi::default();

	ApiRouter::new()
		.nest_api_service("/docs", route::docs::routes())
		.nest("/api/posts", route::post::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http().make_span_with(request_span))
				.layer(PropagateRequestIdLayer::x_request_id()),
		)
		.with_state(state)
}

fn request_span(request: &Request<Body>) -> tracing::Span {
	let request_id = request
		.headers()
		.get("x-request-id")
		.and_then(|value| value.to_str().ok())
		.unwrap_or_default();

	tracing::info_span!(
		"request",
		method = %request.method(),
		uri = %request.uri(),
		request_id,
	)
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	let config = Config::from_env().expect("invalid configuration");
	let _guard =
		trace::init_tracing_subscriber(config.otlp_export).expect("failed to initialize tracing");

	let state = State {
		retriever: PostInfoRetriever::from_config(&config)
			.expect("failed to build content API client"),
	};

	let listener = tokio::net::TcpListener::bind((config.host, config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!(
		upstream = %config.upstream_base_url,
		"listening on {}:{}",
		config.host,
		config.port
	);

	axum::serve(listener, app(state))
		.with_graceful_shutdown(shutdown_signal())
		.await
		.expect("server error");
}

async fn shutdown_signal() {
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::error!(%error, "failed to listen for shutdown signal");
		std::future::pending::<()>().await;
	}

	tracing::info!("shutting down");
}
