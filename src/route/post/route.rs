use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Query},
	openapi::tag,
	retriever::PostInfoRetriever,
};

use super::{model, RouteError};

/// Get post info
/// Returns a single post by its slug, with its creation date formatted for display.
/// All other fields are passed through from the content API unchanged.
#[route(
	tag = tag::POST,
	response(status = 404, description = "The content API does not know the slug. Other client errors from it are relayed the same way."),
	response(status = 502, description = "The content API failed or returned a malformed post."),
	response(status = 504, description = "The content API did not respond in time.")
)]
pub async fn get_post_info(
	State(retriever): State<PostInfoRetriever>,
	Query(input): Query<model::PostInfoInput>,
) -> Result<Json<model::PostDisplay>, RouteError> {
	let post = retriever.retrieve(input.slug.as_deref()).await?;

	Ok(Json(post))
}

#[cfg(test)]
mod test {
	use std::time::Duration;

	use axum::{extract::Query, http::StatusCode, routing::get, Router};

	use crate::test::*;

	/// A content API holding a single post.
	fn content_api(created_at: Value) -> Router {
		Router::new().route(
			"/info",
			get(move |Query(query): Query<HashMap<String, String>>| {
				let created_at = created_at.clone();

				async move {
					match query.get("slug").map(String::as_str) {
						Some("hello-world") => Ok(axum::Json(json!({
							"data": {
								"slug": "hello-world",
								"title": "Hello, world",
								"createdAt": created_at,
								"tags": ["intro"],
								"author": { "name": "Ada" },
							}
						}))),
						Some(_) | None => Err(StatusCode::NOT_FOUND),
					}
				}
			}),
		)
	}

	#[tokio::test]
	async fn test_get_post_info() {
		let base = spawn_upstream(content_api(json!("2024-01-05T00:00:00Z"))).await;
		let app = app(&base);

		let response = app
			.get("/api/posts/info")
			.add_query_param("slug", "hello-world")
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(
			response.json::<Value>(),
			json!({
				"slug": "hello-world",
				"title": "Hello, world",
				"createdAt": "Jan 5, 2024",
				"tags": ["intro"],
				"author": { "name": "Ada" },
			})
		);
	}

	#[tokio::test]
	async fn test_two_digit_day() {
		let base = spawn_upstream(content_api(json!("2024-12-25T00:00:00Z"))).await;

		let response = app(&base)
			.get("/api/posts/info")
			.add_query_param("slug", "hello-world")
			.await;

		assert_eq!(response.json::<Value>()["createdAt"], "Dec 25, 2024");
	}

	#[tokio::test]
	async fn test_repeated_lookups_are_identical() {
		let base = spawn_upstream(content_api(json!("2024-01-05T00:00:00Z"))).await;
		let app = app(&base);

		let first = app
			.get("/api/posts/info")
			.add_query_param("slug", "hello-world")
			.await
			.text();
		let second = app
			.get("/api/posts/info")
			.add_query_param("slug", "hello-world")
			.await
			.text();

		assert_eq!(first, second);
	}

	#[tokio::test]
	async fn test_unknown_slug_is_relayed() {
		let base = spawn_upstream(content_api(json!("2024-01-05T00:00:00Z"))).await;

		let response = app(&base)
			.get("/api/posts/info")
			.add_query_param("slug", "nope")
			.expect_failure()
			.await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
		assert_eq!(
			response.json::<Value>(),
			json!([{ "content": "upstream_status", "details": { "status": 404 } }])
		);
	}

	#[tokio::test]
	async fn test_missing_slug_is_passed_through() {
		let base = spawn_upstream(content_api(json!("2024-01-05T00:00:00Z"))).await;

		let response = app(&base).get("/api/posts/info").expect_failure().await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_upstream_server_error() {
		let base = spawn_upstream(Router::new().route(
			"/info",
			get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
		))
		.await;

		let response = app(&base)
			.get("/api/posts/info")
			.add_query_param("slug", "hello-world")
			.expect_failure()
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
	}

	#[tokio::test]
	async fn test_upstream_unreachable() {
		let base = unreachable_upstream().await;

		let response = app(&base)
			.get("/api/posts/info")
			.add_query_param("slug", "hello-world")
			.expect_failure()
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
		assert_eq!(
			response.json::<Value>(),
			json!([{ "content": "upstream_unavailable" }])
		);
	}

	#[tokio::test]
	async fn test_upstream_timeout() {
		let base = spawn_upstream(Router::new().route(
			"/info",
			get(|| async {
				tokio::time::sleep(Duration::from_secs(5)).await;
				StatusCode::OK
			}),
		))
		.await;

		let response = app_with_timeout(&base, Duration::from_millis(100))
			.get("/api/posts/info")
			.add_query_param("slug", "hello-world")
			.expect_failure()
			.await;

		assert_eq!(response.status_code(), StatusCode::GATEWAY_TIMEOUT);
		assert_eq!(
			response.json::<Value>(),
			json!([{ "content": "upstream_unavailable" }])
		);
	}

	#[tokio::test]
	async fn test_malformed_query_is_rejected() {
		let base = spawn_upstream(content_api(json!("2024-01-05T00:00:00Z"))).await;

		let response = app(&base)
			.get("/api/posts/info?slug=a&slug=b")
			.expect_failure()
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(response.json::<Value>()[0]["content"], "invalid_query");
	}

	#[tokio::test]
	async fn test_missing_envelope() {
		let bodies = [json!({ "slug": "hello-world" }), json!({ "data": null })];

		for body in bodies {
			let base = spawn_upstream(Router::new().route(
				"/info",
				get(move || {
					let body = body.clone();
					async move { axum::Json(body) }
				}),
			))
			.await;

			let response = app(&base)
				.get("/api/posts/info")
				.add_query_param("slug", "hello-world")
				.expect_failure()
				.await;

			assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
			assert_eq!(
				response.json::<Value>(),
				json!([{ "content": "malformed_upstream_response" }])
			);
		}
	}

	#[tokio::test]
	async fn test_missing_created_at() {
		let base = spawn_upstream(content_api(Value::Null)).await;

		let response = app(&base)
			.get("/api/posts/info")
			.add_query_param("slug", "hello-world")
			.expect_failure()
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
		assert_eq!(
			response.json::<Value>(),
			json!([{ "content": "malformed_upstream_response", "field": "createdAt" }])
		);
	}

	#[tokio::test]
	async fn test_invalid_created_at() {
		let base = spawn_upstream(content_api(json!("not a date"))).await;

		let response = app(&base)
			.get("/api/posts/info")
			.add_query_param("slug", "hello-world")
			.expect_failure()
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
		assert!(!response.text().contains("Invalid Date"));
		assert_eq!(response.json::<Value>()[0]["content"], "invalid_created_at");
	}

	#[tokio::test]
	async fn test_response_has_request_id() {
		let base = spawn_upstream(content_api(json!("2024-01-05T00:00:00Z"))).await;

		let response = app(&base)
			.get("/api/posts/info")
			.add_query_param("slug", "hello-world")
			.await;

		assert!(!response.header("x-request-id").is_empty());
	}
}
