use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, upstream, AppState};

pub mod model;
pub mod route;

/// An error that can occur while looking up a post.
///
/// Upstream details stay in the Display output, which is only logged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Upstream(#[from] upstream::Error),
	#[error("post has no createdAt")]
	MissingCreatedAt,
	#[error("post has an invalid createdAt: {0}")]
	InvalidCreatedAt(serde_json::Value),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route("/info", get_with(get_post_info, get_post_info_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			// the upstream knows best why it rejected the lookup
			Self::Upstream(upstream::Error::Status(status)) if status.is_client_error() => *status,
			Self::Upstream(upstream::Error::Request(error)) if error.is_timeout() => {
				StatusCode::GATEWAY_TIMEOUT
			}
			Self::Upstream(..) | Self::MissingCreatedAt | Self::InvalidCreatedAt(..) => {
				StatusCode::BAD_GATEWAY
			}
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		let message = match self {
			Self::Upstream(upstream::Error::Request(..)) => {
				error::Message::new("upstream_unavailable")
			}
			Self::Upstream(upstream::Error::Status(status)) => {
				error::Message::new("upstream_status").detail("status", status.as_u16())
			}
			Self::Upstream(upstream::Error::Decode(..)) => {
				error::Message::new("malformed_upstream_response")
			}
			Self::MissingCreatedAt => {
				error::Message::new("malformed_upstream_response").field(model::CREATED_AT)
			}
			Self::InvalidCreatedAt(value) => error::Message::new("invalid_created_at")
				.field(model::CREATED_AT)
				.detail("value", value.clone()),
		};

		message.into_vec()
	}
}
