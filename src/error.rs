use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection::QueryRejection,
	http::{Response, StatusCode},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::extract::Json;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message sent to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A machine-readable error code.
	pub content: Cow<'a, str>,
	/// The request or upstream field the error relates to, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Additional context about the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'a, Map>>,
}

impl<'a> Message<'a> {
	pub fn new(content: impl Into<Cow<'a, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(|| Cow::Owned(Map::new()))
			.to_mut()
			.insert(key.into(), value.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

/// Describes how a route error is presented to the client.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;
	fn errors(&self) -> Vec<Message<'_>>;
}

/// Errors shared by every route, mostly extractor rejections.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("query error: {0}")]
	Query(#[from] QueryRejection),
}

impl AppError {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Query(rejection) => rejection.status(),
		}
	}

	pub fn errors(&self) -> Vec<Message<'_>> {
		match self {
			Self::Query(rejection) => Message::new("invalid_query")
				.detail("reason", rejection.body_text())
				.into_vec(),
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		render(self.status(), &self, self.errors())
	}
}

/// The error type returned by route handlers: either a shared [`AppError`]
/// or the route's own error `T`.
#[derive(Debug, thiserror::Error)]
pub enum RouteError<T> {
	#[error(transparent)]
	App(#[from] AppError),
	#[error(transparent)]
	Route(T),
}

impl<T: ErrorShape> From<T> for RouteError<T> {
	fn from(error: T) -> Self {
		Self::Route(error)
	}
}

impl<T: ErrorShape> IntoResponse for RouteError<T> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => render(error.status(), &error, error.errors()),
		}
	}
}

impl<T> OperationOutput for RouteError<T> {
	type Inner = Vec<Message<'static>>;
}

fn render(
	status: StatusCode,
	error: &dyn std::error::Error,
	errors: Vec<Message<'_>>,
) -> Response<Body> {
	if status.is_server_error() {
		tracing::error!(%status, %error, "request failed");
	} else {
		tracing::warn!(%status, %error, "request rejected");
	}

	(status, Json(errors)).into_response()
}
