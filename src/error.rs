use std::borrow::Cow;

use axum::{
	body::Body,
	extract::rejection::JsonRejection,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::store;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message sent to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A human-readable description of the error.
	pub content: Cow<'a, str>,
	/// The request field the error relates to, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Extra machine-readable context.
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

	pub fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
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

/// The body of every error response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse<'a> {
	pub success: bool,
	/// The first error message, for clients that only show one.
	pub detail: Cow<'a, str>,
	pub errors: Vec<Message<'a>>,
}

/// Describes how an error is presented to the client.
///
/// The [`std::fmt::Display`] implementation is only logged, so it can
/// contain information that should not be sent to the client.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn errors(&self) -> Vec<Message<'_>>;
}

/// Errors shared by every route.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0}")]
	Json(#[from] JsonRejection),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
}

impl ErrorShape for AppError {
	fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Json(..) => StatusCode::BAD_REQUEST,
			Self::Store(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn errors(&self) -> Vec<Message<'_>> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					errors.iter().map(move |error| {
						Message::new(error.message.clone().unwrap_or_else(|| error.code.clone()))
							.field(field)
					})
				})
				.collect(),
			Self::Json(error) => Message::new(error.body_text()).into_vec(),
			Self::Store(..) => Message::new("internal server error").into_vec(),
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		respond(&self)
	}
}

/// The error type returned from route handlers.
///
/// Either a shared [`AppError`] or an error specific to the route group.
#[derive(Debug)]
pub enum RouteError<T> {
	App(AppError),
	Route(T),
}

impl<T> From<AppError> for RouteError<T> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<T> From<store::Error> for RouteError<T> {
	fn from(error: store::Error) -> Self {
		Self::App(error.into())
	}
}

impl<T> IntoResponse for RouteError<T>
where
	T: ErrorShape,
{
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => respond(&error),
			Self::Route(error) => respond(&error),
		}
	}
}

impl<T> aide::OperationOutput for RouteError<T> {
	type Inner = ErrorResponse<'static>;
}

fn respond<E>(error: &E) -> Response<Body>
where
	E: ErrorShape,
{
	let status = error.status();

	if status.is_server_error() {
		tracing::error!(%error, status = status.as_u16(), "request failed");
	} else {
		tracing::debug!(%error, status = status.as_u16(), "request rejected");
	}

	let errors = error.errors();
	let detail = errors
		.first()
		.map_or_else(|| Cow::Borrowed("unknown error"), |message| message.content.clone());

	(
		status,
		Json(ErrorResponse {
			success: false,
			detail,
			errors,
		}),
	)
		.into_response()
}
