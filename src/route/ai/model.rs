use std::convert::Infallible;

use axum::{
	body::Body,
	http::{header, HeaderValue},
	response::{IntoResponse, Response},
};
use futures::StreamExt;
use schemars::JsonSchema;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::relay::FragmentStream;

fn validate_text(text: &str) -> Result<(), ValidationError> {
	if text.trim().is_empty() {
		let mut error = ValidationError::new("empty");
		error.message = Some("Text cannot be empty".into());

		return Err(error);
	}

	Ok(())
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct GenerateInput {
	/// The text to work on.
	#[validate(custom(function = "validate_text"))]
	pub text: String,
	/// Either `summarize` or `fix_grammar`.
	pub action: String,
}

/// A chunked response that writes each fragment as soon as it is produced.
pub struct FragmentResponse(pub FragmentStream);

impl IntoResponse for FragmentResponse {
	fn into_response(self) -> Response {
		let body = Body::from_stream(self.0.map(|fragment| Ok::<_, Infallible>(fragment.into_text())));

		(
			[
				(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream")),
				(header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
				(
					header::HeaderName::from_static("x-accel-buffering"),
					HeaderValue::from_static("no"),
				),
			],
			body,
		)
			.into_response()
	}
}

impl aide::OperationOutput for FragmentResponse {
	type Inner = String;
}
