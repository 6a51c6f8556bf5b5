use std::sync::Arc;

use axum::extract::State;
use macros::route;

use crate::{
	extract::Json,
	openapi::tag,
	relay::{Action, Relay},
};

use super::{model, RouteError};

/// Generate text
/// Streams the model's output for the given text and action as plain text chunks.
/// Upstream failures after the stream has started are reported as a final `[Error: ...]` chunk.
#[route(tag = tag::AI, response(status = 200, description = "Generated text, streamed as it is produced."))]
pub async fn generate(
	State(relay): State<Arc<Relay>>,
	Json(input): Json<model::GenerateInput>,
) -> Result<model::FragmentResponse, RouteError> {
	let action = input.action.parse::<Action>()?;
	let fragments = relay.generate(&input.text, action)?;

	tracing::info!(action = action.as_str(), "relaying generation");

	Ok(model::FragmentResponse(fragments))
}
