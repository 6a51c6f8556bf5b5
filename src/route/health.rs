use aide::axum::{routing::get_with, ApiRouter};
use macros::route;
use schemars::JsonSchema;
use serde::Serialize;

use crate::{extract::Json, openapi::tag, AppState};

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new().api_route("/", get_with(health, health_docs))
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct Health {
	pub status: &'static str,
	pub message: &'static str,
}

/// Health check
/// Returns a static payload while the service is running.
#[route(tag = tag::HEALTH)]
pub async fn health() -> Json<Health> {
	Json(Health {
		status: "ok",
		message: "Blog Editor API",
	})
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_health() {
		let app = app();

		let response = app.get("/").await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(
			response.json::<Value>(),
			json!({ "status": "ok", "message": "Blog Editor API" })
		);
	}
}
