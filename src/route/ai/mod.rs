use aide::axum::{routing::post_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, relay, AppState};

pub mod model;
pub mod route;

pub type RouteError = error::RouteError<relay::Error>;

impl From<relay::Error> for RouteError {
	fn from(error: relay::Error) -> Self {
		Self::Route(error)
	}
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route("/generate", post_with(generate, generate_docs))
}

impl error::ErrorShape for relay::Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::EmptyText | Self::UnknownAction(..) => StatusCode::BAD_REQUEST,
			Self::MissingCredential => StatusCode::SERVICE_UNAVAILABLE,
			Self::Authentication(..) | Self::Api { .. } | Self::Transport(..) | Self::Decode(..) => {
				StatusCode::BAD_GATEWAY
			}
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		let message = match self {
			Self::EmptyText => error::Message::new("Text cannot be empty").field("text"),
			Self::UnknownAction(action) => {
				error::Message::new("Action must be 'summarize' or 'fix_grammar'")
					.field("action")
					.detail("action", action.as_str())
			}
			Self::MissingCredential => error::Message::new(self.to_string()),
			_ => error::Message::new("upstream model request failed"),
		};

		message.into_vec()
	}
}

#[cfg(test)]
mod test {
	use wiremock::{
		matchers::{method, path},
		Mock, MockServer, ResponseTemplate,
	};

	use crate::test::*;

	async fn upstream(response: ResponseTemplate, expected: u64) -> MockServer {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.and(path("/chat/completions"))
			.respond_with(response)
			.expect(expected)
			.mount(&server)
			.await;

		server
	}

	#[tokio::test]
	async fn test_empty_text_is_rejected() {
		let server = upstream(ResponseTemplate::new(200), 0).await;
		let app = app_with_relay(Some("key"), &server.uri());

		for text in ["", "   \n\t"] {
			let response = app
				.post("/api/ai/generate")
				.json(&json!({ "text": text, "action": "summarize" }))
				.await;

			assert_eq!(response.status_code(), 400);
			assert_eq!(response.json::<Value>()["detail"], "Text cannot be empty");
		}
	}

	#[tokio::test]
	async fn test_unknown_action_is_rejected() {
		let server = upstream(ResponseTemplate::new(200), 0).await;
		let app = app_with_relay(Some("key"), &server.uri());

		let response = app
			.post("/api/ai/generate")
			.json(&json!({ "text": "hello", "action": "translate" }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["detail"],
			"Action must be 'summarize' or 'fix_grammar'"
		);
	}

	#[tokio::test]
	async fn test_missing_credential() {
		let server = upstream(ResponseTemplate::new(200), 0).await;
		let app = app_with_relay(None, &server.uri());

		let response = app
			.post("/api/ai/generate")
			.json(&json!({ "text": "hello", "action": "fix_grammar" }))
			.await;

		assert_eq!(response.status_code(), 503);
		assert_eq!(
			response.json::<Value>()["detail"],
			"DEEPSEEK_API_KEY is not set"
		);
	}

	#[tokio::test]
	async fn test_generate_streams_text() {
		let body = [
			"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
			"data: {\"choices\":[{\"delta\":{\"content\":\"A quick fox\"}}]}\n\n",
			"data: {\"choices\":[{\"delta\":{\"content\":\" jumps over a dog.\"}}]}\n\n",
			"data: [DONE]\n\n",
		]
		.concat();
		let server = upstream(
			ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"),
			1,
		)
		.await;
		let app = app_with_relay(Some("key"), &server.uri());

		let response = app
			.post("/api/ai/generate")
			.json(&json!({
				"text": "The quick brown fox jumps over the lazy dog.",
				"action": "summarize",
			}))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.header("content-type"), "text/event-stream");
		assert_eq!(response.header("cache-control"), "no-cache");
		assert_eq!(response.header("x-accel-buffering"), "no");
		assert_eq!(response.text(), "A quick fox jumps over a dog.");
	}

	#[tokio::test]
	async fn test_upstream_failure_is_in_band() {
		let server = upstream(
			ResponseTemplate::new(500).set_body_json(json!({
				"error": { "message": "model overloaded" }
			})),
			1,
		)
		.await;
		let app = app_with_relay(Some("key"), &server.uri());

		let response = app
			.post("/api/ai/generate")
			.json(&json!({ "text": "hello", "action": "summarize" }))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.text(), "[Error: API error: model overloaded]");
	}
}
