use std::sync::Arc;

use aide::{
	axum::{
		routing::{get, get_with},
		ApiRouter, IntoApiResponse,
	},
	openapi::OpenApi,
	scalar::Scalar,
};
use axum::{response::IntoResponse, Extension};

use crate::{extract::Json, AppState};

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.api_route(
			"/",
			get_with(
				Scalar::new("/docs/private/api.json")
					.with_title("Blog Editor API")
					.axum_handler(),
				|op| op.description("This documentation page."),
			),
		)
		.route("/private/api.json", get(serve_docs))
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
	Json(&*api).into_response()
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_openapi_document() {
		let app = app();

		let response = app.get("/docs/private/api.json").await;

		assert_eq!(response.status_code(), 200);

		let api = response.json::<Value>();

		assert_eq!(api["info"]["title"], "Blog Editor API");
		assert!(api["paths"]["/api/posts/{id}/publish"]["post"].is_object());
		assert!(api["paths"]["/api/ai/generate"]["post"].is_object());
	}
}
