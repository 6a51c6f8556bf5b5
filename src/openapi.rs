use std::borrow::Cow;

use aide::{openapi::Tag, transform::TransformOpenApi};

use crate::{error, extract::Json};

pub mod tag {
	pub const HEALTH: &str = "Health";
	pub const POST: &str = "Post";
	pub const AI: &str = "AI";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Blog Editor API")
		.summary("Post storage and AI writing assistance for the blog editor")
		.description(
			"Stores blog posts as editor document state and relays summarize and \
			 grammar-fix requests to a language model, streaming the result back.",
		)
		.tag(Tag {
			name: tag::HEALTH.into(),
			description: Some("Service liveness".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Post management".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::AI.into(),
			description: Some("Streaming text generation".into()),
			..Default::default()
		})
		.default_response_with::<Json<error::ErrorResponse>, _>(|res| {
			res.example(error::ErrorResponse {
				success: false,
				detail: "error message".into(),
				errors: vec![error::Message {
					content: "error message".into(),
					field: Some("optional field".into()),
					details: Some(Cow::Owned({
						let mut map = error::Map::new();
						map.insert("key".into(), serde_json::json!("value"));
						map
					})),
				}],
			})
		})
}
