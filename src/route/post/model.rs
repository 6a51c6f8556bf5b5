pub use crate::model::{Post, PostSummary, UpdatePost};

use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

use crate::store::DEFAULT_TITLE;

#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
pub struct CreatePostInput {
	/// The title of the new post, "Untitled" if left out.
	#[serde(default)]
	pub title: Option<String>,
}

impl CreatePostInput {
	pub fn into_title(self) -> String {
		self.title.unwrap_or_else(|| DEFAULT_TITLE.into())
	}
}

// Every field is optional and free-form. Whether anything was sent at all is
// checked by the route, since that is not a per-field rule.
impl Validate for UpdatePost {
	fn validate(&self) -> Result<(), validator::ValidationErrors> {
		Ok(())
	}
}
