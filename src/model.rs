use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication state of a post.
///
/// A post starts as a draft and can only move forward to published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "post_status", rename_all = "lowercase")]
pub enum PostStatus {
	#[default]
	Draft,
	Published,
}

/// A single blog post.
///
/// Use this when fetching from the store and returning to the client.
#[model]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(rename = "_id", skip_deserializing)]
	pub id: Uuid,
	/// The title of the post.
	pub title: String,
	/// The editor's document state, stored verbatim.
	pub lexical_state: Option<serde_json::Value>,
	/// Plain text rendering of the document, kept in sync by the editor.
	pub plain_text: String,
	/// Whether the post is still a draft.
	#[serde(skip_deserializing)]
	pub status: PostStatus,
	/// The creation time of the post.
	#[serde(skip_deserializing)]
	pub created_at: chrono::DateTime<chrono::Utc>,
	/// The last time the post was changed.
	#[serde(skip_deserializing)]
	pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// The lightweight shape of a post used for listings.
///
/// The document state is left out since it can be large.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema, sqlx::FromRow)]
pub struct PostSummary {
	#[serde(rename = "_id")]
	pub id: Uuid,
	pub title: String,
	pub status: PostStatus,
	pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Post> for PostSummary {
	fn from(post: &Post) -> Self {
		Self {
			id: post.id,
			title: post.title.clone(),
			status: post.status,
			updated_at: post.updated_at,
		}
	}
}
